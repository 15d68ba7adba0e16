//! Selection of the address space a command reads from.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use clap::Args;
use tracing::info;
use xasset_core::{GameMode, GameTitle, ReadMemory, SnapshotReader, TitleRegistry, TitleSpec};

use crate::hex::parse_hex;

#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Process ID (defaults to the first supported game found)
    #[arg(long, conflicts_with = "snapshot")]
    pub pid: Option<u32>,

    /// Read a saved memory image of the main module instead of a live game
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Load address of the memory image (hex)
    #[arg(long, default_value = "0x400000", value_parser = parse_hex)]
    pub base: u64,

    /// Title of the memory image (waw, mw2, mw3, bo2, ghosts, bo3)
    #[arg(long)]
    pub title: Option<String>,

    /// Mode of the memory image (sp, mp, zm)
    #[arg(long, default_value = "sp")]
    pub mode: String,
}

/// An opened source and the title running in it
pub struct Target<'a> {
    pub reader: &'a (dyn ReadMemory + Sync),
    pub spec: &'static TitleSpec,
    pub mode: GameMode,
}

impl SourceArgs {
    /// Open the selected source and run `f` against it
    pub fn with_target<T>(&self, f: impl FnOnce(Target<'_>) -> Result<T>) -> Result<T> {
        match &self.snapshot {
            Some(path) => {
                let (spec, mode) = self.snapshot_title()?;
                let base = self.base;
                let reader = SnapshotReader::open(path, base)?;
                info!(
                    "Opened {} image {} (base: 0x{:X})",
                    spec.title,
                    path.display(),
                    base
                );
                f(Target {
                    reader: &reader,
                    spec,
                    mode,
                })
            }
            None => self.with_process(f),
        }
    }

    fn snapshot_title(&self) -> Result<(&'static TitleSpec, GameMode)> {
        let name = self
            .title
            .as_deref()
            .ok_or_else(|| anyhow!("--title is required with --snapshot"))?;
        let title = GameTitle::from_str(name).map_err(|_| anyhow!("Unknown title: {}", name))?;
        let mode = GameMode::from_str(&self.mode).map_err(|_| anyhow!("Unknown mode: {}", self.mode))?;

        let spec = TitleRegistry::builtin()
            .get(title)
            .ok_or_else(|| anyhow!("{} is not supported", title))?;
        if !spec.supports_mode(mode) {
            bail!("{} has no {} executable", title, mode);
        }
        Ok((spec, mode))
    }

    #[cfg(target_os = "windows")]
    fn with_process<T>(&self, f: impl FnOnce(Target<'_>) -> Result<T>) -> Result<T> {
        use xasset_core::{MemoryReader, ProcessHandle, detect_title};

        let process = match self.pid {
            Some(pid) => ProcessHandle::open(pid)?,
            None => ProcessHandle::find_and_open(&TitleRegistry::builtin().executables())?,
        };
        let (spec, mode) = detect_title(&process.name)
            .ok_or_else(|| anyhow!("{} is not a supported game", process.name))?;

        info!(
            "Found {} {} (PID: {}, Base: 0x{:X})",
            spec.title, mode, process.pid, process.base_address
        );
        let reader = MemoryReader::new(&process);
        f(Target {
            reader: &reader,
            spec,
            mode,
        })
    }

    #[cfg(not(target_os = "windows"))]
    fn with_process<T>(&self, _f: impl FnOnce(Target<'_>) -> Result<T>) -> Result<T> {
        bail!("Attaching to a running game requires Windows; use --snapshot with a memory image")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn snapshot_args(path: PathBuf, title: Option<&str>, mode: &str) -> SourceArgs {
        SourceArgs {
            pid: None,
            snapshot: Some(path),
            base: 0x40_0000,
            title: title.map(str::to_string),
            mode: mode.to_string(),
        }
    }

    #[test]
    fn test_snapshot_target_reads_at_base() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0x4D, 0x5A, 0x90, 0x00]).unwrap();

        let args = snapshot_args(file.path().to_path_buf(), Some("mw3"), "mp");
        let (title, mode, magic) = args
            .with_target(|target| {
                Ok((
                    target.spec.title,
                    target.mode,
                    target.reader.read_u16(0x400000)?,
                ))
            })
            .unwrap();

        assert_eq!(title, GameTitle::ModernWarfare3);
        assert_eq!(mode, GameMode::MultiPlayer);
        assert_eq!(magic, 0x5A4D);
    }

    #[test]
    fn test_snapshot_requires_title() {
        let file = NamedTempFile::new().unwrap();
        let args = snapshot_args(file.path().to_path_buf(), None, "sp");
        assert!(args.with_target(|_| Ok(())).is_err());
    }

    #[test]
    fn test_snapshot_rejects_unknown_title() {
        let file = NamedTempFile::new().unwrap();
        let args = snapshot_args(file.path().to_path_buf(), Some("aw"), "sp");
        let err = args.with_target(|_| Ok(())).unwrap_err();
        assert!(err.to_string().contains("aw"));
    }

    #[test]
    fn test_snapshot_mode_must_ship() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 16]).unwrap();
        let args = snapshot_args(file.path().to_path_buf(), Some("bo2"), "zm");
        let mode = args.with_target(|target| Ok(target.mode)).unwrap();
        assert_eq!(mode, GameMode::Zombies);

        let args = snapshot_args(file.path().to_path_buf(), Some("ghosts"), "zm");
        let err = args.with_target(|_| Ok(())).unwrap_err();
        assert!(err.to_string().contains("no ZM executable"));
    }
}
