use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use xasset_core::offset::CACHE_FILE;
use xasset_core::{AssetKind, ExtractConfig, PackageFlavor};

mod commands;
mod hex;
mod shutdown;
mod sink;
mod source;

use commands::export::ExportOptions;
use hex::parse_hex;
use source::SourceArgs;

#[derive(Parser)]
#[command(name = "xasset", version)]
#[command(about = "Asset extractor for IW engine games")]
struct Cli {
    /// Extraction settings file (TOML)
    #[arg(short, long, global = true, default_value = "xasset.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Locate and verify the asset tables of a running game
    Resolve {
        #[command(flatten)]
        source: SourceArgs,
        /// Ignore and do not update the offset cache
        #[arg(long)]
        no_cache: bool,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List assets in the enabled pools
    List {
        #[command(flatten)]
        source: SourceArgs,
        /// Asset kinds to list (anim, model, image, sound, rawfile); defaults to the config
        #[arg(short, long, value_delimiter = ',')]
        kind: Vec<AssetKind>,
        /// Only assets whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export assets to a directory
    Export {
        #[command(flatten)]
        source: SourceArgs,
        /// Output directory
        #[arg(short, long, default_value = "exported_files")]
        output: PathBuf,
        /// Asset kinds to export; defaults to the config
        #[arg(short, long, value_delimiter = ',')]
        kind: Vec<AssetKind>,
        /// Only assets whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
        /// Package archive file or directory of the game
        #[arg(long)]
        packages: Option<PathBuf>,
        /// Sound bank to add to the asset list (repeatable)
        #[arg(long = "sound-bank")]
        sound_banks: Vec<PathBuf>,
        /// Export threads (0 for one per CPU)
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Inspect package archives
    Package {
        #[command(subcommand)]
        action: PackageAction,
    },
    /// Inspect sound banks
    Sounds {
        #[command(subcommand)]
        action: SoundsAction,
    },
    /// Report raw matches of the code signatures
    Scan {
        #[command(flatten)]
        source: SourceArgs,
        /// Signature file (JSON) instead of the built-in set
        #[arg(long)]
        signatures: Option<PathBuf>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Dump raw bytes at an address
    Hexdump {
        #[command(flatten)]
        source: SourceArgs,
        /// Address (hex)
        #[arg(short, long, value_parser = parse_hex)]
        address: u64,
        /// Number of bytes
        #[arg(short, long, default_value = "256")]
        size: usize,
    },
    /// Convert an .iwi texture to DDS
    Convert {
        input: PathBuf,
        /// Output file (defaults to the input with a .dds extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PackageAction {
    /// List index entries
    List {
        /// Archive flavor (iwd, xpak, ipak, xptoc)
        flavor: PackageFlavor,
        /// Archive file or directory
        path: PathBuf,
        /// Maximum entries to print
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Extract one entry
    Extract {
        flavor: PackageFlavor,
        path: PathBuf,
        /// Entry key (hex)
        #[arg(short, long, value_parser = parse_hex)]
        key: Option<u64>,
        /// Entry file name (IWD only)
        #[arg(short, long, conflicts_with = "key")]
        name: Option<String>,
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum SoundsAction {
    /// List the entries of a sound bank
    List {
        bank: PathBuf,
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Extract sound bank entries as WAV/FLAC
    Extract {
        bank: PathBuf,
        #[arg(short, long, default_value = "exported_files")]
        output: PathBuf,
        #[arg(short, long)]
        filter: Option<String>,
    },
}

/// Load settings, falling back to defaults when the file is missing or invalid
fn load_config(path: &Path) -> ExtractConfig {
    let mut config = if path.exists() {
        match ExtractConfig::load(path) {
            Ok(c) => {
                info!("Loaded config from {}", path.display());
                c
            }
            Err(e) => {
                warn!("Failed to load config: {}, using defaults", e);
                ExtractConfig::default()
            }
        }
    } else {
        debug!("No config at {}, using defaults", path.display());
        ExtractConfig::default()
    };

    if config.offset_cache_path.is_none() {
        config.offset_cache_path = dirs::cache_dir().map(|dir| dir.join("xasset").join(CACHE_FILE));
    }
    if let Some(parent) = config.offset_cache_path.as_deref().and_then(Path::parent) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("Offset cache directory {} is unusable: {}", parent.display(), e);
        }
    }
    config
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "xasset=debug" } else { "xasset=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli.config);

    match cli.command {
        Command::Resolve {
            source,
            no_cache,
            json,
        } => {
            let mut config = config;
            if no_cache {
                config.offset_cache_path = None;
            }
            commands::resolve::run(&source, &config, json)
        }
        Command::List {
            source,
            kind,
            filter,
            json,
        } => commands::list::run(&source, &config, &kind, filter.as_deref(), json),
        Command::Export {
            source,
            output,
            kind,
            filter,
            packages,
            sound_banks,
            workers,
        } => commands::export::run(
            &source,
            &config,
            &ExportOptions {
                output,
                kinds: kind,
                filter,
                packages,
                sound_banks,
                workers,
            },
        ),
        Command::Package { action } => match action {
            PackageAction::List {
                flavor,
                path,
                limit,
            } => commands::package::list(flavor, &path, limit),
            PackageAction::Extract {
                flavor,
                path,
                key,
                name,
                output,
            } => commands::package::extract(
                flavor,
                &path,
                key,
                name.as_deref(),
                &output,
            ),
        },
        Command::Sounds { action } => match action {
            SoundsAction::List { bank, filter } => {
                commands::sounds::list(&bank, config.skip_blank_audio, filter.as_deref())
            }
            SoundsAction::Extract {
                bank,
                output,
                filter,
            } => commands::sounds::extract(
                &bank,
                &output,
                config.skip_blank_audio,
                filter.as_deref(),
            ),
        },
        Command::Scan {
            source,
            signatures,
            json,
        } => commands::scan::run(&source, signatures.as_deref(), json),
        Command::Hexdump {
            source,
            address,
            size,
        } => commands::hexdump::run(&source, address, size),
        Command::Convert { input, output } => commands::convert::run(&input, output.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_parses_export() {
        let cli = Cli::try_parse_from([
            "xasset",
            "export",
            "--snapshot",
            "bo3.bin",
            "--title",
            "bo3",
            "--kind",
            "rawfile,image",
            "--sound-bank",
            "zm_factory.sabs",
        ])
        .unwrap();
        match cli.command {
            Command::Export {
                kind, sound_banks, ..
            } => {
                assert_eq!(kind, vec![AssetKind::RawFile, AssetKind::Image]);
                assert_eq!(sound_banks, vec![PathBuf::from("zm_factory.sabs")]);
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn test_cli_rejects_pid_with_snapshot() {
        let parsed = Cli::try_parse_from(["xasset", "list", "--pid", "42", "--snapshot", "a.bin"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_cli_parses_hex_arguments() {
        let cli = Cli::try_parse_from([
            "xasset", "hexdump", "--snapshot", "bo3.bin", "--base", "140000000", "-a", "0x1493FA290",
        ])
        .unwrap();
        match cli.command {
            Command::Hexdump { source, address, .. } => {
                assert_eq!(source.base, 0x1_4000_0000);
                assert_eq!(address, 0x1_493F_A290);
            }
            _ => panic!("expected hexdump"),
        }

        let cli = Cli::try_parse_from([
            "xasset", "package", "extract", "xpak", "base.xpak", "-k", "DEADBEEF", "-o", "out.bin",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Package {
                action: PackageAction::Extract {
                    key: Some(0xDEAD_BEEF),
                    ..
                }
            }
        ));

        assert!(Cli::try_parse_from(["xasset", "hexdump", "-a", "nowhere"]).is_err());
    }

    #[test]
    fn test_load_config_reads_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "load_rawfiles = true\nworker_count = 2").unwrap();

        let config = load_config(file.path());
        assert!(config.load_rawfiles);
        assert_eq!(config.worker_count, 2);
    }

    #[test]
    fn test_load_config_falls_back_to_defaults() {
        let config = load_config(Path::new("/nonexistent/xasset.toml"));
        assert_eq!(config.load_models, ExtractConfig::default().load_models);
    }
}
