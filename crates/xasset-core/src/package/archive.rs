use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::read_exact_at;

/// Numbered archive files with lazily opened, shared read-only handles.
///
/// Reads are positional, so one handle serves any number of threads.
#[derive(Debug, Default)]
pub struct ArchiveSet {
    paths: Vec<PathBuf>,
    handles: Mutex<Vec<Option<Arc<File>>>>,
}

impl ArchiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an archive and return its index
    pub fn push(&mut self, path: impl Into<PathBuf>) -> u32 {
        self.paths.push(path.into());
        self.handles_mut().push(None);
        (self.paths.len() - 1) as u32
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn path(&self, archive: u32) -> Option<&Path> {
        self.paths.get(archive as usize).map(PathBuf::as_path)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn handles_mut(&mut self) -> &mut Vec<Option<Arc<File>>> {
        match self.handles.get_mut() {
            Ok(handles) => handles,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn handle(&self, archive: u32) -> Result<Arc<File>> {
        let path = self.path(archive).ok_or_else(|| {
            Error::UnsupportedFormat(format!("archive index {} is not registered", archive))
        })?;

        {
            let handles = self.handles.lock().unwrap_or_else(|p| p.into_inner());
            if let Some(Some(file)) = handles.get(archive as usize) {
                return Ok(Arc::clone(file));
            }
        }

        // Opened outside the lock; a racing open just drops its handle
        debug!("Opening archive {}", path.display());
        let file = Arc::new(File::open(path)?);
        let mut handles = self.handles.lock().unwrap_or_else(|p| p.into_inner());
        let slot = &mut handles[archive as usize];
        Ok(Arc::clone(slot.get_or_insert(file)))
    }

    /// Read `len` bytes at `offset` of archive `archive`
    pub fn read_at(&self, archive: u32, offset: u64, len: usize) -> Result<Vec<u8>> {
        let file = self.handle(archive)?;
        // Lengths come from index entries; check them before allocating
        let file_len = file.metadata()?.len();
        if !fits(offset, len as u64, file_len) {
            return Err(Error::decode(
                self.paths[archive as usize].display().to_string(),
                format!("{} bytes at {:#x} exceed the {} byte file", len, offset, file_len),
            ));
        }
        let mut buffer = vec![0u8; len];
        read_exact_at(&file, &mut buffer, offset).map_err(|e| match e.kind() {
            // A bad index entry, not a failing disk
            std::io::ErrorKind::UnexpectedEof => Error::decode(
                self.paths[archive as usize].display().to_string(),
                format!("{} bytes at {:#x} run past the end", len, offset),
            ),
            _ => Error::Io(e),
        })?;
        Ok(buffer)
    }

    /// Size of an archive file in bytes
    pub fn archive_len(&self, archive: u32) -> Result<u64> {
        Ok(self.handle(archive)?.metadata()?.len())
    }
}

/// Whether `len` bytes at `offset` lie inside a file of `file_len` bytes
pub(crate) fn fits(offset: u64, len: u64, file_len: u64) -> bool {
    offset.checked_add(len).is_some_and(|end| end <= file_len)
}
