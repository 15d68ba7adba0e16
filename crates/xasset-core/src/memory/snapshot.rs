//! File-backed memory image.
//!
//! A snapshot is a raw dump of a module mapped at a known base address.
//! Reads are positional so one reader can be shared across threads.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::memory::ReadMemory;

#[derive(Debug)]
pub struct SnapshotReader {
    file: File,
    path: PathBuf,
    base_address: u64,
    len: u64,
}

impl SnapshotReader {
    pub fn open<P: AsRef<Path>>(path: P, base_address: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            path,
            base_address,
            len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReadMemory for SnapshotReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let in_range = address >= self.base_address
            && (address - self.base_address)
                .checked_add(size as u64)
                .is_some_and(|end| end <= self.len);
        if !in_range {
            return Err(Error::MemoryReadFailed {
                address,
                message: format!("outside snapshot {}", self.path.display()),
            });
        }

        let mut buffer = vec![0u8; size];
        read_exact_at(&self.file, &mut buffer, address - self.base_address).map_err(|e| {
            Error::NotAccessible(format!("{}: {}", self.path.display(), e))
        })?;
        Ok(buffer)
    }

    fn base_address(&self) -> u64 {
        self.base_address
    }

    fn module_size(&self) -> u64 {
        self.len
    }
}

/// Positional read that does not touch the shared file cursor
#[cfg(unix)]
pub(crate) fn read_exact_at(file: &File, buffer: &mut [u8], offset: u64) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buffer, offset)
}

#[cfg(windows)]
pub(crate) fn read_exact_at(file: &File, buffer: &mut [u8], offset: u64) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;
    let mut done = 0;
    while done < buffer.len() {
        let read = file.seek_read(&mut buffer[done..], offset + done as u64)?;
        if read == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        done += read;
    }
    Ok(())
}
