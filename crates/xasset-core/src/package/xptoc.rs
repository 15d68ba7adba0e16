use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::info;
use xxhash_rust::xxh64::xxh64;

use crate::error::{Error, Result};
use crate::memory::Cursor;

use super::compress::decompress_lz4;
use super::{ArchiveSet, DuplicatePolicy, PackageCache, PackageEntry, PackageFlavor, PackageIndex};

const TOC_MAGIC: u64 = 0x3030_3369_6666_3253;
const TOC_FILE: &str = "xpakfile.toc";
const HEADER_SIZE: usize = 16;
const ENTRY_SIZE: usize = 30;
/// Upper bound of one decompressed payload
const MAX_PAYLOAD: u64 = 0x4000_0000;

/// Package key of a table-of-contents content hash: xxh64 of its lowercase hex
pub fn xptoc_key(hash: &[u8; 16]) -> u64 {
    let mut hex = String::with_capacity(32);
    for byte in hash {
        let _ = write!(hex, "{:02x}", byte);
    }
    xxh64(hex.as_bytes(), 0)
}

/// `xpakfile.toc` index over numbered `xpakfile{N}.pak` archives holding
/// chunked LZ4 payloads
pub struct XptocCache {
    index: PackageIndex,
    archives: ArchiveSet,
}

impl XptocCache {
    pub fn new() -> Self {
        Self {
            index: PackageIndex::new(DuplicatePolicy::FirstWins),
            archives: ArchiveSet::new(),
        }
    }

    fn register_archives(&mut self, directory: &Path, highest: u32) {
        while self.archives.len() as u32 <= highest {
            let number = self.archives.len();
            self.archives
                .push(directory.join(format!("xpakfile{}.pak", number)));
        }
    }
}

impl Default for XptocCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageCache for XptocCache {
    fn flavor(&self) -> PackageFlavor {
        PackageFlavor::Xptoc
    }

    fn load_index(&mut self, path: &Path) -> Result<()> {
        let toc_path: PathBuf = if path.is_dir() {
            path.join(TOC_FILE)
        } else {
            path.to_path_buf()
        };
        let directory = toc_path.parent().unwrap_or(Path::new(".")).to_path_buf();

        let bytes = std::fs::read(&toc_path)?;
        let mut cursor = Cursor::new(&bytes, 0);
        if cursor.read_u64()? != TOC_MAGIC {
            return Err(Error::UnsupportedFormat(format!(
                "{} is not a package table of contents",
                toc_path.display()
            )));
        }
        let _version = cursor.read_u32()?;
        let count = cursor.read_u32()?;
        if HEADER_SIZE + count as usize * ENTRY_SIZE > bytes.len() {
            return Err(Error::UnsupportedFormat(format!(
                "{}: {} entries exceed the file",
                toc_path.display(),
                count
            )));
        }

        let mut highest = 0u32;
        for _ in 0..count {
            let mut hash = [0u8; 16];
            hash.copy_from_slice(cursor.read_bytes(16)?);
            let offset = cursor.read_u64()?;
            let size = cursor.read_u32()? as u64;
            let archive = cursor.read_u16()? as u32;

            highest = highest.max(archive);
            self.index
                .insert(xptoc_key(&hash), PackageEntry::new(archive, offset, size, size));
        }
        if count > 0 {
            self.register_archives(&directory, highest);
        }

        info!("Indexed {} toc entries over {} archives", self.index.len(), self.archives.len());
        Ok(())
    }

    fn extract(&self, key: u64) -> Result<Vec<u8>> {
        let entry = self.index.get(key).ok_or(Error::NotFound { key })?;
        let header = self.archives.read_at(entry.archive, entry.offset, 12)?;
        let total = Cursor::new(&header, entry.offset).u64_at(entry.offset)?;
        if total > MAX_PAYLOAD {
            return Err(Error::Decompression(format!(
                "payload of {} bytes at {:#x}",
                total, entry.offset
            )));
        }

        let mut out = Vec::with_capacity(total as usize);
        let mut position = entry.offset + 12;
        while (out.len() as u64) < total {
            let chunk = self.archives.read_at(entry.archive, position, 8)?;
            let chunk = Cursor::new(&chunk, position);
            let compressed = chunk.u32_at(position)? as usize;
            let uncompressed = chunk.u32_at(position + 4)? as usize;
            if uncompressed == 0 || out.len() as u64 + uncompressed as u64 > total {
                return Err(Error::Decompression(format!(
                    "chunk at {:#x} of {} bytes overruns payload of {}",
                    position, uncompressed, total
                )));
            }

            let data = self.archives.read_at(entry.archive, position + 8, compressed)?;
            out.extend(decompress_lz4(&data, uncompressed)?);
            position = (position + 8 + compressed as u64).next_multiple_of(4);
        }
        Ok(out)
    }

    fn index(&self) -> &PackageIndex {
        &self.index
    }
}
