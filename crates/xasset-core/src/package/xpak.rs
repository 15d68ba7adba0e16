use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::memory::Cursor;

use super::archive::fits;
use super::blocks::{XPAK_BLOCKS, read_block_stream};
use super::{ArchiveSet, DuplicatePolicy, PackageCache, PackageEntry, PackageFlavor, PackageIndex, archive_paths};

const XPAK_MAGIC: u32 = 0x4950_414B;
const HEADER_SIZE: usize = 120;
const HASH_ENTRY_SIZE: usize = 24;
/// The top byte of a hash entry size carries flags in later archives
const SIZE_MASK: u64 = 0x00FF_FFFF_FFFF_FFFF;

/// `.xpak` archives: a header, a hash table of `{key, offset, size}` and a
/// data section of block streams
pub struct XpakCache {
    index: PackageIndex,
    archives: ArchiveSet,
}

impl XpakCache {
    pub fn new() -> Self {
        Self {
            index: PackageIndex::new(DuplicatePolicy::FirstWins),
            archives: ArchiveSet::new(),
        }
    }

    pub fn archives(&self) -> &ArchiveSet {
        &self.archives
    }

    fn load_archive(&mut self, path: &Path) -> Result<usize> {
        let archive = self.archives.push(path);
        let len = self.archives.archive_len(archive)?;
        let header_bytes = self.archives.read_at(archive, 0, HEADER_SIZE)?;
        let header = Cursor::new(&header_bytes, 0);

        if header.u32_at(0)? != XPAK_MAGIC {
            return Err(Error::UnsupportedFormat(format!("{} is not an xpak", path.display())));
        }
        let data_offset = header.u64_at(0x20)?;
        let hash_count = header.u64_at(0x30)?;
        let hash_offset = header.u64_at(0x38)?;

        let table_len = hash_count
            .checked_mul(HASH_ENTRY_SIZE as u64)
            .filter(|n| hash_offset.saturating_add(*n) <= len)
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!(
                    "{}: hash table of {} entries at {:#x} exceeds the file",
                    path.display(),
                    hash_count,
                    hash_offset
                ))
            })?;

        let table = self.archives.read_at(archive, hash_offset, table_len as usize)?;
        let mut cursor = Cursor::new(&table, hash_offset);
        let mut added = 0;
        let mut rejected = 0;
        for _ in 0..hash_count {
            let key = cursor.read_u64()?;
            let offset = cursor.read_u64()?;
            let size = cursor.read_u64()? & SIZE_MASK;
            let Some(start) = data_offset.checked_add(offset).filter(|s| fits(*s, size, len)) else {
                rejected += 1;
                continue;
            };
            if self.index.insert(key, PackageEntry::new(archive, start, size, 0)) {
                added += 1;
            }
        }
        if rejected > 0 {
            warn!("{}: {} entries lie outside the file", path.display(), rejected);
        }
        Ok(added)
    }
}

impl Default for XpakCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageCache for XpakCache {
    fn flavor(&self) -> PackageFlavor {
        PackageFlavor::Xpak
    }

    fn load_index(&mut self, path: &Path) -> Result<()> {
        let paths = archive_paths(path, "xpak")?;
        let single = paths.len() == 1;
        for archive in &paths {
            match self.load_archive(archive) {
                Ok(added) => debug!("  {}: {} entries", archive.display(), added),
                // Small blank archives in a set carry no table; skip them
                Err(e) if !single && !e.is_fatal() => {
                    warn!("Skipping {}: {}", archive.display(), e)
                }
                Err(e) => return Err(e),
            }
        }
        info!("Indexed {} xpak entries from {} archives", self.index.len(), paths.len());
        Ok(())
    }

    fn extract(&self, key: u64) -> Result<Vec<u8>> {
        let entry = self.index.get(key).ok_or(Error::NotFound { key })?;
        let data = self
            .archives
            .read_at(entry.archive, entry.offset, entry.compressed_size as usize)?;
        read_block_stream(&data, entry.offset, &XPAK_BLOCKS)
    }

    fn index(&self) -> &PackageIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::blocks::build_stream;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DATA_OFFSET: u64 = 0x80;

    /// Archive with one LZ4 stream per `(key, payload)`, hash table at the end
    fn build_xpak(entries: &[(u64, &[u8])]) -> NamedTempFile {
        let mut data = Vec::new();
        let mut table = Vec::new();
        for (key, payload) in entries {
            let offset = data.len() as u64;
            let stream = build_stream(
                &XPAK_BLOCKS,
                DATA_OFFSET + offset,
                &[(3, lz4_flex::block::compress(payload))],
            );
            table.extend_from_slice(&key.to_le_bytes());
            table.extend_from_slice(&offset.to_le_bytes());
            table.extend_from_slice(&((stream.len() as u64) | 0x80 << 56).to_le_bytes());
            data.extend(stream);
        }

        let mut header = vec![0u8; DATA_OFFSET as usize];
        header[0..4].copy_from_slice(&XPAK_MAGIC.to_le_bytes());
        header[6..8].copy_from_slice(&0xBu16.to_le_bytes());
        header[0x20..0x28].copy_from_slice(&DATA_OFFSET.to_le_bytes());
        header[0x28..0x30].copy_from_slice(&(data.len() as u64).to_le_bytes());
        header[0x30..0x38].copy_from_slice(&(entries.len() as u64).to_le_bytes());
        header[0x38..0x40].copy_from_slice(&(DATA_OFFSET + data.len() as u64).to_le_bytes());

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&header).unwrap();
        file.write_all(&data).unwrap();
        file.write_all(&table).unwrap();
        file
    }

    #[test]
    fn test_duplicate_key_first_wins() {
        let file = build_xpak(&[
            (0xABCD, b"first payload bytes"),
            (0x1111, b"other"),
            (0xABCD, b"second payload bytes"),
        ]);
        let mut cache = XpakCache::new();
        cache.load_index(file.path()).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.extract(0xABCD).unwrap(), b"first payload bytes");
        assert_eq!(cache.extract(0x1111).unwrap(), b"other");
    }

    #[test]
    fn test_extract_is_repeatable() {
        let payload: Vec<u8> = (0..20_000u32).map(|i| (i * 31 % 251) as u8).collect();
        let file = build_xpak(&[(0x42, &payload)]);
        let mut cache = XpakCache::new();
        cache.load_index(file.path()).unwrap();

        let first = cache.extract(0x42).unwrap();
        let second = cache.extract(0x42).unwrap();
        assert_eq!(first, payload);
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let file = build_xpak(&[(1, b"x")]);
        let mut cache = XpakCache::new();
        cache.load_index(file.path()).unwrap();
        let err = cache.extract(2).unwrap_err();
        assert!(err.is_not_found());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_out_of_file_entry_is_dropped() {
        let file = build_xpak(&[(0x42, b"corrupt"), (0x43, b"intact")]);
        let mut bytes = std::fs::read(file.path()).unwrap();
        // size field of the first hash entry
        let at = bytes.len() - 2 * HASH_ENTRY_SIZE + 16;
        bytes[at..at + 8].copy_from_slice(&0x00F0_0000_0000_0000u64.to_le_bytes());
        std::fs::write(file.path(), &bytes).unwrap();

        let mut cache = XpakCache::new();
        cache.load_index(file.path()).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.extract(0x42).unwrap_err().is_not_found());
        assert_eq!(cache.extract(0x43).unwrap(), b"intact");
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 200]).unwrap();
        let mut cache = XpakCache::new();
        assert!(matches!(
            cache.load_index(file.path()).unwrap_err(),
            Error::UnsupportedFormat(_)
        ));
    }
}
