use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::memory::Cursor;

use super::archive::fits;
use super::blocks::{IPAK_BLOCKS, read_block_stream};
use super::{ArchiveSet, DuplicatePolicy, PackageCache, PackageEntry, PackageFlavor, PackageIndex, archive_paths};

const IPAK_MAGIC: u32 = 0x4950_414B;
const HEADER_SIZE: usize = 16;
const SEGMENT_SIZE: usize = 16;
const ENTRY_SIZE: usize = 16;
const SEGMENT_ENTRIES: u32 = 1;
const SEGMENT_DATA: u32 = 2;

#[derive(Debug, Clone, Copy, Default)]
struct Segment {
    kind: u32,
    offset: u64,
    entry_count: u32,
}

/// `.ipak` archives: segmented, an entries segment of `{key, offset, size}`
/// pointing into a data segment of block streams
pub struct IpakCache {
    index: PackageIndex,
    archives: ArchiveSet,
}

impl IpakCache {
    pub fn new() -> Self {
        Self {
            index: PackageIndex::new(DuplicatePolicy::FirstWins),
            archives: ArchiveSet::new(),
        }
    }

    fn load_archive(&mut self, path: &Path) -> Result<usize> {
        let archive = self.archives.push(path);
        let len = self.archives.archive_len(archive)?;
        let header_bytes = self.archives.read_at(archive, 0, HEADER_SIZE)?;
        let header = Cursor::new(&header_bytes, 0);
        if header.u32_at(0)? != IPAK_MAGIC {
            return Err(Error::UnsupportedFormat(format!("{} is not an ipak", path.display())));
        }

        let segment_count = header.u32_at(0xC)?;
        if segment_count > 64 {
            return Err(Error::UnsupportedFormat(format!(
                "{}: {} segments",
                path.display(),
                segment_count
            )));
        }
        let segment_bytes =
            self.archives
                .read_at(archive, HEADER_SIZE as u64, segment_count as usize * SEGMENT_SIZE)?;
        let mut cursor = Cursor::new(&segment_bytes, HEADER_SIZE as u64);

        let mut entries = Segment::default();
        let mut data = Segment::default();
        for _ in 0..segment_count {
            let segment = Segment {
                kind: cursor.read_u32()?,
                offset: cursor.read_u32()? as u64,
                entry_count: {
                    cursor.skip(4)?;
                    cursor.read_u32()?
                },
            };
            match segment.kind {
                SEGMENT_ENTRIES => entries = segment,
                SEGMENT_DATA => data = segment,
                _ => {}
            }
        }
        if entries.kind != SEGMENT_ENTRIES {
            return Ok(0);
        }

        let table = self.archives.read_at(
            archive,
            entries.offset,
            entries.entry_count as usize * ENTRY_SIZE,
        )?;
        let mut cursor = Cursor::new(&table, entries.offset);
        let mut added = 0;
        let mut rejected = 0;
        for _ in 0..entries.entry_count {
            let key = cursor.read_u64()?;
            let offset = cursor.read_u32()? as u64;
            let size = cursor.read_u32()? as u64;
            let Some(start) = data.offset.checked_add(offset).filter(|s| fits(*s, size, len)) else {
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

impl Default for IpakCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageCache for IpakCache {
    fn flavor(&self) -> PackageFlavor {
        PackageFlavor::Ipak
    }

    fn load_index(&mut self, path: &Path) -> Result<()> {
        let paths = archive_paths(path, "ipak")?;
        let single = paths.len() == 1;
        for archive in &paths {
            match self.load_archive(archive) {
                Ok(added) => debug!("  {}: {} entries", archive.display(), added),
                Err(e) if !single && !e.is_fatal() => {
                    warn!("Skipping {}: {}", archive.display(), e)
                }
                Err(e) => return Err(e),
            }
        }
        info!("Indexed {} ipak entries from {} archives", self.index.len(), paths.len());
        Ok(())
    }

    fn extract(&self, key: u64) -> Result<Vec<u8>> {
        let entry = self.index.get(key).ok_or(Error::NotFound { key })?;
        let data = self
            .archives
            .read_at(entry.archive, entry.offset, entry.compressed_size as usize)?;
        read_block_stream(&data, entry.offset, &IPAK_BLOCKS)
    }

    fn index(&self) -> &PackageIndex {
        &self.index
    }
}
