//! Wildcard byte-pattern scanning over a reader's address space

use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::ReadMemory;

/// Bytes read per scan step
const SCAN_CHUNK_SIZE: usize = 1024 * 1024;

/// Scan length used when the reader does not know its module size
const DEFAULT_SCAN_LIMIT: u64 = 64 * 1024 * 1024;

/// Address range to scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRegion {
    pub start: u64,
    pub len: u64,
}

impl ScanRegion {
    pub fn new(start: u64, len: u64) -> Self {
        Self { start, len }
    }

    /// The reader's main module
    pub fn main_module<R: ReadMemory + ?Sized>(reader: &R) -> Self {
        let len = match reader.module_size() {
            0 => DEFAULT_SCAN_LIMIT,
            size => size,
        };
        Self {
            start: reader.base_address(),
            len,
        }
    }
}

pub struct SignatureScanner<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
}

impl<'a, R: ReadMemory + ?Sized> SignatureScanner<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self { reader }
    }

    /// All match addresses of `pattern` in `region`, sorted and deduplicated.
    ///
    /// Reads in chunks and keeps the last `pattern.len() - 1` bytes of each
    /// chunk so matches straddling a chunk border are still found. An
    /// unreadable first chunk is an error; a later unreadable chunk ends the
    /// scan with the matches found so far.
    pub fn scan(&self, pattern: &[Option<u8>], region: ScanRegion) -> Result<Vec<u64>> {
        let mut results: Vec<u64> = Vec::new();
        let mut offset: u64 = 0;
        let mut tail: Vec<u8> = Vec::new();

        while offset < region.len {
            let read_size = (region.len - offset).min(SCAN_CHUNK_SIZE as u64) as usize;
            let addr = region.start + offset;

            let chunk = match self.reader.read_bytes(addr, read_size) {
                Ok(bytes) => bytes,
                Err(e) => {
                    if offset == 0 {
                        return Err(Error::OffsetSearchFailed(format!(
                            "Failed to read scan region at {:#x}: {}",
                            addr, e
                        )));
                    }
                    debug!(
                        "Scan stopped at offset {:#x} (scanned {:#x} bytes): {}",
                        offset, offset, e
                    );
                    break;
                }
            };

            let mut data = Vec::with_capacity(tail.len() + chunk.len());
            data.extend_from_slice(&tail);
            data.extend_from_slice(&chunk);

            let data_base = addr - tail.len() as u64;
            results.extend(find_matches(&data, data_base, pattern));

            if pattern.len() > 1 {
                let keep = pattern.len() - 1;
                if data.len() >= keep {
                    tail = data[data.len() - keep..].to_vec();
                } else {
                    tail = data;
                }
            } else {
                tail.clear();
            }

            offset += read_size as u64;
        }

        results.sort_unstable();
        results.dedup();
        Ok(results)
    }

    /// Lowest match address, if any
    pub fn scan_first(&self, pattern: &[Option<u8>], region: ScanRegion) -> Result<Option<u64>> {
        Ok(self.scan(pattern, region)?.into_iter().next())
    }
}

/// Find every position where `pattern` matches `buffer`.
///
/// The first fixed byte of the pattern is located with `memchr`, then the
/// remaining bytes are compared with wildcards skipped.
pub fn find_matches(buffer: &[u8], base_addr: u64, pattern: &[Option<u8>]) -> Vec<u64> {
    if pattern.is_empty() || buffer.len() < pattern.len() {
        return Vec::new();
    }

    let Some((anchor_index, anchor)) = pattern
        .iter()
        .enumerate()
        .find_map(|(i, b)| b.map(|v| (i, v)))
    else {
        return Vec::new();
    };

    let last = buffer.len() - pattern.len();
    let window = &buffer[anchor_index..=last + anchor_index];
    let mut results = Vec::new();

    'outer: for hit in memchr::memchr_iter(anchor, window) {
        for (j, byte) in pattern.iter().enumerate() {
            if let Some(value) = byte
                && buffer[hit + j] != *value
            {
                continue 'outer;
            }
        }
        results.push(base_addr + hit as u64);
    }

    results
}
