//! `.sabs`/`.sabl` sound banks.
//!
//! A bank is indexed like a pool: every entry becomes a file-backed sound
//! descriptor whose source pointer is the payload's byte offset in the bank.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::decode::SoundCodec;
use crate::error::{Error, Result};
use crate::memory::Cursor;
use crate::pool::{AssetDescriptor, AssetDetail, AssetStatus};
use crate::schema::{NameStyle, directory_of};

use super::ArchiveSet;

const SAB_MAGIC: u32 = 0x2358_5532;
const HEADER_SIZE: usize = 0x38;
const NAME_TABLE_POINTER: u64 = 0x250;
const NAME_HASH_MASK: u64 = 0x0FFF_FFFF_FFFF_FFFF;
const FRAME_RATES: [u32; 9] = [8000, 12000, 16000, 24000, 32000, 44100, 48000, 96000, 192000];

/// Case-insensitive name hash used by banks that key entries by name
pub fn sound_name_hash(name: &str) -> u32 {
    name.bytes().fold(5381u32, |hash, c| {
        (c.to_ascii_lowercase() as u32)
            .wrapping_add(hash << 6)
            .wrapping_add(hash << 16)
            .wrapping_sub(hash)
    })
}

#[derive(Debug, Clone, Copy)]
struct BankHeader {
    version: u32,
    entry_size: u32,
    name_entry_size: u32,
    entry_count: u32,
    entry_table: u64,
}

/// One entry table record, normalized across versions
#[derive(Debug, Clone, Copy)]
struct BankEntry {
    key: u64,
    offset: u64,
    size: u64,
    frame_count: u32,
    frame_rate: u32,
    channels: u32,
    codec: SoundCodec,
}

/// Stored entry size per bank version
fn entry_size(version: u32) -> Option<usize> {
    match version {
        0x4 | 0xA => Some(44),
        0xE => Some(20),
        0xF => Some(36),
        0x15 => Some(48),
        _ => None,
    }
}

fn frame_rate(index: u8) -> u32 {
    FRAME_RATES.get(index as usize).copied().unwrap_or(0)
}

fn parse_entry(version: u32, c: &Cursor<'_>, at: u64) -> Result<BankEntry> {
    Ok(match version {
        0x4 | 0xA => BankEntry {
            key: c.u32_at(at)? as u64,
            size: c.u32_at(at + 4)? as u64,
            // Payload follows the seek table
            offset: c.u64_at(at + 0x14)? + c.u32_at(at + 8)? as u64,
            frame_count: c.u32_at(at + 0xC)?,
            frame_rate: c.u32_at(at + 0x1C)?,
            channels: c.u8_at(at + 0x20)? as u32,
            codec: SoundCodec::FlacNeedsHeader,
        },
        0xE => BankEntry {
            key: c.u32_at(at)? as u64,
            size: c.u32_at(at + 4)? as u64,
            offset: c.u32_at(at + 8)? as u64,
            frame_count: c.u32_at(at + 0xC)?,
            frame_rate: frame_rate(c.u8_at(at + 0x10)?),
            channels: c.u8_at(at + 0x11)? as u32,
            codec: match c.u8_at(at + 0x13)? {
                0 => SoundCodec::WavNeedsHeader,
                _ => SoundCodec::FlacWithHeader,
            },
        },
        0xF => BankEntry {
            key: c.u32_at(at)? as u64,
            size: c.u32_at(at + 4)? as u64,
            frame_count: c.u32_at(at + 8)?,
            offset: c.u64_at(at + 0x10)?,
            frame_rate: frame_rate(c.u8_at(at + 0x18)?),
            channels: c.u8_at(at + 0x19)? as u32,
            codec: SoundCodec::FlacWithHeader,
        },
        _ => BankEntry {
            key: c.u64_at(at)?,
            offset: c.u64_at(at + 0x10)?,
            size: c.u32_at(at + 0x18)? as u64,
            frame_count: c.u32_at(at + 0x1C)?,
            frame_rate: frame_rate(c.u8_at(at + 0x28)?),
            channels: c.u8_at(at + 0x29)? as u32,
            codec: SoundCodec::FlacWithHeader,
        },
    })
}

/// An opened sound bank and the descriptors of its entries
pub struct SoundBank {
    path: PathBuf,
    version: u32,
    archives: ArchiveSet,
    descriptors: Vec<AssetDescriptor>,
}

impl SoundBank {
    pub fn open(path: &Path, skip_blank: bool) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let cursor = Cursor::new(&bytes, 0);
        if bytes.len() < HEADER_SIZE || cursor.u32_at(0)? != SAB_MAGIC {
            return Err(Error::UnsupportedFormat(format!(
                "{} is not a sound bank",
                path.display()
            )));
        }

        let header = BankHeader {
            version: cursor.u32_at(4)?,
            entry_size: cursor.u32_at(8)?,
            name_entry_size: cursor.u32_at(0x10)?,
            entry_count: cursor.u32_at(0x14)?,
            entry_table: cursor.u64_at(0x28)?,
        };
        let Some(base_size) = entry_size(header.version) else {
            return Err(Error::UnsupportedFormat(format!(
                "sound bank version {:#x}",
                header.version
            )));
        };
        let stride = (header.entry_size as usize).max(base_size) as u64;
        debug!(
            "Sound bank {} v{:#x}: {} entries",
            path.display(),
            header.version,
            header.entry_count
        );

        let names = read_names(&cursor, &header)?;
        let by_hash: HashMap<u32, &str> = if header.version == 0xA {
            names.iter().map(|n| (sound_name_hash(n), n.as_str())).collect()
        } else {
            HashMap::new()
        };

        let mut descriptors = Vec::with_capacity(header.entry_count as usize);
        for i in 0..header.entry_count as u64 {
            let entry = parse_entry(header.version, &cursor, header.entry_table + i * stride)?;
            if skip_blank && entry.size == 0 {
                continue;
            }

            let raw_name = match header.version {
                0xA => by_hash.get(&(entry.key as u32)).map(|n| n.to_string()),
                _ => names.get(i as usize).cloned(),
            }
            .unwrap_or_else(|| format!("_{:x}", entry.key));

            let name = match header.version {
                0x15 => raw_name.clone(),
                _ => NameStyle::FileStem.apply(&raw_name),
            };
            let length_ms = match entry.frame_rate {
                0 => 0,
                rate => (1000 * entry.frame_count as u64 / rate as u64) as u32,
            };

            descriptors.push(AssetDescriptor {
                name,
                source_pointer: entry.offset,
                pool_index: i as u32,
                status: AssetStatus::Loaded,
                size_hint: entry.size as i64,
                is_file_backed: true,
                detail: AssetDetail::Sound {
                    frame_rate: entry.frame_rate,
                    frame_count: entry.frame_count,
                    channels: entry.channels,
                    length_ms,
                    package_index: 0,
                    localized: false,
                    codec: entry.codec,
                    path: directory_of(&raw_name),
                },
            });
        }

        info!("Loaded {} sounds from {}", descriptors.len(), path.display());
        let mut archives = ArchiveSet::new();
        archives.push(path);
        Ok(Self {
            path: path.to_path_buf(),
            version: header.version,
            archives,
            descriptors,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn descriptors(&self) -> &[AssetDescriptor] {
        &self.descriptors
    }

    /// Stored bytes of one entry, without any synthesized header
    pub fn read_payload(&self, offset: u64, size: u64) -> Result<Vec<u8>> {
        self.archives.read_at(0, offset, size as usize)
    }
}

fn read_names(cursor: &Cursor<'_>, header: &BankHeader) -> Result<Vec<String>> {
    let table = cursor.u64_at(NAME_TABLE_POINTER).unwrap_or(0);
    if table == 0 || cursor.u64_at(table).unwrap_or(0) == 0 {
        return Ok(Vec::new());
    }

    let stride = header.name_entry_size as u64 * 2;
    let mut names = Vec::with_capacity(header.entry_count as usize);
    for i in 0..header.entry_count as u64 {
        let at = table + i * stride;
        let name = if header.version == 0x15 {
            format!("xsound_{:x}", cursor.u64_at(at)? & NAME_HASH_MASK)
        } else {
            cursor.cstring_at(at)?
        };
        names.push(name);
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn header(version: u32, entry_size: u32, count: u32, table: u64) -> Vec<u8> {
        let mut out = vec![0u8; 0x300];
        out[0..4].copy_from_slice(&SAB_MAGIC.to_le_bytes());
        out[4..8].copy_from_slice(&version.to_le_bytes());
        out[8..0xC].copy_from_slice(&entry_size.to_le_bytes());
        out[0x10..0x14].copy_from_slice(&0x20u32.to_le_bytes());
        out[0x14..0x18].copy_from_slice(&count.to_le_bytes());
        out[0x28..0x30].copy_from_slice(&table.to_le_bytes());
        out
    }

    fn write(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn test_sound_name_hash_ignores_case() {
        assert_eq!(sound_name_hash("a"), 97 + (5381 << 6) + (5381 << 16) - 5381);
        assert_eq!(sound_name_hash("Weapons/AK47"), sound_name_hash("weapons/ak47"));
    }

    #[test]
    fn test_v15_bank_with_names() {
        let mut bank = header(0xF, 36, 2, 0x300);
        // two entries
        let entries = [(0x11u32, 4u32, 96u32, 0x400u64, 6u8, 2u8), (0x22, 0, 0, 0x404, 5, 1)];
        for (key, size, frames, offset, rate, channels) in entries {
            let mut entry = vec![0u8; 36];
            entry[0..4].copy_from_slice(&key.to_le_bytes());
            entry[4..8].copy_from_slice(&size.to_le_bytes());
            entry[8..0xC].copy_from_slice(&frames.to_le_bytes());
            entry[0x10..0x18].copy_from_slice(&offset.to_le_bytes());
            entry[0x18] = rate;
            entry[0x19] = channels;
            bank.extend(entry);
        }
        bank.resize(0x400, 0);
        bank.extend_from_slice(b"FLAC");
        // name table: two 0x40-byte slots
        let names_at = bank.len() as u64;
        bank.extend_from_slice(b"weapons/ak47/fire.wav\0");
        bank.resize(names_at as usize + 0x40, 0);
        bank.extend_from_slice(b"ui/click\0");
        bank.resize(names_at as usize + 0x80, 0);
        bank[0x250..0x258].copy_from_slice(&names_at.to_le_bytes());

        let file = write(&bank);
        let sab = SoundBank::open(file.path(), false).unwrap();
        assert_eq!(sab.version(), 0xF);
        assert_eq!(sab.descriptors().len(), 2);

        let fire = &sab.descriptors()[0];
        assert_eq!(fire.name, "fire");
        assert_eq!(fire.source_pointer, 0x400);
        assert!(fire.is_file_backed);
        match &fire.detail {
            AssetDetail::Sound {
                frame_rate,
                channels,
                length_ms,
                codec,
                path,
                ..
            } => {
                assert_eq!(*frame_rate, 48_000);
                assert_eq!(*channels, 2);
                assert_eq!(*length_ms, 2);
                assert_eq!(*codec, SoundCodec::FlacWithHeader);
                assert_eq!(path, "weapons/ak47");
            }
            other => panic!("unexpected detail {:?}", other),
        }
        assert_eq!(sab.read_payload(0x400, 4).unwrap(), b"FLAC");

        let skipped = SoundBank::open(file.path(), true).unwrap();
        assert_eq!(skipped.descriptors().len(), 1);
    }

    #[test]
    fn test_v4_bank_without_names_uses_keys() {
        let mut bank = header(0x4, 44, 1, 0x300);
        let mut entry = vec![0u8; 44];
        entry[0..4].copy_from_slice(&0xBEEFu32.to_le_bytes());
        entry[4..8].copy_from_slice(&16u32.to_le_bytes());
        entry[8..0xC].copy_from_slice(&0x20u32.to_le_bytes());
        entry[0x14..0x1C].copy_from_slice(&0x1000u64.to_le_bytes());
        entry[0x1C..0x20].copy_from_slice(&44_100u32.to_le_bytes());
        entry[0x20] = 1;
        bank.extend(entry);

        let file = write(&bank);
        let sab = SoundBank::open(file.path(), false).unwrap();
        let sound = &sab.descriptors()[0];
        assert_eq!(sound.name, "_beef");
        assert_eq!(sound.source_pointer, 0x1020);
        assert!(matches!(
            sound.detail,
            AssetDetail::Sound {
                codec: SoundCodec::FlacNeedsHeader,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let file = write(&header(0x9, 0, 0, 0));
        assert!(matches!(
            SoundBank::open(file.path(), false).err(),
            Some(Error::UnsupportedFormat(_))
        ));
    }
}
