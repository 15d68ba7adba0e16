//! Block-chunked payload streams shared by XPAK and IPAK archives.
//!
//! A stream is a sequence of 128-byte block headers, each followed by up to
//! 30 (XPAK) or 31 (IPAK) data blocks. A command packs the block size in its
//! low 24 bits and the codec flag in the high 8. The data following the last
//! block of a header is padded to a 0x80 file boundary.

use crate::error::{Error, Result};
use crate::memory::Cursor;

use super::compress::{decompress_lz4_into, decompress_lzo};

const BLOCK_ALIGN: u64 = 0x80;
/// Output bound of a single compressed block
const MAX_BLOCK_OUTPUT: usize = 0x100000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockCodec {
    Raw,
    Lz4,
    Lzo,
    Oodle,
    /// Padding or unknown, skipped
    Skip,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct BlockFormat {
    pub name: &'static str,
    pub header_size: usize,
    pub commands_offset: usize,
    pub max_commands: usize,
    /// Block count from the first header word
    pub count: fn(u32) -> u32,
    pub codec: fn(u8) -> BlockCodec,
}

pub(crate) const XPAK_BLOCKS: BlockFormat = BlockFormat {
    name: "xpak",
    header_size: 128,
    commands_offset: 8,
    max_commands: 30,
    count: |word| word,
    codec: |flag| match flag {
        0 => BlockCodec::Raw,
        3 => BlockCodec::Lz4,
        6 | 8 => BlockCodec::Oodle,
        _ => BlockCodec::Skip,
    },
};

pub(crate) const IPAK_BLOCKS: BlockFormat = BlockFormat {
    name: "ipak",
    header_size: 128,
    commands_offset: 4,
    max_commands: 31,
    count: |word| word >> 24,
    codec: |flag| match flag {
        0 => BlockCodec::Raw,
        1 => BlockCodec::Lzo,
        _ => BlockCodec::Skip,
    },
};

/// Decode the stream stored in `data`, which starts at file offset `offset`
pub(crate) fn read_block_stream(data: &[u8], offset: u64, format: &BlockFormat) -> Result<Vec<u8>> {
    let cursor = Cursor::new(data, offset);
    let mut out = Vec::new();
    let mut scratch = Vec::new();

    let mut header = offset;
    while cursor.contains(header, format.header_size) {
        let count = (format.count)(cursor.u32_at(header)?) as usize;
        if count > format.max_commands {
            return Err(Error::Decompression(format!(
                "{} block header at {:#x} claims {} blocks",
                format.name, header, count
            )));
        }

        let mut position = header + format.header_size as u64;
        for i in 0..count {
            let command = cursor.u32_at(header + (format.commands_offset + i * 4) as u64)?;
            let size = (command & 0xFF_FFFF) as usize;
            let block = cursor.bytes_at(position, size)?;

            match (format.codec)((command >> 24) as u8) {
                BlockCodec::Raw => out.extend_from_slice(block),
                BlockCodec::Lz4 => {
                    scratch.resize(MAX_BLOCK_OUTPUT, 0);
                    let produced = decompress_lz4_into(block, &mut scratch)?;
                    out.extend_from_slice(&scratch[..produced]);
                }
                BlockCodec::Lzo => out.extend(decompress_lzo(block, None)?),
                BlockCodec::Oodle => {
                    return Err(Error::UnsupportedCodec(format!(
                        "oodle block at {:#x} in {} stream",
                        position, format.name
                    )));
                }
                BlockCodec::Skip => {}
            }

            position += size as u64;
            if i + 1 == count {
                position = position.next_multiple_of(BLOCK_ALIGN);
            }
        }
        header = position;
    }

    Ok(out)
}

/// Test helper building one block stream the way the archives lay it out
#[cfg(test)]
pub(crate) fn build_stream(format: &BlockFormat, offset: u64, blocks: &[(u8, Vec<u8>)]) -> Vec<u8> {
    let mut out = vec![0u8; format.header_size];
    let count = blocks.len() as u32;
    let first = if format.commands_offset == 4 { count << 24 } else { count };
    out[0..4].copy_from_slice(&first.to_le_bytes());
    for (i, (flag, data)) in blocks.iter().enumerate() {
        let command = ((*flag as u32) << 24) | data.len() as u32;
        let at = format.commands_offset + i * 4;
        out[at..at + 4].copy_from_slice(&command.to_le_bytes());
    }
    for (_, data) in blocks {
        out.extend_from_slice(data);
    }
    let end = (offset + out.len() as u64).next_multiple_of(BLOCK_ALIGN);
    out.resize((end - offset) as usize, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lz4_and_raw_blocks_concatenate() {
        let first: Vec<u8> = (0..3000u32).map(|i| (i % 13) as u8).collect();
        let stream = build_stream(
            &XPAK_BLOCKS,
            0x80,
            &[
                (3, lz4_flex::block::compress(&first)),
                (0, b"tail".to_vec()),
                (0xCF, vec![0xEE; 5]),
            ],
        );

        let out = read_block_stream(&stream, 0x80, &XPAK_BLOCKS).unwrap();
        assert_eq!(out.len(), 3004);
        assert_eq!(&out[..3000], &first[..]);
        assert_eq!(&out[3000..], b"tail");
    }

    #[test]
    fn test_two_headers_in_sequence() {
        let mut stream = build_stream(&IPAK_BLOCKS, 0, &[(0, b"abc".to_vec())]);
        let offset = stream.len() as u64;
        stream.extend(build_stream(&IPAK_BLOCKS, offset, &[(0, b"def".to_vec())]));

        assert_eq!(read_block_stream(&stream, 0, &IPAK_BLOCKS).unwrap(), b"abcdef");
    }

    #[test]
    fn test_lzo_block_between_raw_blocks() {
        let middle: Vec<u8> = (0..5000u32).map(|i| (i / 11) as u8).collect();
        let stream = build_stream(
            &IPAK_BLOCKS,
            0x100,
            &[
                (0, b"head".to_vec()),
                (1, lzokay_native::compress(&middle).unwrap()),
                (0, b"tail".to_vec()),
            ],
        );

        let out = read_block_stream(&stream, 0x100, &IPAK_BLOCKS).unwrap();
        assert_eq!(&out[..4], b"head");
        assert_eq!(&out[4..5004], &middle[..]);
        assert_eq!(&out[5004..], b"tail");
    }

    #[test]
    fn test_oodle_block_is_unsupported() {
        let stream = build_stream(&XPAK_BLOCKS, 0, &[(8, vec![0; 16])]);
        let err = read_block_stream(&stream, 0, &XPAK_BLOCKS).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCodec(_)));
    }

    #[test]
    fn test_truncated_block_is_out_of_bounds() {
        let mut stream = build_stream(&XPAK_BLOCKS, 0, &[(0, vec![1; 64])]);
        stream.truncate(128 + 10);
        let err = read_block_stream(&stream, 0, &XPAK_BLOCKS).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { .. }));
    }

    #[test]
    fn test_oversized_count_rejected() {
        let mut stream = vec![0u8; 128];
        stream[0..4].copy_from_slice(&31u32.to_le_bytes());
        assert!(read_block_stream(&stream, 0, &XPAK_BLOCKS).is_err());
    }
}
