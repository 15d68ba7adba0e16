//! Legacy `.iwi` images stored in IWD archives

use crate::error::{Error, Result};
use crate::memory::Cursor;

use super::{DxgiFormat, PixelFormat, StandardImage, translate_image};

const IWI_MAGIC: &[u8; 3] = b"IWi";
const FLAG_CUBEMAP: u8 = 0x4;

/// Parsed `.iwi` header plus the largest mip's pixel data
#[derive(Debug, Clone, PartialEq)]
pub struct IwiImage {
    pub version: u8,
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub cubemap: bool,
    pub data: Vec<u8>,
}

fn pixel_format(version: u8, format: u8) -> Result<PixelFormat> {
    Ok(match format {
        // Version 8 stores these with red and blue exchanged
        0x1 if version == 0x8 => PixelFormat::SwappedBgra8,
        0x1 => PixelFormat::Dxgi(DxgiFormat::B8G8R8A8_UNORM),
        0x2 => PixelFormat::Bgr8,
        0x3 => PixelFormat::Dxgi(DxgiFormat::D16_UNORM),
        0x4 | 0x5 => PixelFormat::Dxgi(DxgiFormat::A8_UNORM),
        0xB => PixelFormat::Dxgi(DxgiFormat::BC1_UNORM),
        0xC => PixelFormat::Dxgi(DxgiFormat::BC2_UNORM),
        0xD => PixelFormat::Dxgi(DxgiFormat::BC3_UNORM),
        0xE => PixelFormat::Dxgi(DxgiFormat::BC5_UNORM),
        other => {
            return Err(Error::UnsupportedFormat(format!("iwi pixel format {:#x}", other)));
        }
    })
}

pub fn parse_iwi(bytes: &[u8]) -> Result<IwiImage> {
    let cursor = Cursor::new(bytes, 0);
    if cursor.bytes_at(0, 3)? != IWI_MAGIC {
        return Err(Error::Transcode("not an iwi image".to_string()));
    }
    let version = cursor.u8_at(3)?;

    // (info block, mip table, mip entries)
    let (info, mips, mip_count) = match version {
        0x6 => (4, 0xC, 4),
        0x8 => (8, 0x10, 4),
        0xD => (4, 0x10, 8),
        0x1B => (4, 0x20, 8),
        other => {
            return Err(Error::UnsupportedFormat(format!("iwi version {:#x}", other)));
        }
    };

    let format = cursor.u8_at(info)?;
    let flags = cursor.u8_at(info + 1)?;
    let width = cursor.u16_at(info + 2)? as u32;
    let height = cursor.u16_at(info + 4)? as u32;

    let first = cursor.i32_at(mips)?;
    let second = cursor.i32_at(mips + 4)?;
    let last = cursor.i32_at(mips + 4 * (mip_count - 1))?;
    // Mip offsets mark level ends; the largest level runs from the second
    // offset to the end of the file, or follows the table for single-mip images
    let start = if first == second || first == last {
        mips + 4 * mip_count
    } else {
        u64::try_from(second)
            .map_err(|_| Error::Transcode(format!("negative iwi mip offset {}", second)))?
    };
    if start > bytes.len() as u64 {
        return Err(Error::Transcode(format!(
            "iwi data offset {:#x} past end of {} bytes",
            start,
            bytes.len()
        )));
    }

    Ok(IwiImage {
        version,
        format: pixel_format(version, format)?,
        width,
        height,
        cubemap: flags & FLAG_CUBEMAP != 0,
        data: bytes[start as usize..].to_vec(),
    })
}

/// Parse an `.iwi` file and wrap its largest mip as DDS
pub fn translate_iwi(bytes: &[u8]) -> Result<StandardImage> {
    let image = parse_iwi(bytes)?;
    translate_image(
        &image.data,
        image.width,
        image.height,
        image.format,
        1,
        image.cubemap,
    )
}
