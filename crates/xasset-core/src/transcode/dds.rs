//! DDS container writing.
//!
//! Every image is written with the DX10 extension header so one DXGI format
//! number fully describes the pixel data.

use serde::Serialize;

use crate::error::{Error, Result};

/// DXGI format number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DxgiFormat(pub u32);

impl DxgiFormat {
    pub const R10G10B10A2_UNORM: Self = Self(24);
    pub const R8G8B8A8_UNORM: Self = Self(28);
    pub const R8G8B8A8_UNORM_SRGB: Self = Self(29);
    pub const D16_UNORM: Self = Self(55);
    pub const R16_UNORM: Self = Self(56);
    pub const R8_UNORM: Self = Self(61);
    pub const A8_UNORM: Self = Self(65);
    pub const BC1_UNORM: Self = Self(71);
    pub const BC1_UNORM_SRGB: Self = Self(72);
    pub const BC2_UNORM: Self = Self(74);
    pub const BC2_UNORM_SRGB: Self = Self(75);
    pub const BC3_UNORM: Self = Self(77);
    pub const BC3_UNORM_SRGB: Self = Self(78);
    pub const BC4_UNORM: Self = Self(80);
    pub const BC4_SNORM: Self = Self(81);
    pub const BC5_UNORM: Self = Self(83);
    pub const BC5_SNORM: Self = Self(84);
    pub const B8G8R8A8_UNORM: Self = Self(87);
    pub const B8G8R8X8_UNORM: Self = Self(88);
    pub const BC6H_UF16: Self = Self(95);
    pub const BC6H_SF16: Self = Self(96);
    pub const BC7_UNORM: Self = Self(98);
    pub const BC7_UNORM_SRGB: Self = Self(99);

    /// `(block edge in pixels, bytes per block)` for formats this writer sizes
    pub fn block_layout(self) -> Option<(u32, u32)> {
        match self.0 {
            24 | 28 | 29 | 87 | 88 => Some((1, 4)),
            55 | 56 => Some((1, 2)),
            61 | 65 => Some((1, 1)),
            71 | 72 | 80 | 81 => Some((4, 8)),
            74 | 75 | 77 | 78 | 83 | 84 | 95 | 96 | 98 | 99 => Some((4, 16)),
            _ => None,
        }
    }

    pub fn is_block_compressed(self) -> bool {
        matches!(self.block_layout(), Some((4, _)))
    }

    /// Byte size of one `width` x `height` surface
    pub fn surface_size(self, width: u32, height: u32) -> Option<u64> {
        let (block, bytes) = self.block_layout()?;
        let blocks_wide = width.div_ceil(block).max(1) as u64;
        let blocks_high = height.div_ceil(block).max(1) as u64;
        Some(blocks_wide * blocks_high * bytes as u64)
    }

    /// Byte size of a mip chain of `levels` starting at `width` x `height`
    pub fn chain_size(self, width: u32, height: u32, levels: u32) -> Option<u64> {
        (0..levels.max(1)).try_fold(0u64, |total, level| {
            let w = (width >> level).max(1);
            let h = (height >> level).max(1);
            Some(total + self.surface_size(w, h)?)
        })
    }
}

const DDS_MAGIC: &[u8; 4] = b"DDS ";
const HEADER_SIZE: u32 = 124;
const PIXEL_FORMAT_SIZE: u32 = 32;

const DDSD_CAPS: u32 = 0x1;
const DDSD_HEIGHT: u32 = 0x2;
const DDSD_WIDTH: u32 = 0x4;
const DDSD_PITCH: u32 = 0x8;
const DDSD_PIXELFORMAT: u32 = 0x1000;
const DDSD_MIPMAPCOUNT: u32 = 0x20000;
const DDSD_LINEARSIZE: u32 = 0x80000;
const DDPF_FOURCC: u32 = 0x4;
const DDSCAPS_COMPLEX: u32 = 0x8;
const DDSCAPS_TEXTURE: u32 = 0x1000;
const DDSCAPS_MIPMAP: u32 = 0x40_0000;
const DDSCAPS2_CUBEMAP_ALL_FACES: u32 = 0x200 | 0xFC00;
const D3D10_RESOURCE_DIMENSION_TEXTURE2D: u32 = 3;
const D3D10_RESOURCE_MISC_TEXTURECUBE: u32 = 0x4;

/// Size of the header [`write_dds_header`] produces
pub const DDS_HEADER_SIZE: usize = 4 + HEADER_SIZE as usize + 20;

/// DDS magic, header and DX10 header for one 2D texture or cube map
pub fn write_dds_header(
    format: DxgiFormat,
    width: u32,
    height: u32,
    mip_levels: u32,
    cubemap: bool,
) -> Result<Vec<u8>> {
    let top = format
        .surface_size(width, height)
        .ok_or_else(|| Error::UnsupportedFormat(format!("dxgi format {}", format.0)))?;
    let mip_levels = mip_levels.max(1);

    let mut flags = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT;
    flags |= if format.is_block_compressed() {
        DDSD_LINEARSIZE
    } else {
        DDSD_PITCH
    };
    let pitch = match format.is_block_compressed() {
        true => top as u32,
        false => format.surface_size(width, 1).unwrap_or(0) as u32,
    };
    let mut caps = DDSCAPS_TEXTURE;
    if mip_levels > 1 {
        flags |= DDSD_MIPMAPCOUNT;
        caps |= DDSCAPS_COMPLEX | DDSCAPS_MIPMAP;
    }
    let caps2 = if cubemap {
        caps |= DDSCAPS_COMPLEX;
        DDSCAPS2_CUBEMAP_ALL_FACES
    } else {
        0
    };

    let mut out = Vec::with_capacity(DDS_HEADER_SIZE);
    let mut put = |value: u32| out.extend_from_slice(&value.to_le_bytes());
    put(u32::from_le_bytes(*DDS_MAGIC));
    put(HEADER_SIZE);
    put(flags);
    put(height);
    put(width);
    put(pitch);
    put(0); // depth
    put(mip_levels);
    for _ in 0..11 {
        put(0);
    }
    put(PIXEL_FORMAT_SIZE);
    put(DDPF_FOURCC);
    put(u32::from_le_bytes(*b"DX10"));
    for _ in 0..5 {
        put(0);
    }
    put(caps);
    put(caps2);
    put(0);
    put(0);
    put(0);
    // DX10 extension
    put(format.0);
    put(D3D10_RESOURCE_DIMENSION_TEXTURE2D);
    put(if cubemap { D3D10_RESOURCE_MISC_TEXTURECUBE } else { 0 });
    put(1);
    put(0);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(data: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn test_surface_sizes() {
        assert_eq!(DxgiFormat::BC1_UNORM.surface_size(256, 128), Some(64 * 32 * 8));
        assert_eq!(DxgiFormat::BC3_UNORM.surface_size(2, 2), Some(16));
        assert_eq!(DxgiFormat::B8G8R8A8_UNORM.surface_size(3, 3), Some(36));
        assert_eq!(DxgiFormat(2).surface_size(4, 4), None);
        assert_eq!(
            DxgiFormat::BC1_UNORM.chain_size(8, 8, 3),
            Some(4 * 8 + 8 + 8)
        );
    }

    #[test]
    fn test_header_layout() {
        let header = write_dds_header(DxgiFormat::BC5_UNORM, 512, 256, 10, false).unwrap();
        assert_eq!(header.len(), DDS_HEADER_SIZE);
        assert_eq!(&header[0..4], b"DDS ");
        assert_eq!(u32_at(&header, 4), 124);
        assert_eq!(u32_at(&header, 12), 256);
        assert_eq!(u32_at(&header, 16), 512);
        assert_eq!(u32_at(&header, 28), 10);
        assert_eq!(&header[84..88], b"DX10");
        assert_eq!(u32_at(&header, 128), 83);
        assert_eq!(u32_at(&header, 136), 0);
    }

    #[test]
    fn test_cubemap_flags() {
        let header = write_dds_header(DxgiFormat::BC1_UNORM, 64, 64, 1, true).unwrap();
        assert_eq!(u32_at(&header, 112), DDSCAPS2_CUBEMAP_ALL_FACES);
        assert_eq!(u32_at(&header, 136), D3D10_RESOURCE_MISC_TEXTURECUBE);
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(write_dds_header(DxgiFormat(1234), 4, 4, 1, false).is_err());
    }
}
