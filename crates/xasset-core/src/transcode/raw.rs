use crate::error::{Error, Result};

use super::{DxgiFormat, PixelFormat, StandardImage, translate_image};

/// DXGI format a streamed image's stored format number is written as
pub fn raw_to_dxgi(format: u32) -> Option<DxgiFormat> {
    let dxgi = match format {
        24 => DxgiFormat::R10G10B10A2_UNORM,
        28 => DxgiFormat::R8G8B8A8_UNORM,
        29 => DxgiFormat::R8G8B8A8_UNORM_SRGB,
        61 | 62 => DxgiFormat::R8_UNORM,
        71 => DxgiFormat::BC1_UNORM,
        72 => DxgiFormat::BC1_UNORM_SRGB,
        74 => DxgiFormat::BC2_UNORM,
        75 => DxgiFormat::BC2_UNORM_SRGB,
        77 => DxgiFormat::BC3_UNORM,
        78 => DxgiFormat::BC3_UNORM_SRGB,
        80 => DxgiFormat::BC4_UNORM,
        81 => DxgiFormat::BC4_SNORM,
        83 => DxgiFormat::BC5_UNORM,
        84 => DxgiFormat::BC5_SNORM,
        95 => DxgiFormat::BC6H_UF16,
        96 => DxgiFormat::BC6H_SF16,
        98 => DxgiFormat::BC7_UNORM,
        99 => DxgiFormat::BC7_UNORM_SRGB,
        _ => return None,
    };
    Some(dxgi)
}

/// Wrap one streamed or resident mip in a DDS container
pub fn translate_raw_image(bytes: &[u8], width: u32, height: u32, format: u32) -> Result<StandardImage> {
    let dxgi = raw_to_dxgi(format)
        .ok_or_else(|| Error::UnsupportedFormat(format!("image format {}", format)))?;
    translate_image(bytes, width, height, PixelFormat::Dxgi(dxgi), 1, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_format_mapping() {
        assert_eq!(raw_to_dxgi(62), Some(DxgiFormat::R8_UNORM));
        assert_eq!(raw_to_dxgi(99), Some(DxgiFormat::BC7_UNORM_SRGB));
        assert_eq!(raw_to_dxgi(0), None);
    }

    #[test]
    fn test_translate_raw_bc7() {
        let image = translate_raw_image(&[0u8; 64], 8, 8, 98).unwrap();
        assert_eq!(image.format, DxgiFormat::BC7_UNORM);
        assert!(matches!(
            translate_raw_image(&[0u8; 64], 8, 8, 7).unwrap_err(),
            Error::UnsupportedFormat(_)
        ));
    }
}
