//! Wrapping raw payloads in standard containers.
//!
//! Transcoders never decide policy: the caller picks the [`PostProcess`] tag
//! from the image usage and its configuration, and the transcoder carries it
//! through. Malformed or truncated input is an error for that asset only.

mod dds;
mod iwi;
mod raw;
mod sound;

use std::borrow::Cow;

use serde::Serialize;
use strum::Display;
use tracing::trace;

use crate::error::{Error, Result};

pub use dds::{DDS_HEADER_SIZE, DxgiFormat, write_dds_header};
pub use iwi::{IwiImage, parse_iwi, translate_iwi};
pub use raw::{raw_to_dxgi, translate_raw_image};
pub use sound::{AudioContainer, SoundFormat, StandardAudio, flac_header, translate_sound};

/// Hint for a later pixel pass, chosen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display)]
pub enum PostProcess {
    #[default]
    None,
    /// Rebuild Z of a two-channel normal map
    NormalMapExpand,
    /// Convert a bump-style normal map to a regular one
    NormalMapBump,
    ColorStripAlpha,
}

/// Pixel layout of a payload handed to [`translate_image`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Dxgi(DxgiFormat),
    /// 32-bit pixels stored with the red and blue bytes exchanged
    SwappedBgra8,
    /// 24-bit BGR pixels, widened to BGRX on output
    Bgr8,
}

/// A DDS file ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct StandardImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: DxgiFormat,
    pub mip_levels: u32,
    pub cubemap: bool,
    pub post_process: PostProcess,
}

impl StandardImage {
    pub fn with_post_process(mut self, post_process: PostProcess) -> Self {
        self.post_process = post_process;
        self
    }
}

/// Wrap pixel data in a DDS container.
///
/// Fails when `bytes` cannot hold the top level of every face. When the
/// buffer holds fewer complete mips than `mip_levels`, only those are kept.
pub fn translate_image(
    bytes: &[u8],
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    mip_levels: u32,
    is_cubemap: bool,
) -> Result<StandardImage> {
    if width == 0 || height == 0 {
        return Err(Error::Transcode(format!("image of {}x{}", width, height)));
    }

    let (format, pixels) = match pixel_format {
        PixelFormat::Dxgi(format) => (format, Cow::Borrowed(bytes)),
        PixelFormat::SwappedBgra8 => {
            let mut pixels = bytes.to_vec();
            for pixel in pixels.chunks_exact_mut(4) {
                pixel.swap(0, 2);
            }
            (DxgiFormat::B8G8R8A8_UNORM, Cow::Owned(pixels))
        }
        PixelFormat::Bgr8 => {
            let pixels: Vec<u8> = bytes
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 0xFF])
                .collect();
            (DxgiFormat::B8G8R8X8_UNORM, Cow::Owned(pixels))
        }
    };

    let faces: u64 = if is_cubemap { 6 } else { 1 };
    let top = format
        .surface_size(width, height)
        .ok_or_else(|| Error::UnsupportedFormat(format!("dxgi format {}", format.0)))?;
    if (pixels.len() as u64) < top * faces {
        return Err(Error::Transcode(format!(
            "{}x{} format {} needs {} bytes, have {}",
            width,
            height,
            format.0,
            top * faces,
            pixels.len()
        )));
    }

    let mut levels = 1;
    while levels < mip_levels.max(1) {
        let chain = format.chain_size(width, height, levels + 1).unwrap_or(u64::MAX);
        if chain * faces > pixels.len() as u64 {
            trace!("Keeping {} of {} mip levels", levels, mip_levels);
            break;
        }
        levels += 1;
    }
    let used = format.chain_size(width, height, levels).unwrap_or(top) * faces;

    let mut data = write_dds_header(format, width, height, levels, is_cubemap)?;
    data.extend_from_slice(&pixels[..used as usize]);
    Ok(StandardImage {
        data,
        width,
        height,
        format,
        mip_levels: levels,
        cubemap: is_cubemap,
        post_process: PostProcess::None,
    })
}
