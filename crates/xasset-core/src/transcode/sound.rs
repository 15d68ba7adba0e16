//! Audio containers for sound payloads

use std::io::Cursor as IoCursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use serde::Serialize;

use crate::decode::{SoundCodec, XSoundSpec};
use crate::error::{Error, Result};

const FLAC_BLOCK_SIZE: u16 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AudioContainer {
    Wav,
    Flac,
}

impl AudioContainer {
    pub fn extension(self) -> &'static str {
        match self {
            AudioContainer::Wav => "wav",
            AudioContainer::Flac => "flac",
        }
    }
}

/// Stream parameters taken from the decoded sound record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundFormat {
    pub frame_rate: u32,
    pub channels: u32,
    pub bits_per_sample: u32,
    pub frame_count: u32,
}

impl From<&XSoundSpec> for SoundFormat {
    fn from(spec: &XSoundSpec) -> Self {
        Self {
            frame_rate: spec.frame_rate,
            channels: spec.channels,
            bits_per_sample: if spec.bits_per_sample == 0 {
                16
            } else {
                spec.bits_per_sample
            },
            frame_count: spec.frame_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandardAudio {
    pub container: AudioContainer,
    pub data: Vec<u8>,
}

/// Wrap a sound payload in a playable container.
///
/// Headered payloads pass through unchanged; headerless ones get a header
/// synthesized from `format`.
pub fn translate_sound(bytes: &[u8], codec: SoundCodec, format: &SoundFormat) -> Result<StandardAudio> {
    match codec {
        SoundCodec::WavWithHeader => {
            if !bytes.starts_with(b"RIFF") {
                return Err(Error::Transcode("headered wav without RIFF chunk".to_string()));
            }
            Ok(StandardAudio {
                container: AudioContainer::Wav,
                data: bytes.to_vec(),
            })
        }
        SoundCodec::FlacWithHeader => Ok(StandardAudio {
            container: AudioContainer::Flac,
            data: bytes.to_vec(),
        }),
        SoundCodec::WavNeedsHeader => Ok(StandardAudio {
            container: AudioContainer::Wav,
            data: write_wav(bytes, format)?,
        }),
        SoundCodec::FlacNeedsHeader => {
            let mut data = flac_header(format)?;
            data.extend_from_slice(bytes);
            Ok(StandardAudio {
                container: AudioContainer::Flac,
                data,
            })
        }
    }
}

fn check_stream(format: &SoundFormat) -> Result<()> {
    if format.frame_rate == 0 || format.channels == 0 || format.channels > 8 {
        return Err(Error::Transcode(format!(
            "{} Hz with {} channels",
            format.frame_rate, format.channels
        )));
    }
    Ok(())
}

fn write_wav(bytes: &[u8], format: &SoundFormat) -> Result<Vec<u8>> {
    check_stream(format)?;
    let bits = format.bits_per_sample;
    if !matches!(bits, 8 | 16 | 24 | 32) {
        return Err(Error::Transcode(format!("{}-bit pcm", bits)));
    }

    let spec = WavSpec {
        channels: format.channels as u16,
        sample_rate: format.frame_rate,
        bits_per_sample: bits as u16,
        sample_format: SampleFormat::Int,
    };
    let sample_bytes = (bits / 8) as usize;
    let frame_bytes = sample_bytes * format.channels as usize;
    // A trailing partial frame is dropped
    let whole = bytes.len() - bytes.len() % frame_bytes;

    let to_wav = |e: hound::Error| Error::Transcode(format!("wav: {}", e));
    let mut out = IoCursor::new(Vec::with_capacity(44 + whole));
    {
        let mut writer = WavWriter::new(&mut out, spec).map_err(to_wav)?;
        for sample in bytes[..whole].chunks_exact(sample_bytes) {
            match sample_bytes {
                // 8-bit pcm is unsigned on disk
                1 => writer.write_sample((sample[0] as i16 - 128) as i8),
                2 => writer.write_sample(i16::from_le_bytes([sample[0], sample[1]])),
                3 => writer.write_sample(i32::from_le_bytes([0, sample[0], sample[1], sample[2]]) >> 8),
                _ => writer.write_sample(i32::from_le_bytes([sample[0], sample[1], sample[2], sample[3]])),
            }
            .map_err(to_wav)?;
        }
        writer.finalize().map_err(to_wav)?;
    }
    Ok(out.into_inner())
}

/// `fLaC` marker and a STREAMINFO block for headerless FLAC frames
pub fn flac_header(format: &SoundFormat) -> Result<Vec<u8>> {
    check_stream(format)?;
    let bits = if format.bits_per_sample == 0 { 16 } else { format.bits_per_sample };

    let mut out = Vec::with_capacity(42);
    out.extend_from_slice(b"fLaC");
    // last metadata block, type STREAMINFO, 34 bytes
    out.extend_from_slice(&[0x80, 0x00, 0x00, 0x22]);
    out.extend_from_slice(&FLAC_BLOCK_SIZE.to_be_bytes());
    out.extend_from_slice(&FLAC_BLOCK_SIZE.to_be_bytes());
    out.extend_from_slice(&[0u8; 6]);
    let packed = (format.frame_rate as u64) << 44
        | ((format.channels - 1) as u64) << 41
        | ((bits - 1) as u64 & 0x1F) << 36
        | (format.frame_count as u64 & 0xF_FFFF_FFFF);
    out.extend_from_slice(&packed.to_be_bytes());
    out.extend_from_slice(&[0u8; 16]);
    Ok(out)
}
