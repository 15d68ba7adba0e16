use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::pool::{AssetDescriptor, AssetDetail};

use super::{SoundCodec, SoundSource, StructDecoder, XSoundSpec};

impl<R: ReadMemory + ?Sized> StructDecoder<'_, R> {
    /// Decode a loaded sound from its pool record.
    ///
    /// The record is read again so the data pointer is taken at decode time,
    /// not from the walk.
    pub fn decode_sound(&self, descriptor: &AssetDescriptor) -> Result<XSoundSpec> {
        let Some(layout) = self.layouts().sound else {
            return Err(Error::UnsupportedFormat(format!(
                "{} has no sound pool",
                self.spec.title
            )));
        };
        let record = self.record(descriptor.source_pointer, layout.size)?;

        let pointer = record.get(layout.data)?;
        let size = record.get(layout.data_size)?;
        if pointer == 0 || size == 0 {
            return Err(Error::decode(&descriptor.name, "sound has no sample data"));
        }

        let codec = if layout.headered {
            SoundCodec::WavWithHeader
        } else {
            SoundCodec::WavNeedsHeader
        };

        Ok(XSoundSpec {
            name: descriptor.name.clone(),
            source: SoundSource::Memory { pointer },
            size,
            frame_rate: record.get_opt(layout.frame_rate)? as u32,
            frame_count: record.get_opt(layout.frame_count)? as u32,
            channels: record.get_opt(layout.channels)? as u32,
            bits_per_sample: record.get_opt(layout.bits_per_sample)? as u32,
            codec,
        })
    }
}

/// Sound spec of a sound bank entry; the descriptor carries everything
pub fn file_sound_spec(descriptor: &AssetDescriptor) -> Result<XSoundSpec> {
    let AssetDetail::Sound {
        frame_rate,
        frame_count,
        channels,
        codec,
        ..
    } = descriptor.detail
    else {
        return Err(Error::decode(&descriptor.name, "not a sound"));
    };
    if descriptor.size_hint < 0 {
        return Err(Error::decode(&descriptor.name, "sound entry has no size"));
    }

    Ok(XSoundSpec {
        name: descriptor.name.clone(),
        source: SoundSource::File {
            offset: descriptor.source_pointer,
        },
        size: descriptor.size_hint as u64,
        frame_rate,
        frame_count,
        channels,
        bits_per_sample: 16,
        codec,
    })
}
