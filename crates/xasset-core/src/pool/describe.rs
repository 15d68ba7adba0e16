//! Per-kind summaries of pool records

use crate::decode::SoundCodec;
use crate::error::Result;
use crate::schema::{Field, NameStyle, Record, TitleLayouts, directory_of};
use crate::title::PlaceholderRules;

use super::{AssetDetail, AssetKind, PlaceholderFilter};

/// Reads the kind-specific summary of a record using a title's layouts
#[derive(Debug, Clone, Copy)]
pub struct LayoutDescriber<'a> {
    kind: AssetKind,
    layouts: &'a TitleLayouts,
}

impl<'a> LayoutDescriber<'a> {
    /// `None` when the title has no layout for `kind`
    pub fn new(kind: AssetKind, layouts: &'a TitleLayouts) -> Option<Self> {
        let present = match kind {
            AssetKind::Animation | AssetKind::Model | AssetKind::Material => true,
            AssetKind::Image => layouts.image.is_some(),
            AssetKind::Sound => layouts.sound.is_some(),
            AssetKind::RawFile => layouts.rawfile.is_some(),
        };
        present.then_some(Self { kind, layouts })
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn name_field(&self) -> Field {
        let l = self.layouts;
        match self.kind {
            AssetKind::Animation => l.anim.name,
            AssetKind::Model => l.model.name,
            AssetKind::Material => l.material.name,
            AssetKind::Image => l.image.map_or(l.anim.name, |i| i.name),
            AssetKind::Sound => l.sound.map_or(l.anim.name, |s| s.name),
            AssetKind::RawFile => l.rawfile.map_or(l.anim.name, |r| r.name),
        }
    }

    pub fn name_style(&self) -> NameStyle {
        let l = self.layouts;
        match self.kind {
            AssetKind::Animation => l.anim.name_style,
            AssetKind::Model => l.model.name_style,
            AssetKind::Image => l.image.map_or(NameStyle::AsIs, |i| i.name_style),
            AssetKind::Sound => NameStyle::FileStem,
            AssetKind::RawFile => NameStyle::FileName,
            AssetKind::Material => NameStyle::AsIs,
        }
    }

    /// Fresh placeholder filter for one walk of this kind
    pub fn placeholder_filter(&self, rules: &PlaceholderRules) -> PlaceholderFilter {
        match self.kind {
            AssetKind::Animation => {
                PlaceholderFilter::new(rules.anim_sentinels, &[], self.layouts.anim.placeholder_fields())
            }
            AssetKind::Model => PlaceholderFilter::new(
                rules.model_sentinels,
                rules.model_prefixes,
                self.layouts.model.placeholder_fields(),
            ),
            _ => PlaceholderFilter::none(),
        }
    }

    /// Detail and payload size hint (-1 when unknown) of one record
    pub fn describe(&self, record: &Record, raw_name: &str) -> Result<(AssetDetail, i64)> {
        let l = self.layouts;
        match self.kind {
            AssetKind::Animation => {
                let anim = &l.anim;
                let detail = AssetDetail::Animation {
                    framerate: record.get_f32(anim.framerate)?,
                    frame_count: record.get_u32(anim.num_frames)?,
                    bone_count: record.get_u32(anim.bone_counts.total)?,
                    streamed: false,
                };
                Ok((detail, -1))
            }
            AssetKind::Model => {
                let model = &l.model;
                let detail = AssetDetail::Model {
                    bone_count: record.get_u32(model.num_bones)?,
                    cosmetic_bone_count: record.get_opt(model.num_cosmetic_bones)? as u32,
                    lod_count: record.get_u32(model.num_lods)?,
                };
                Ok((detail, -1))
            }
            AssetKind::Image => {
                let Some(image) = l.image else {
                    return Ok((AssetDetail::Image { width: 0, height: 0, format: 0, streamed: false }, -1));
                };
                let streamed = match image.mips {
                    Some(mips) => {
                        let hash = Field::new(mips.offset + mips.hash.offset, mips.hash.width);
                        record.get(hash)? != 0
                    }
                    None => record.get_opt(image.streamed)? != 0,
                };
                let size_hint = match image.loaded_size {
                    Some(field) if !streamed => record.get(field)? as i64,
                    _ => -1,
                };
                let detail = AssetDetail::Image {
                    width: record.get_u32(image.width)?,
                    height: record.get_u32(image.height)?,
                    format: record.get_opt(image.format)? as u32,
                    streamed,
                };
                Ok((detail, size_hint))
            }
            AssetKind::Sound => {
                let Some(sound) = l.sound else {
                    return Ok((self.empty_sound(raw_name), -1));
                };
                let frame_rate = record.get_opt(sound.frame_rate)? as u32;
                let frame_count = record.get_opt(sound.frame_count)? as u32;
                let length_ms = if frame_rate > 0 {
                    (1000 * frame_count as u64 / frame_rate as u64) as u32
                } else {
                    0
                };
                let codec = if sound.headered {
                    SoundCodec::WavWithHeader
                } else {
                    SoundCodec::WavNeedsHeader
                };
                let detail = AssetDetail::Sound {
                    frame_rate,
                    frame_count,
                    channels: record.get_opt(sound.channels)? as u32,
                    length_ms,
                    package_index: 0,
                    localized: false,
                    codec,
                    path: directory_of(raw_name),
                };
                Ok((detail, record.get(sound.data_size)? as i64))
            }
            AssetKind::RawFile => {
                let Some(rawfile) = l.rawfile else {
                    return Ok((
                        AssetDetail::RawFile { path: directory_of(raw_name), size: 0, data_pointer: 0 },
                        -1,
                    ));
                };
                let size = record.get(rawfile.data_size)?;
                let detail = AssetDetail::RawFile {
                    path: directory_of(raw_name),
                    size,
                    data_pointer: record.get(rawfile.data)?,
                };
                Ok((detail, size as i64))
            }
            AssetKind::Material => {
                let detail = AssetDetail::Material {
                    image_count: record.get_u32(l.material.image_count)?,
                };
                Ok((detail, -1))
            }
        }
    }

    fn empty_sound(&self, raw_name: &str) -> AssetDetail {
        AssetDetail::Sound {
            frame_rate: 0,
            frame_count: 0,
            channels: 0,
            length_ms: 0,
            package_index: 0,
            localized: false,
            codec: SoundCodec::WavWithHeader,
            path: directory_of(raw_name),
        }
    }
}
