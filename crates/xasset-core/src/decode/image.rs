use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::pool::AssetDescriptor;
use crate::schema::{Field, MipLayout, Record};

use super::{ImageSource, ImageUsage, StructDecoder, XImageSpec, XMaterialImage};

/// One streamed mip level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamedMip {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub hash: u64,
    pub size: u64,
}

/// Widest streamed mip of an image record.
///
/// Mip sizes are stored cumulatively and shifted by 4; a level's own size is
/// the difference to the previous level.
pub fn select_streamed_mip(record: &Record, mips: &MipLayout) -> Result<Option<StreamedMip>> {
    let at = |index: u32, field: Field| {
        Field::new(mips.offset + mips.stride * index as u64 + field.offset, field.width)
    };

    let mut best: Option<StreamedMip> = None;
    let mut previous = 0u64;
    for index in 0..mips.count {
        let cumulative = record.get(at(index, mips.size))? >> 4;
        let size = cumulative.saturating_sub(previous);
        previous = cumulative;

        let mip = StreamedMip {
            index,
            width: record.get_u32(at(index, mips.width))?,
            height: record.get_u32(at(index, mips.height))?,
            hash: record.get(at(index, mips.hash))?,
            size,
        };
        if best.is_none_or(|b| mip.width > b.width) {
            best = Some(mip);
        }
    }
    Ok(best)
}

impl<R: ReadMemory + ?Sized> StructDecoder<'_, R> {
    /// Decode an image found in the image pool. Its usage is unknown until
    /// a caller infers it.
    pub fn decode_image(&self, descriptor: &AssetDescriptor) -> Result<XImageSpec> {
        self.decode_image_at(descriptor.source_pointer, &descriptor.name, ImageUsage::Unknown)
    }

    /// Resolve one image slot of a material.
    ///
    /// Titles without an image layout keep their images as standalone files
    /// looked up by name.
    pub fn decode_material_image(&self, image: &XMaterialImage) -> Result<XImageSpec> {
        if self.layouts().image.is_none() {
            return Ok(XImageSpec {
                name: image.name.clone(),
                usage: image.usage,
                source_pointer: image.pointer,
                width: 0,
                height: 0,
                format: 0,
                source: ImageSource::Package {
                    name: image.name.clone(),
                },
            });
        }
        self.decode_image_at(image.pointer, &image.name, image.usage)
    }

    fn decode_image_at(&self, pointer: u64, name: &str, usage: ImageUsage) -> Result<XImageSpec> {
        let Some(layout) = self.layouts().image else {
            return Err(Error::UnsupportedFormat(format!(
                "{} has no image pool",
                self.spec.title
            )));
        };
        let record = self.record(pointer, layout.size)?;

        let mut format = record.get_opt(layout.format)? as u32;
        if let Some((_, remapped)) = layout.format_remap.iter().find(|(from, _)| *from == format) {
            format = *remapped;
        }

        let streamed = match layout.mips {
            Some(mips) => select_streamed_mip(&record, &mips)?.filter(|m| m.width > 0 && m.hash != 0),
            None => None,
        };

        let (width, height, source) = match streamed {
            Some(mip) => (
                mip.width,
                mip.height,
                ImageSource::Streamed {
                    hash: mip.hash,
                    size: mip.size,
                },
            ),
            None => match layout.package_key {
                Some(key) => {
                    if record.get_opt(layout.streamed)? == 0 {
                        return Err(Error::decode(name, "image is not streamed from a package"));
                    }
                    (
                        record.get_u32(layout.width)?,
                        record.get_u32(layout.height)?,
                        ImageSource::PackagedIwi {
                            key: (record.get(key.upper)? << 32) | record.get(key.lower)?,
                        },
                    )
                }
                None => {
                    let data = record.get_opt(layout.loaded_data)?;
                    let size = record.get_opt(layout.loaded_size)?;
                    if data == 0 || size == 0 {
                        return Err(Error::decode(name, "image has no resident pixel data"));
                    }
                    (
                        record.get_u32(layout.width)?,
                        record.get_u32(layout.height)?,
                        ImageSource::Resident {
                            pointer: data,
                            size,
                        },
                    )
                }
            },
        };

        Ok(XImageSpec {
            name: name.to_string(),
            usage,
            source_pointer: pointer,
            width,
            height,
            format,
            source,
        })
    }
}
