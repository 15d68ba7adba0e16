use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::schema::NameStyle;
use crate::title::UsageHashes;

use super::{ImageUsage, MAX_NESTED_COUNT, StructDecoder, XMaterial, XMaterialImage};

impl<R: ReadMemory + ?Sized> StructDecoder<'_, R> {
    /// Decode the material at `pointer` with its image table
    pub fn decode_material(&self, pointer: u64) -> Result<XMaterial> {
        let layout = &self.layouts().material;
        let raw_name = self.string_at(self.field(pointer, layout.name)?)?;
        let name = NameStyle::FileStem.apply(&raw_name);

        let count = self.field(pointer, layout.image_count)? as u32;
        if count > MAX_NESTED_COUNT {
            return Err(Error::InconsistentCounts {
                asset: name,
                message: format!("{} images", count),
            });
        }
        let table = self.field(pointer, layout.image_table)?;
        if table == 0 && count > 0 {
            return Err(Error::decode(name, "image table is null"));
        }

        let mut images = Vec::with_capacity(count as usize);
        for i in 0..count as u64 {
            let entry = self.record(table + i * layout.image_entry_size, layout.image_entry_size)?;
            let image = entry.get(layout.image_pointer)?;
            if image == 0 {
                continue;
            }

            let semantic_hash = entry.get_opt(layout.semantic_hash)? as u32;
            let usage_byte = layout.usage.map(|f| entry.get(f)).transpose()?;
            let image_name = self.string_at(self.field(image, layout.image_name)?)?;

            images.push(XMaterialImage {
                usage: usage_for(
                    &self.spec.usage_hashes,
                    layout.semantic_hash.map(|_| semantic_hash),
                    usage_byte,
                ),
                pointer: image,
                semantic_hash,
                name: image_name,
            });
        }

        Ok(XMaterial { name, images })
    }
}

/// Usage from the semantic hash, then the usage byte, otherwise unknown
fn usage_for(hashes: &UsageHashes, hash: Option<u32>, usage_byte: Option<u64>) -> ImageUsage {
    if let Some(hash) = hash {
        if hash == hashes.diffuse {
            return ImageUsage::Diffuse;
        }
        if hash == hashes.normal {
            return ImageUsage::Normal;
        }
        if hash == hashes.specular {
            return ImageUsage::Specular;
        }
    }

    match usage_byte {
        Some(2) => ImageUsage::Diffuse,
        Some(5) => ImageUsage::Normal,
        Some(8) => ImageUsage::Specular,
        _ => ImageUsage::Unknown,
    }
}
