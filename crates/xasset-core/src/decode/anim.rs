use tracing::trace;

use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::pool::AssetDescriptor;
use crate::schema::{AnimLayout, Record};

use super::{AnimBoneCounts, AnimDeltaParts, StructDecoder, XAnim};

impl<R: ReadMemory + ?Sized> StructDecoder<'_, R> {
    pub fn decode_anim(&self, descriptor: &AssetDescriptor) -> Result<XAnim> {
        let layout = &self.layouts().anim;
        let record = self.record(descriptor.source_pointer, layout.size)?;
        let name = descriptor.name.clone();

        let frame_count = record.get_u32(layout.num_frames)?;
        let bone_counts = bone_counts(&record, layout)?;
        let rotated = bone_counts.none_rotated
            + bone_counts.two_d_rotated
            + bone_counts.normal_rotated
            + bone_counts.two_d_static_rotated
            + bone_counts.normal_static_rotated;
        if rotated > bone_counts.total {
            return Err(Error::InconsistentCounts {
                asset: name,
                message: format!(
                    "{} rotated bones exceed total of {}",
                    rotated, bone_counts.total
                ),
            });
        }

        let delta_ptr = record.get(layout.delta_parts)?;
        let delta = if delta_ptr == 0 {
            AnimDeltaParts::default()
        } else {
            trace!("Reading delta parts of {} at {:#x}", name, delta_ptr);
            let delta = self.record(delta_ptr, layout.delta.size)?;
            AnimDeltaParts {
                translations: delta.get(layout.delta.translations)?,
                rotations_2d: delta.get(layout.delta.rotations_2d)?,
                rotations_3d: delta.get_opt(layout.delta.rotations_3d)?,
            }
        };

        let additive = match layout.additive_type {
            Some(value) => record.get(layout.asset_type)? == value,
            None => false,
        };
        let viewmodel = layout
            .viewmodel_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix));
        let bone_type_size = match (layout.inline_indices, frame_count > 255) {
            (false, _) => 0,
            (true, true) => 2,
            (true, false) => 1,
        };

        Ok(XAnim {
            framerate: record.get_f32(layout.framerate)?,
            frame_count,
            looping: record.get(layout.looping)? != 0,
            additive,
            viewmodel,
            inline_indices: layout.inline_indices,
            bone_ids: record.get(layout.bone_ids)?,
            bone_index_size: layout.bone_index_size,
            bone_type_size,
            rotation: layout.rotation,
            translation: layout.translation,
            data_bytes: record.get(layout.data_bytes)?,
            data_shorts: record.get(layout.data_shorts)?,
            data_ints: record.get(layout.data_ints)?,
            random_data_bytes: record.get(layout.random_data_bytes)?,
            random_data_shorts: record.get(layout.random_data_shorts)?,
            random_data_ints: record.get(layout.random_data_ints)?,
            long_indices: record.get(layout.long_indices)?,
            notifications: record.get(layout.notifications)?,
            notification_count: record.get_u32(layout.notification_count)?,
            delta,
            bone_counts,
            name,
        })
    }
}

fn bone_counts(record: &Record, layout: &AnimLayout) -> Result<AnimBoneCounts> {
    let fields = &layout.bone_counts;
    Ok(AnimBoneCounts {
        none_rotated: record.get_u32(fields.none_rotated)?,
        two_d_rotated: record.get_u32(fields.two_d_rotated)?,
        normal_rotated: record.get_u32(fields.normal_rotated)?,
        two_d_static_rotated: record.get_u32(fields.two_d_static_rotated)?,
        normal_static_rotated: record.get_u32(fields.normal_static_rotated)?,
        normal_translated: record.get_u32(fields.normal_translated)?,
        precise_translated: record.get_u32(fields.precise_translated)?,
        static_translated: record.get_u32(fields.static_translated)?,
        none_translated: record.get_u32(fields.none_translated)?,
        total: record.get_u32(fields.total)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::decode::StructDecoder;
    use crate::memory::MockMemoryBuilder;
    use crate::pool::{AssetDescriptor, AssetDetail, AssetStatus};
    use crate::schema::KeyEncoding;
    use crate::title::{GameTitle, builtin_titles};

    fn descriptor(name: &str, pointer: u64) -> AssetDescriptor {
        AssetDescriptor {
            name: name.to_string(),
            source_pointer: pointer,
            pool_index: 0,
            status: AssetStatus::Loaded,
            size_hint: -1,
            is_file_backed: false,
            detail: AssetDetail::Animation {
                framerate: 30.0,
                frame_count: 300,
                bone_count: 4,
                streamed: false,
            },
        }
    }

    #[test]
    fn test_decode_mw3_anim_with_delta() {
        let spec = builtin_titles()
            .iter()
            .find(|s| s.title == GameTitle::ModernWarfare3)
            .unwrap();
        let anim = 0x1000;
        let reader = MockMemoryBuilder::new()
            .zeroed(anim, 0x58)
            .write_u16(anim + 0xE, 300)
            .write_u8(anim + 0x10, 1)
            .write_u8(anim + 0x11, 1)
            .write_u8(anim + 0x13, 2)
            .write_u8(anim + 0x1A, 4)
            .write_u8(anim + 0x1B, 3)
            .write_f32(anim + 0x28, 30.0)
            .write_u32(anim + 0x30, 0x8000)
            .write_u32(anim + 0x54, 0x9000)
            .zeroed(0x9000, 0xC)
            .write_u32(0x9000, 0x9100)
            .write_u32(0x9008, 0x9300)
            .build();

        let decoded = StructDecoder::new(&reader, spec)
            .decode_anim(&descriptor("viewmodel_ak47_fire", anim))
            .unwrap();
        assert_eq!(decoded.frame_count, 300);
        assert_eq!(decoded.framerate, 30.0);
        assert!(decoded.looping);
        assert!(decoded.viewmodel);
        assert!(!decoded.additive);
        assert_eq!(decoded.bone_type_size, 2);
        assert_eq!(decoded.bone_counts.none_rotated, 1);
        assert_eq!(decoded.bone_counts.normal_rotated, 2);
        assert_eq!(decoded.bone_counts.total, 4);
        assert_eq!(decoded.notification_count, 3);
        assert_eq!(decoded.bone_ids, 0x8000);
        assert_eq!(decoded.delta.translations, 0x9100);
        assert_eq!(decoded.delta.rotations_3d, 0x9300);
        assert_eq!(decoded.rotation, KeyEncoding::DivideBySize);
    }

    #[test]
    fn test_rotated_bones_over_total_is_inconsistent() {
        let spec = builtin_titles()
            .iter()
            .find(|s| s.title == GameTitle::ModernWarfare3)
            .unwrap();
        let reader = MockMemoryBuilder::new()
            .zeroed(0x1000, 0x58)
            .write_u8(0x1000 + 0x11, 9)
            .write_u8(0x1000 + 0x1A, 2)
            .build();

        let err = StructDecoder::new(&reader, spec)
            .decode_anim(&descriptor("walk", 0x1000))
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::InconsistentCounts { .. }));
    }

    #[test]
    fn test_bo3_additive_from_asset_type() {
        let spec = builtin_titles()
            .iter()
            .find(|s| s.title == GameTitle::BlackOps3)
            .unwrap();
        let reader = MockMemoryBuilder::new()
            .zeroed(0x1000, 0xF8)
            .write_u8(0x1000 + 0x44, 6)
            .write_u16(0x1000 + 0x20, 12)
            .build();

        let decoded = StructDecoder::new(&reader, spec)
            .decode_anim(&descriptor("vm_reload_add", 0x1000))
            .unwrap();
        assert!(decoded.additive);
        assert!(decoded.viewmodel);
        assert_eq!(decoded.bone_type_size, 0);
        assert_eq!(decoded.rotation, KeyEncoding::HalfFloat);
    }
}
