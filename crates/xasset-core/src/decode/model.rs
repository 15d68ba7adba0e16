use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::pool::AssetDescriptor;
use crate::schema::{Field, FieldWidth, LodStorage, MaterialHandles, Record};

use super::{MAX_NESTED_COUNT, StructDecoder, XMaterial, XModel, XModelLod, XModelSubmesh};

/// Walks per-surface material handles across every lod of a model
struct HandleCursor {
    address: u64,
    layout: MaterialHandles,
}

impl<R: ReadMemory + ?Sized> StructDecoder<'_, R> {
    pub fn decode_model(&self, descriptor: &AssetDescriptor) -> Result<XModel> {
        let layout = &self.layouts().model;
        let record = self.record(descriptor.source_pointer, layout.size)?;
        let name = descriptor.name.clone();

        let lod_count = record.get_u32(layout.num_lods)?;
        if lod_count > layout.max_lods {
            return Err(Error::InconsistentCounts {
                asset: name,
                message: format!("{} lods, at most {}", lod_count, layout.max_lods),
            });
        }

        let mut handles = HandleCursor {
            address: record.get(layout.material_handles)?,
            layout: layout.material_handle_layout,
        };

        let mut lods = Vec::with_capacity(lod_count as usize);
        for index in 0..lod_count as u64 {
            let address = self.lod_address(&record, index)?;
            trace!("Reading lod {} of {} at {:#x}", index, name, address);
            let lod = self.record(address, layout.lod.size)?;
            lods.push(self.decode_lod(&name, &record, &lod, &mut handles)?);
        }

        Ok(XModel {
            rotation: layout.rotation,
            streamed: layout.streamed,
            bone_count: record.get_u32(layout.num_bones)?,
            root_bone_count: record.get_u32(layout.num_root_bones)?,
            cosmetic_bone_count: record.get_opt(layout.num_cosmetic_bones)? as u32,
            bone_ids: record.get(layout.bone_ids)?,
            bone_index_size: layout.bone_index_size,
            parents: record.get(layout.parents)?,
            bone_parent_size: layout.bone_parent_size,
            rotations: record.get(layout.rotations)?,
            translations: record.get(layout.translations)?,
            base_matrices: record.get(layout.base_matrices)?,
            lods,
            name,
        })
    }

    fn lod_address(&self, model: &Record, index: u64) -> Result<u64> {
        let layout = &self.layouts().model;
        match layout.lods {
            LodStorage::Inline { offset } => Ok(model.address() + offset + index * layout.lod.size),
            LodStorage::Pointers { offset } => {
                let slot = offset + index * self.pointer().bytes() as u64;
                let pointer = model.get(Field::new(slot, FieldWidth::Ptr))?;
                if pointer == 0 {
                    return Err(Error::decode(format!("{:#x}", model.address()), "null lod pointer"));
                }
                Ok(pointer)
            }
        }
    }

    fn decode_lod(
        &self,
        name: &str,
        model: &Record,
        lod: &Record,
        handles: &mut HandleCursor,
    ) -> Result<XModelLod> {
        let layout = &self.layouts().model;
        let surface = &self.layouts().surface;

        let count = lod.get_u32(layout.lod.num_surfaces)?;
        if count > MAX_NESTED_COUNT {
            return Err(Error::InconsistentCounts {
                asset: name.to_string(),
                message: format!("{} surfaces in one lod", count),
            });
        }

        let surfaces = match (layout.surfaces, layout.lod.surfaces) {
            (Some(model_surfaces), _) => {
                let index = lod.get(layout.lod.surfaces_index)?;
                model.get(model_surfaces)? + index * surface.size
            }
            (None, Some(lod_surfaces)) => lod.get(lod_surfaces)?,
            (None, None) => 0,
        };
        if surfaces == 0 && count > 0 {
            return Err(Error::decode(name, "surface array is null"));
        }

        let material_pointers = self.material_pointers(handles, count)?;
        let mut submeshes = Vec::with_capacity(count as usize);
        let mut materials: Vec<XMaterial> = Vec::with_capacity(count as usize);

        for i in 0..count as u64 {
            let record = self.record(surfaces + i * surface.size, surface.size)?;
            let mut submesh = self.decode_submesh(name, &record)?;

            let material = material_pointers[i as usize];
            if material != 0 {
                match self.decode_material(material) {
                    Ok(decoded) => {
                        submesh.material_index = materials.len() as i32;
                        materials.push(decoded);
                    }
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => warn!("Material {:#x} of {} skipped: {}", material, name, e),
                }
            }
            submeshes.push(submesh);
        }

        Ok(XModelLod {
            distance: lod.get_f32(layout.lod.distance)?,
            max_distance: f32::from_bits(lod.get_opt(layout.lod.max_distance)? as u32),
            stream_key: lod.get_opt(layout.lod.stream_key)?,
            mesh_info: lod.get_opt(layout.lod.mesh_info)?,
            submeshes,
            materials,
        })
    }

    fn decode_submesh(&self, name: &str, record: &Record) -> Result<XModelSubmesh> {
        let layout = &self.layouts().surface;
        let vertex_count = record.get_u32(layout.vertex_count)?;

        let mut weight_counts = [0u32; 4];
        for (slot, field) in weight_counts.iter_mut().zip(layout.weight_counts) {
            *slot = record.get_u32(field)?;
        }
        let weighted: u64 = weight_counts.iter().map(|&c| c as u64).sum();
        if weighted > vertex_count as u64 {
            return Err(Error::InconsistentCounts {
                asset: name.to_string(),
                message: format!(
                    "{} weighted vertices in a surface of {}",
                    weighted, vertex_count
                ),
            });
        }

        Ok(XModelSubmesh {
            vertex_count,
            face_count: record.get_u32(layout.face_count)?,
            faces: record.get(layout.faces)?,
            vertices: record.get(layout.vertices)?,
            weight_counts,
            weights: record.get_opt(layout.weights)?,
            vert_list_count: record.get_opt(layout.vert_list_count)? as u32,
            rigid_weights: record.get_opt(layout.rigid_weights)?,
            material_index: -1,
        })
    }

    /// Material pointers of the next `count` surfaces, 0 where a surface has none
    fn material_pointers(&self, handles: &mut HandleCursor, count: u32) -> Result<Vec<u64>> {
        if handles.address == 0 {
            return Ok(vec![0; count as usize]);
        }
        let step = self.pointer().bytes() as u64;

        match handles.layout {
            MaterialHandles::Flat => (0..count)
                .map(|_| {
                    let pointer = self.reader.read_ptr(handles.address, self.pointer());
                    handles.address += step;
                    pointer
                })
                .collect(),
            MaterialHandles::PerLod { before, after } => {
                handles.address += before;
                let array = self.reader.read_ptr(handles.address, self.pointer())?;
                handles.address += after;
                if array == 0 {
                    return Ok(vec![0; count as usize]);
                }
                (0..count as u64)
                    .map(|i| self.reader.read_ptr(array + i * step, self.pointer()))
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::decode::StructDecoder;
    use crate::error::Error;
    use crate::memory::{MockMemoryBuilder, MockMemoryReader};
    use crate::pool::{AssetDescriptor, AssetDetail, AssetStatus};
    use crate::title::{GameTitle, TitleSpec, builtin_titles};

    fn spec(title: GameTitle) -> &'static TitleSpec {
        builtin_titles().iter().find(|s| s.title == title).unwrap()
    }

    fn descriptor(pointer: u64) -> AssetDescriptor {
        AssetDescriptor {
            name: "vehicle_tank".to_string(),
            source_pointer: pointer,
            pool_index: 0,
            status: AssetStatus::Loaded,
            size_hint: -1,
            is_file_backed: false,
            detail: AssetDetail::Model {
                bone_count: 2,
                cosmetic_bone_count: 0,
                lod_count: 1,
            },
        }
    }

    const MODEL: u64 = 0x1000;
    const SURFACES: u64 = 0x2000;
    const HANDLES: u64 = 0x2800;

    /// MW3 model with one lod of two surfaces; the first surface has a material
    fn mw3_model(weights: u16) -> MockMemoryReader {
        let lod = MODEL + 0x40;
        MockMemoryBuilder::new()
            .zeroed(MODEL, 0x134)
            .write_u8(MODEL + 4, 2)
            .write_u8(MODEL + 5, 1)
            .write_u8(MODEL + 0xF1, 1)
            .write_u32(MODEL + 0x24, 0x7000)
            .write_u32(MODEL + 0x3C, HANDLES as u32)
            .write_f32(lod, 250.0)
            .write_u16(lod + 4, 2)
            .write_u32(lod + 0x24, SURFACES as u32)
            .zeroed(SURFACES, 0x44 * 2)
            .write_u16(SURFACES + 2, 100)
            .write_u16(SURFACES + 4, 50)
            .write_u16(SURFACES + 0x14, weights)
            .write_u32(SURFACES + 0x20, 0x9000)
            .write_u16(SURFACES + 0x44 + 2, 8)
            .zeroed(HANDLES, 8)
            .write_u32(HANDLES, 0x3000)
            .zeroed(0x3000, 0x60)
            .write_u32(0x3000, 0x3400)
            .write_cstring(0x3400, "mtl_tank_body")
            .build()
    }

    #[test]
    fn test_decode_mw3_model() {
        let reader = mw3_model(60);
        let model = StructDecoder::new(&reader, spec(GameTitle::ModernWarfare3))
            .decode_model(&descriptor(MODEL))
            .unwrap();

        assert_eq!(model.bone_count, 2);
        assert_eq!(model.root_bone_count, 1);
        assert_eq!(model.bone_ids, 0x7000);
        assert_eq!(model.bone_index_size, 2);
        assert_eq!(model.lods.len(), 1);

        let lod = &model.lods[0];
        assert_eq!(lod.distance, 250.0);
        assert_eq!(lod.submeshes.len(), 2);
        assert_eq!(lod.submeshes[0].vertex_count, 100);
        assert_eq!(lod.submeshes[0].face_count, 50);
        assert_eq!(lod.submeshes[0].vertices, 0x9000);
        assert_eq!(lod.submeshes[0].material_index, 0);
        assert_eq!(lod.submeshes[1].material_index, -1);
        assert_eq!(lod.materials.len(), 1);
        assert_eq!(lod.materials[0].name, "mtl_tank_body");
    }

    #[test]
    fn test_weight_counts_over_vertex_count_are_inconsistent() {
        let reader = mw3_model(101);
        let err = StructDecoder::new(&reader, spec(GameTitle::ModernWarfare3))
            .decode_model(&descriptor(MODEL))
            .unwrap_err();
        assert!(matches!(err, Error::InconsistentCounts { .. }));
    }

    #[test]
    fn test_too_many_lods_are_inconsistent() {
        let reader = MockMemoryBuilder::new()
            .zeroed(MODEL, 0x134)
            .write_u8(MODEL + 0xF1, 9)
            .build();
        let err = StructDecoder::new(&reader, spec(GameTitle::ModernWarfare3))
            .decode_model(&descriptor(MODEL))
            .unwrap_err();
        assert!(matches!(err, Error::InconsistentCounts { .. }));
    }

    #[test]
    fn test_waw_surfaces_are_indexed_into_model_array() {
        let lod1 = MODEL + 0x28 + 0x1C;
        let reader = MockMemoryBuilder::new()
            .zeroed(MODEL, 0xE4)
            .write_u16(MODEL + 0xC4, 2)
            .write_u32(MODEL + 0x20, SURFACES as u32)
            .write_u16(MODEL + 0x28 + 4, 1)
            .write_u16(lod1 + 4, 1)
            .write_u16(lod1 + 6, 1)
            .zeroed(SURFACES, 0x40 * 2)
            .write_u16(SURFACES + 2, 30)
            .write_u16(SURFACES + 0x40 + 2, 10)
            .build();

        let model = StructDecoder::new(&reader, spec(GameTitle::WorldAtWar))
            .decode_model(&descriptor(MODEL))
            .unwrap();
        assert_eq!(model.lods.len(), 2);
        assert_eq!(model.lods[0].submeshes[0].vertex_count, 30);
        assert_eq!(model.lods[1].submeshes[0].vertex_count, 10);
    }

    #[test]
    fn test_bo3_lod_pointers_and_per_lod_materials() {
        let lod = 0x1_0000;
        let material_array = 0x1_1000;
        let reader = MockMemoryBuilder::new()
            .zeroed(MODEL, 0x188)
            .write_u8(MODEL + 0x40, 1)
            .write_u64(MODEL + 0x88, lod)
            .write_u64(MODEL + 0xC8, HANDLES)
            .zeroed(HANDLES, 0x18)
            .write_u64(HANDLES + 8, material_array)
            .zeroed(material_array, 8)
            .zeroed(lod, 0x78)
            .write_f32(lod + 0x40, 100.0)
            .write_f32(lod + 0x44, 500.0)
            .write_u8(lod + 0x3C, 1)
            .write_u64(lod + 0x48, 0xDEAD_BEEF)
            .write_u64(lod + 0x68, SURFACES)
            .write_u64(lod + 0x70, 0x4000)
            .zeroed(SURFACES, 0x60)
            .write_u16(SURFACES + 4, 64)
            .write_u8(SURFACES, 64)
            .build();

        let model = StructDecoder::new(&reader, spec(GameTitle::BlackOps3))
            .decode_model(&descriptor(MODEL))
            .unwrap();
        assert!(model.streamed);
        let lod = &model.lods[0];
        assert_eq!(lod.distance, 500.0);
        assert_eq!(lod.max_distance, 100.0);
        assert_eq!(lod.stream_key, 0xDEAD_BEEF);
        assert_eq!(lod.mesh_info, 0x4000);
        assert_eq!(lod.submeshes[0].vertex_count, 64);
        assert_eq!(lod.submeshes[0].weight_counts, [64, 0, 0, 0]);
        assert!(lod.materials.is_empty());
    }
}
