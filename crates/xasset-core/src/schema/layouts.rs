//! Record layouts for every supported title.
//!
//! Offsets describe packed structures as they sit in the game's memory.
//! Pointer fields use [`FieldWidth::Ptr`](super::FieldWidth::Ptr) so the
//! same table works for 32-bit and 64-bit titles where the shapes agree.

use serde::Serialize;

use super::{Field, FieldWidth, f32_at, ptr_at, u8_at, u16_at, u32_at, u64_at};

/// Encoding of rotation/translation keys or bone rotation data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyEncoding {
    DivideBySize,
    MinSizeTable,
    HalfFloat,
}

/// How the display name is derived from the raw name string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStyle {
    AsIs,
    /// Last path component
    FileName,
    /// Last path component without extension
    FileStem,
}

impl NameStyle {
    pub fn apply(self, raw: &str) -> String {
        let file = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
        match self {
            NameStyle::AsIs => raw.to_string(),
            NameStyle::FileName => file.to_string(),
            NameStyle::FileStem => match file.find('.') {
                Some(0) | None => file.to_string(),
                Some(dot) => file[..dot].to_string(),
            },
        }
    }
}

/// Directory part of a raw asset path, empty when there is none
pub fn directory_of(raw: &str) -> String {
    match raw.rfind(['/', '\\']) {
        Some(pos) => raw[..pos].to_string(),
        None => String::new(),
    }
}

/// Bone counts per rotation/translation category, stored consecutively
#[derive(Debug, Clone, Copy)]
pub struct BoneCountFields {
    pub none_rotated: Field,
    pub two_d_rotated: Field,
    pub normal_rotated: Field,
    pub two_d_static_rotated: Field,
    pub normal_static_rotated: Field,
    pub normal_translated: Field,
    pub precise_translated: Field,
    pub static_translated: Field,
    pub none_translated: Field,
    pub total: Field,
}

const fn bone_counts(start: u64, width: FieldWidth) -> BoneCountFields {
    let step = match width {
        FieldWidth::U16 => 2,
        _ => 1,
    };
    BoneCountFields {
        none_rotated: Field::new(start, width),
        two_d_rotated: Field::new(start + step, width),
        normal_rotated: Field::new(start + step * 2, width),
        two_d_static_rotated: Field::new(start + step * 3, width),
        normal_static_rotated: Field::new(start + step * 4, width),
        normal_translated: Field::new(start + step * 5, width),
        precise_translated: Field::new(start + step * 6, width),
        static_translated: Field::new(start + step * 7, width),
        none_translated: Field::new(start + step * 8, width),
        total: Field::new(start + step * 9, width),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeltaPartsLayout {
    pub size: u64,
    pub translations: Field,
    pub rotations_2d: Field,
    pub rotations_3d: Option<Field>,
}

#[derive(Debug, Clone, Copy)]
pub struct AnimLayout {
    pub size: u64,
    pub name: Field,
    pub num_frames: Field,
    pub looping: Field,
    pub asset_type: Field,
    /// `asset_type` value marking an additive animation
    pub additive_type: Option<u64>,
    pub framerate: Field,
    pub frequency: Field,
    pub bone_counts: BoneCountFields,
    pub notification_count: Field,
    pub bone_ids: Field,
    pub data_bytes: Field,
    pub data_shorts: Field,
    pub data_ints: Field,
    pub random_data_shorts: Field,
    pub random_data_bytes: Field,
    pub random_data_ints: Field,
    pub long_indices: Field,
    pub notifications: Field,
    pub delta_parts: Field,
    pub delta: DeltaPartsLayout,
    pub bone_index_size: u32,
    pub rotation: KeyEncoding,
    pub translation: KeyEncoding,
    pub inline_indices: bool,
    pub viewmodel_prefixes: &'static [&'static str],
    pub name_style: NameStyle,
}

impl AnimLayout {
    /// Data pointers compared against the placeholder template
    pub fn placeholder_fields(&self) -> Vec<Field> {
        vec![
            self.bone_ids,
            self.data_bytes,
            self.data_shorts,
            self.data_ints,
            self.random_data_bytes,
            self.random_data_ints,
            self.random_data_shorts,
            self.notifications,
            self.delta_parts,
        ]
    }
}

/// Where a model keeps its lods
#[derive(Debug, Clone, Copy)]
pub enum LodStorage {
    /// Lod records embedded in the model record
    Inline { offset: u64 },
    /// Array of pointers to separately allocated lod records
    Pointers { offset: u64 },
}

#[derive(Debug, Clone, Copy)]
pub struct LodLayout {
    pub size: u64,
    pub distance: Field,
    pub max_distance: Option<Field>,
    pub num_surfaces: Field,
    pub surfaces_index: Field,
    /// Lod-local surface array; absent when surfaces are indexed into the model's array
    pub surfaces: Option<Field>,
    pub stream_key: Option<Field>,
    pub mesh_info: Option<Field>,
}

/// How per-surface material handles are laid out
#[derive(Debug, Clone, Copy)]
pub enum MaterialHandles {
    /// One flat pointer array walked across every lod's surfaces
    Flat,
    /// Per lod: skip `before`, read a pointer to the lod's handle array, skip `after`
    PerLod { before: u64, after: u64 },
}

#[derive(Debug, Clone, Copy)]
pub struct ModelLayout {
    pub size: u64,
    pub name: Field,
    pub num_bones: Field,
    pub num_root_bones: Field,
    pub num_cosmetic_bones: Option<Field>,
    pub num_lods: Field,
    pub max_lods: u32,
    pub bone_ids: Field,
    pub parents: Field,
    pub rotations: Field,
    pub translations: Field,
    pub part_classification: Field,
    pub base_matrices: Field,
    /// Model-level surface array, indexed by each lod's `surfaces_index`
    pub surfaces: Option<Field>,
    pub material_handles: Field,
    pub material_handle_layout: MaterialHandles,
    pub lods: LodStorage,
    pub lod: LodLayout,
    pub bone_index_size: u32,
    pub bone_parent_size: u32,
    pub rotation: KeyEncoding,
    pub streamed: bool,
    pub name_style: NameStyle,
}

impl ModelLayout {
    pub fn placeholder_fields(&self) -> Vec<Field> {
        let mut fields = vec![
            self.bone_ids,
            self.parents,
            self.rotations,
            self.translations,
            self.part_classification,
            self.base_matrices,
            self.material_handles,
            self.num_bones,
        ];
        match self.surfaces {
            Some(surfaces) => fields.push(surfaces),
            None => fields.push(self.num_lods),
        }
        fields
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SurfaceLayout {
    pub size: u64,
    pub vertex_count: Field,
    pub face_count: Field,
    pub faces: Field,
    pub vertices: Field,
    pub weight_counts: [Field; 4],
    pub weights: Option<Field>,
    pub vert_list_count: Option<Field>,
    pub rigid_weights: Option<Field>,
}

#[derive(Debug, Clone, Copy)]
pub struct MaterialLayout {
    pub name: Field,
    pub image_count: Field,
    pub image_table: Field,
    pub image_entry_size: u64,
    pub semantic_hash: Option<Field>,
    pub usage: Option<Field>,
    pub image_pointer: Field,
    /// Offset of the name pointer inside the referenced image record
    pub image_name: Field,
}

#[derive(Debug, Clone, Copy)]
pub struct MipLayout {
    pub offset: u64,
    pub stride: u64,
    pub count: u32,
    pub width: Field,
    pub height: Field,
    pub hash: Field,
    /// Cumulative size, stored shifted left by 4
    pub size: Field,
}

/// A 64-bit package key stored as two 32-bit halves
#[derive(Debug, Clone, Copy)]
pub struct SplitKey {
    pub lower: Field,
    pub upper: Field,
}

#[derive(Debug, Clone, Copy)]
pub struct ImageLayout {
    pub size: u64,
    pub name: Field,
    pub width: Field,
    pub height: Field,
    pub format: Option<Field>,
    pub streamed: Option<Field>,
    pub mips: Option<MipLayout>,
    pub loaded_data: Option<Field>,
    pub loaded_size: Option<Field>,
    /// Key of the `.iwi` file of a streamed image inside the package archives
    pub package_key: Option<SplitKey>,
    /// Source pixel formats replaced by their unsigned-normalized counterparts
    pub format_remap: &'static [(u32, u32)],
    pub name_style: NameStyle,
}

#[derive(Debug, Clone, Copy)]
pub struct SoundLayout {
    pub size: u64,
    pub name: Field,
    pub data: Field,
    pub data_size: Field,
    pub frame_rate: Option<Field>,
    pub bits_per_sample: Option<Field>,
    pub channels: Option<Field>,
    pub frame_count: Option<Field>,
    /// Payloads already carry a RIFF header
    pub headered: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct RawFileLayout {
    pub size: u64,
    pub name: Field,
    pub data_size: Field,
    pub data: Field,
}

/// Every record layout of one title
#[derive(Debug, Clone, Copy)]
pub struct TitleLayouts {
    pub anim: AnimLayout,
    pub model: ModelLayout,
    pub surface: SurfaceLayout,
    pub material: MaterialLayout,
    pub image: Option<ImageLayout>,
    pub sound: Option<SoundLayout>,
    pub rawfile: Option<RawFileLayout>,
}

const VIEWMODEL: &[&str] = &["viewmodel_"];

const MW_ANIM_DELTA: DeltaPartsLayout = DeltaPartsLayout {
    size: 0xC,
    translations: ptr_at(0),
    rotations_2d: ptr_at(4),
    rotations_3d: Some(ptr_at(8)),
};

// MW3 and MW2 share the anim record
const MW_ANIM: AnimLayout = AnimLayout {
    size: 0x58,
    name: ptr_at(0),
    num_frames: u16_at(0xE),
    looping: u8_at(0x10),
    asset_type: u8_at(0x1C),
    additive_type: None,
    framerate: f32_at(0x28),
    frequency: f32_at(0x2C),
    bone_counts: bone_counts(0x11, FieldWidth::U8),
    notification_count: u8_at(0x1B),
    bone_ids: ptr_at(0x30),
    data_bytes: ptr_at(0x34),
    data_shorts: ptr_at(0x38),
    data_ints: ptr_at(0x3C),
    random_data_shorts: ptr_at(0x40),
    random_data_bytes: ptr_at(0x44),
    random_data_ints: ptr_at(0x48),
    long_indices: ptr_at(0x4C),
    notifications: ptr_at(0x50),
    delta_parts: ptr_at(0x54),
    delta: MW_ANIM_DELTA,
    bone_index_size: 2,
    rotation: KeyEncoding::DivideBySize,
    translation: KeyEncoding::MinSizeTable,
    inline_indices: true,
    viewmodel_prefixes: VIEWMODEL,
    name_style: NameStyle::AsIs,
};

const MW_MATERIAL_HANDLES: MaterialHandles = MaterialHandles::Flat;

const fn mw_model(size: u64) -> ModelLayout {
    ModelLayout {
        size,
        name: ptr_at(0),
        num_bones: u8_at(4),
        num_root_bones: u8_at(5),
        num_cosmetic_bones: None,
        num_lods: u8_at(0xF1),
        max_lods: 4,
        bone_ids: ptr_at(0x24),
        parents: ptr_at(0x28),
        rotations: ptr_at(0x2C),
        translations: ptr_at(0x30),
        part_classification: ptr_at(0x34),
        base_matrices: ptr_at(0x38),
        surfaces: None,
        material_handles: ptr_at(0x3C),
        material_handle_layout: MW_MATERIAL_HANDLES,
        lods: LodStorage::Inline { offset: 0x40 },
        lod: LodLayout {
            size: 0x2C,
            distance: f32_at(0),
            max_distance: None,
            num_surfaces: u16_at(4),
            surfaces_index: u16_at(6),
            surfaces: Some(ptr_at(0x24)),
            stream_key: None,
            mesh_info: None,
        },
        bone_index_size: 2,
        bone_parent_size: 1,
        rotation: KeyEncoding::DivideBySize,
        streamed: false,
        name_style: NameStyle::AsIs,
    }
}

const fn mw_material(image_count: u64, image_table: u64, image_name: u64) -> MaterialLayout {
    MaterialLayout {
        name: ptr_at(0),
        image_count: u8_at(image_count),
        image_table: ptr_at(image_table),
        image_entry_size: 12,
        semantic_hash: Some(u32_at(0)),
        usage: Some(u8_at(7)),
        image_pointer: ptr_at(8),
        image_name: ptr_at(image_name),
    }
}

const MW_SOUND: SoundLayout = SoundLayout {
    size: 0x2C,
    name: ptr_at(0),
    data: ptr_at(8),
    data_size: u32_at(0xC),
    frame_rate: Some(u32_at(0x10)),
    bits_per_sample: Some(u32_at(0x14)),
    channels: Some(u32_at(0x18)),
    frame_count: Some(u32_at(0x1C)),
    headered: false,
};

pub const MW3_LAYOUTS: TitleLayouts = TitleLayouts {
    anim: MW_ANIM,
    model: mw_model(0x134),
    surface: SurfaceLayout {
        size: 0x44,
        vertex_count: u16_at(2),
        face_count: u16_at(4),
        faces: ptr_at(0x10),
        vertices: ptr_at(0x20),
        weight_counts: [u16_at(0x14), u16_at(0x16), u16_at(0x18), u16_at(0x1A)],
        weights: Some(ptr_at(0x1C)),
        vert_list_count: Some(u32_at(0x24)),
        rigid_weights: Some(ptr_at(0x28)),
    },
    material: mw_material(0x4E, 0x58, 0x1C),
    image: None,
    sound: Some(MW_SOUND),
    rawfile: None,
};

pub const MW2_LAYOUTS: TitleLayouts = TitleLayouts {
    anim: MW_ANIM,
    model: mw_model(0x130),
    surface: SurfaceLayout {
        size: 0x40,
        vertex_count: u16_at(2),
        face_count: u16_at(4),
        faces: ptr_at(0xC),
        vertices: ptr_at(0x1C),
        weight_counts: [u16_at(0x10), u16_at(0x12), u16_at(0x14), u16_at(0x16)],
        weights: Some(ptr_at(0x18)),
        vert_list_count: Some(u32_at(0x20)),
        rigid_weights: Some(ptr_at(0x24)),
    },
    material: mw_material(0x48, 0x54, 0x1C),
    image: None,
    sound: Some(MW_SOUND),
    rawfile: None,
};

pub const WAW_LAYOUTS: TitleLayouts = TitleLayouts {
    anim: AnimLayout {
        asset_type: u8_at(0x1D),
        bone_counts: bone_counts(0x12, FieldWidth::U8),
        notification_count: u8_at(0x1C),
        delta: DeltaPartsLayout {
            size: 8,
            translations: ptr_at(0),
            rotations_2d: ptr_at(4),
            rotations_3d: None,
        },
        ..MW_ANIM
    },
    model: ModelLayout {
        size: 0xE4,
        num_lods: u16_at(0xC4),
        bone_ids: ptr_at(8),
        parents: ptr_at(0xC),
        rotations: ptr_at(0x10),
        translations: ptr_at(0x14),
        part_classification: ptr_at(0x18),
        base_matrices: ptr_at(0x1C),
        surfaces: Some(ptr_at(0x20)),
        material_handles: ptr_at(0x24),
        lods: LodStorage::Inline { offset: 0x28 },
        lod: LodLayout {
            size: 0x1C,
            distance: f32_at(0),
            max_distance: None,
            num_surfaces: u16_at(4),
            surfaces_index: u16_at(6),
            surfaces: None,
            stream_key: None,
            mesh_info: None,
        },
        ..mw_model(0xE4)
    },
    surface: SurfaceLayout {
        size: 0x40,
        vertex_count: u16_at(2),
        face_count: u16_at(4),
        faces: ptr_at(0xC),
        vertices: ptr_at(0x1C),
        weight_counts: [u16_at(0x10), u16_at(0x12), u16_at(0x14), u16_at(0x16)],
        weights: Some(ptr_at(0x18)),
        vert_list_count: Some(u32_at(0x24)),
        rigid_weights: Some(ptr_at(0x28)),
    },
    material: MaterialLayout {
        image_entry_size: 16,
        image_pointer: ptr_at(0xC),
        ..mw_material(0x5B, 0x64, 0x20)
    },
    image: None,
    sound: Some(SoundLayout {
        size: 0xC,
        name: ptr_at(0),
        data: ptr_at(4),
        data_size: u32_at(8),
        frame_rate: None,
        bits_per_sample: None,
        channels: None,
        frame_count: None,
        headered: true,
    }),
    rawfile: None,
};

pub const BO2_LAYOUTS: TitleLayouts = TitleLayouts {
    anim: AnimLayout {
        size: 0x68,
        asset_type: u8_at(0x23),
        framerate: f32_at(0x30),
        frequency: f32_at(0x34),
        bone_counts: bone_counts(0x18, FieldWidth::U8),
        notification_count: u8_at(0x22),
        bone_ids: ptr_at(0x40),
        data_bytes: ptr_at(0x44),
        data_shorts: ptr_at(0x48),
        data_ints: ptr_at(0x4C),
        random_data_shorts: ptr_at(0x50),
        random_data_bytes: ptr_at(0x54),
        random_data_ints: ptr_at(0x58),
        long_indices: ptr_at(0x5C),
        notifications: ptr_at(0x60),
        delta_parts: ptr_at(0x64),
        ..MW_ANIM
    },
    model: ModelLayout {
        size: 0xF8,
        name_style: NameStyle::FileName,
        ..WAW_LAYOUTS.model
    },
    surface: SurfaceLayout {
        size: 0x50,
        vertex_count: u16_at(4),
        face_count: u16_at(6),
        faces: ptr_at(0xC),
        vertices: ptr_at(0x20),
        weight_counts: [u16_at(0x10), u16_at(0x12), u16_at(0x14), u16_at(0x16)],
        weights: Some(ptr_at(0x18)),
        vert_list_count: Some(u8_at(1)),
        rigid_weights: Some(ptr_at(0x28)),
    },
    material: MaterialLayout {
        name: ptr_at(0),
        image_count: u8_at(0x54),
        image_table: ptr_at(0x60),
        image_entry_size: 0x10,
        semantic_hash: Some(u32_at(0)),
        usage: None,
        image_pointer: ptr_at(0xC),
        image_name: ptr_at(0x48),
    },
    // Only streamed images have pixels outside the fast files
    image: Some(ImageLayout {
        size: 0x50,
        name: ptr_at(0x48),
        width: u16_at(0x14),
        height: u16_at(0x16),
        format: None,
        streamed: Some(u8_at(0x1B)),
        mips: None,
        loaded_data: None,
        loaded_size: None,
        package_key: Some(SplitKey {
            lower: u32_at(0x28),
            upper: u32_at(0x4C),
        }),
        format_remap: &[],
        name_style: NameStyle::FileName,
    }),
    sound: None,
    rawfile: Some(RawFileLayout {
        size: 0xC,
        name: ptr_at(0),
        data_size: u32_at(4),
        data: ptr_at(8),
    }),
};

pub const GHOSTS_LAYOUTS: TitleLayouts = TitleLayouts {
    anim: AnimLayout {
        size: 0x88,
        name: ptr_at(0),
        num_frames: u16_at(0x12),
        looping: u8_at(0x14),
        asset_type: u8_at(0x20),
        additive_type: None,
        framerate: f32_at(0x2C),
        frequency: f32_at(0x30),
        bone_counts: bone_counts(0x15, FieldWidth::U8),
        notification_count: u8_at(0x1F),
        bone_ids: ptr_at(0x38),
        data_bytes: ptr_at(0x40),
        data_shorts: ptr_at(0x48),
        data_ints: ptr_at(0x50),
        random_data_shorts: ptr_at(0x58),
        random_data_bytes: ptr_at(0x60),
        random_data_ints: ptr_at(0x68),
        long_indices: ptr_at(0x70),
        notifications: ptr_at(0x78),
        delta_parts: ptr_at(0x80),
        delta: DeltaPartsLayout {
            size: 0x18,
            translations: ptr_at(0),
            rotations_2d: ptr_at(8),
            rotations_3d: Some(ptr_at(0x10)),
        },
        bone_index_size: 4,
        rotation: KeyEncoding::DivideBySize,
        translation: KeyEncoding::MinSizeTable,
        inline_indices: true,
        viewmodel_prefixes: VIEWMODEL,
        name_style: NameStyle::AsIs,
    },
    model: ModelLayout {
        size: 0x258,
        name: ptr_at(0),
        num_bones: u8_at(8),
        num_root_bones: u8_at(9),
        num_cosmetic_bones: None,
        num_lods: u8_at(0x1F1),
        max_lods: 6,
        bone_ids: ptr_at(0x30),
        parents: ptr_at(0x38),
        rotations: ptr_at(0x40),
        translations: ptr_at(0x48),
        part_classification: ptr_at(0x50),
        base_matrices: ptr_at(0x58),
        surfaces: None,
        material_handles: ptr_at(0x68),
        material_handle_layout: MW_MATERIAL_HANDLES,
        lods: LodStorage::Inline { offset: 0x70 },
        lod: LodLayout {
            size: 0x40,
            distance: f32_at(0),
            max_distance: None,
            num_surfaces: u16_at(4),
            surfaces_index: u16_at(6),
            surfaces: Some(ptr_at(0x30)),
            stream_key: None,
            mesh_info: None,
        },
        bone_index_size: 4,
        bone_parent_size: 1,
        rotation: KeyEncoding::DivideBySize,
        streamed: false,
        name_style: NameStyle::FileName,
    },
    surface: SurfaceLayout {
        size: 0xE8,
        vertex_count: u16_at(2),
        face_count: u16_at(4),
        faces: ptr_at(0x20),
        vertices: ptr_at(0x18),
        weight_counts: [u16_at(8), u16_at(0xA), u16_at(0xC), u16_at(0xE)],
        weights: Some(ptr_at(0x48)),
        vert_list_count: Some(u8_at(6)),
        rigid_weights: Some(ptr_at(0x40)),
    },
    material: MaterialLayout {
        name: ptr_at(0),
        image_count: u8_at(0x1C4),
        image_table: ptr_at(0x1D8),
        image_entry_size: 0x10,
        semantic_hash: None,
        usage: Some(u8_at(7)),
        image_pointer: ptr_at(8),
        image_name: ptr_at(0x60),
    },
    // Pixels live in image packages; the pool is listed but not exported
    image: Some(ImageLayout {
        size: 0x68,
        name: ptr_at(0x60),
        width: u16_at(0x40),
        height: u16_at(0x42),
        format: Some(u8_at(0x18)),
        streamed: Some(u8_at(0x35)),
        mips: None,
        loaded_data: None,
        loaded_size: None,
        package_key: None,
        format_remap: &[],
        name_style: NameStyle::FileName,
    }),
    sound: Some(SoundLayout {
        size: 0x38,
        name: ptr_at(0),
        data: ptr_at(8),
        data_size: u32_at(0x1C),
        frame_rate: Some(u32_at(0x18)),
        bits_per_sample: None,
        channels: Some(u8_at(0x28)),
        frame_count: Some(u32_at(0x20)),
        headered: false,
    }),
    rawfile: None,
};

pub const BO3_LAYOUTS: TitleLayouts = TitleLayouts {
    anim: AnimLayout {
        size: 0xF8,
        name: ptr_at(0),
        num_frames: u16_at(0x20),
        looping: u8_at(0x24),
        asset_type: u8_at(0x44),
        additive_type: Some(6),
        framerate: f32_at(0x50),
        frequency: f32_at(0x54),
        bone_counts: bone_counts(0x30, FieldWidth::U16),
        notification_count: u32_at(0xC8),
        bone_ids: ptr_at(0x68),
        data_bytes: ptr_at(0x70),
        data_shorts: ptr_at(0x78),
        data_ints: ptr_at(0x80),
        random_data_shorts: ptr_at(0x88),
        random_data_bytes: ptr_at(0x90),
        random_data_ints: ptr_at(0x98),
        long_indices: ptr_at(0xA0),
        notifications: ptr_at(0xC0),
        delta_parts: ptr_at(0xF0),
        delta: DeltaPartsLayout {
            size: 0x18,
            translations: ptr_at(0),
            rotations_2d: ptr_at(8),
            rotations_3d: Some(ptr_at(0x10)),
        },
        bone_index_size: 4,
        rotation: KeyEncoding::HalfFloat,
        translation: KeyEncoding::MinSizeTable,
        inline_indices: false,
        viewmodel_prefixes: &["viewmodel_", "vm_"],
        name_style: NameStyle::AsIs,
    },
    model: ModelLayout {
        size: 0x188,
        name: ptr_at(0),
        num_bones: u8_at(8),
        num_root_bones: u8_at(9),
        num_cosmetic_bones: Some(u16_at(0xA)),
        num_lods: u8_at(0x40),
        max_lods: 8,
        bone_ids: ptr_at(0x10),
        parents: ptr_at(0x18),
        rotations: ptr_at(0x20),
        translations: ptr_at(0x28),
        part_classification: ptr_at(0x30),
        base_matrices: ptr_at(0x38),
        surfaces: None,
        material_handles: ptr_at(0xC8),
        material_handle_layout: MaterialHandles::PerLod {
            before: 8,
            after: 16,
        },
        lods: LodStorage::Pointers { offset: 0x88 },
        lod: LodLayout {
            size: 0x78,
            distance: f32_at(0x44),
            max_distance: Some(f32_at(0x40)),
            num_surfaces: u8_at(0x3C),
            surfaces_index: u8_at(0x3D),
            surfaces: Some(ptr_at(0x68)),
            stream_key: Some(u64_at(0x48)),
            mesh_info: Some(ptr_at(0x70)),
        },
        bone_index_size: 4,
        bone_parent_size: 1,
        rotation: KeyEncoding::HalfFloat,
        streamed: true,
        name_style: NameStyle::FileName,
    },
    surface: SurfaceLayout {
        size: 0x60,
        vertex_count: u16_at(4),
        face_count: u16_at(6),
        faces: u32_at(0xC),
        vertices: u32_at(8),
        weight_counts: [u8_at(0), u8_at(1), u8_at(2), u8_at(3)],
        weights: None,
        vert_list_count: None,
        rigid_weights: None,
    },
    material: MaterialLayout {
        name: ptr_at(0),
        image_count: u8_at(0x270),
        image_table: ptr_at(0x280),
        image_entry_size: 0x20,
        semantic_hash: Some(u32_at(8)),
        usage: None,
        image_pointer: ptr_at(0),
        image_name: ptr_at(0xF8),
    },
    image: Some(ImageLayout {
        size: 0x108,
        name: ptr_at(0xF8),
        width: u16_at(0xC0),
        height: u16_at(0xC2),
        format: Some(u8_at(0xF0)),
        streamed: None,
        mips: Some(MipLayout {
            offset: 4,
            stride: 0x28,
            count: 4,
            width: u16_at(0),
            height: u16_at(2),
            hash: u64_at(4),
            size: u32_at(0xC),
        }),
        loaded_data: Some(ptr_at(0xD8)),
        loaded_size: Some(u32_at(0xE8)),
        package_key: None,
        format_remap: &[(72, 71), (75, 74), (78, 77), (99, 98)],
        name_style: NameStyle::FileName,
    }),
    sound: None,
    rawfile: Some(RawFileLayout {
        size: 0x18,
        name: ptr_at(0),
        data_size: u64_at(8),
        data: ptr_at(0x10),
    }),
};
