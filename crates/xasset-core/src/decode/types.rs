//! Normalized asset representations shared by every title

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::schema::KeyEncoding;

/// How a sound payload relates to a standard container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum SoundCodec {
    WavWithHeader,
    WavNeedsHeader,
    FlacWithHeader,
    FlacNeedsHeader,
}

impl SoundCodec {
    pub fn needs_header(self) -> bool {
        matches!(self, SoundCodec::WavNeedsHeader | SoundCodec::FlacNeedsHeader)
    }

    pub fn extension(self) -> &'static str {
        match self {
            SoundCodec::WavWithHeader | SoundCodec::WavNeedsHeader => "wav",
            SoundCodec::FlacWithHeader | SoundCodec::FlacNeedsHeader => "flac",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ImageUsage {
    #[default]
    Unknown,
    Diffuse,
    Normal,
    Specular,
    Gloss,
}

/// Usage from a texture file name suffix, for images decoded without a material
pub fn infer_usage_from_name(name: &str) -> ImageUsage {
    let stem = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .split('.')
        .next()
        .unwrap_or(name)
        .to_ascii_lowercase();

    const NORMAL: &[&str] = &["_n", "_nml", "_n2", "_n3", "_nrm", "_normal"];
    const SPECULAR: &[&str] = &["_s", "_spec", "_cs"];
    const GLOSS: &[&str] = &["_g", "_gloss"];
    const DIFFUSE: &[&str] = &["_c", "_col", "_d", "_diffuse"];

    let matches = |suffixes: &[&str]| suffixes.iter().any(|s| stem.ends_with(s));
    if matches(NORMAL) {
        ImageUsage::Normal
    } else if matches(SPECULAR) {
        ImageUsage::Specular
    } else if matches(GLOSS) {
        ImageUsage::Gloss
    } else if matches(DIFFUSE) {
        ImageUsage::Diffuse
    } else {
        ImageUsage::Unknown
    }
}

/// Bone counts per rotation/translation category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnimBoneCounts {
    pub none_rotated: u32,
    pub two_d_rotated: u32,
    pub normal_rotated: u32,
    pub two_d_static_rotated: u32,
    pub normal_static_rotated: u32,
    pub normal_translated: u32,
    pub precise_translated: u32,
    pub static_translated: u32,
    pub none_translated: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnimDeltaParts {
    pub translations: u64,
    pub rotations_2d: u64,
    pub rotations_3d: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XAnim {
    pub name: String,
    pub framerate: f32,
    pub frame_count: u32,
    pub looping: bool,
    pub additive: bool,
    pub viewmodel: bool,
    pub inline_indices: bool,
    pub bone_ids: u64,
    pub bone_index_size: u32,
    /// Width of inline frame indices, 0 when the title has none
    pub bone_type_size: u32,
    pub rotation: KeyEncoding,
    pub translation: KeyEncoding,
    pub data_bytes: u64,
    pub data_shorts: u64,
    pub data_ints: u64,
    pub random_data_bytes: u64,
    pub random_data_shorts: u64,
    pub random_data_ints: u64,
    pub long_indices: u64,
    pub notifications: u64,
    pub notification_count: u32,
    pub delta: AnimDeltaParts,
    pub bone_counts: AnimBoneCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XMaterialImage {
    pub usage: ImageUsage,
    pub pointer: u64,
    pub semantic_hash: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XMaterial {
    pub name: String,
    pub images: Vec<XMaterialImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XModelSubmesh {
    pub vertex_count: u32,
    pub face_count: u32,
    pub faces: u64,
    pub vertices: u64,
    pub weight_counts: [u32; 4],
    pub weights: u64,
    pub vert_list_count: u32,
    pub rigid_weights: u64,
    /// Index into the owning lod's materials, -1 when the surface has none
    pub material_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XModelLod {
    pub distance: f32,
    pub max_distance: f32,
    /// Non-zero for lods whose geometry lives in a package
    pub stream_key: u64,
    pub mesh_info: u64,
    pub submeshes: Vec<XModelSubmesh>,
    pub materials: Vec<XMaterial>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XModel {
    pub name: String,
    pub rotation: KeyEncoding,
    pub streamed: bool,
    pub bone_count: u32,
    pub root_bone_count: u32,
    pub cosmetic_bone_count: u32,
    pub bone_ids: u64,
    pub bone_index_size: u32,
    pub parents: u64,
    pub bone_parent_size: u32,
    pub rotations: u64,
    pub translations: u64,
    pub base_matrices: u64,
    pub lods: Vec<XModelLod>,
}

/// Where the pixels of an image come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ImageSource {
    /// Already resident in the source address space
    Resident { pointer: u64, size: u64 },
    /// Streamed mip stored in a package under a content hash
    Streamed { hash: u64, size: u64 },
    /// Standalone file looked up by image name (`.iwi` in an IWD)
    Package { name: String },
    /// `.iwi` file stored in a package under a 64-bit key
    PackagedIwi { key: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XImageSpec {
    pub name: String,
    pub usage: ImageUsage,
    pub source_pointer: u64,
    pub width: u32,
    pub height: u32,
    pub format: u32,
    pub source: ImageSource,
}

impl XImageSpec {
    pub fn streamed(&self) -> bool {
        matches!(
            self.source,
            ImageSource::Streamed { .. } | ImageSource::PackagedIwi { .. }
        )
    }
}

/// Where the samples of a sound come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SoundSource {
    Memory { pointer: u64 },
    /// Byte offset inside a sound bank file
    File { offset: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XSoundSpec {
    pub name: String,
    pub source: SoundSource,
    pub size: u64,
    pub frame_rate: u32,
    pub frame_count: u32,
    pub channels: u32,
    pub bits_per_sample: u32,
    pub codec: SoundCodec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XRawFile {
    pub name: String,
    pub path: String,
    pub data_pointer: u64,
    pub size: u64,
}
