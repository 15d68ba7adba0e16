use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::decode::SoundCodec;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AssetKind {
    #[strum(serialize = "anim")]
    Animation,
    Model,
    Image,
    Sound,
    #[strum(serialize = "rawfile")]
    RawFile,
    Material,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum AssetStatus {
    Loaded,
    Placeholder,
}

/// Kind-specific summary captured during the walk
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetDetail {
    Animation {
        framerate: f32,
        frame_count: u32,
        bone_count: u32,
        streamed: bool,
    },
    Model {
        bone_count: u32,
        cosmetic_bone_count: u32,
        lod_count: u32,
    },
    Image {
        width: u32,
        height: u32,
        format: u32,
        streamed: bool,
    },
    Sound {
        frame_rate: u32,
        frame_count: u32,
        channels: u32,
        length_ms: u32,
        package_index: u32,
        localized: bool,
        codec: SoundCodec,
        path: String,
    },
    RawFile {
        path: String,
        size: u64,
        data_pointer: u64,
    },
    Material {
        image_count: u32,
    },
}

impl AssetDetail {
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetDetail::Animation { .. } => AssetKind::Animation,
            AssetDetail::Model { .. } => AssetKind::Model,
            AssetDetail::Image { .. } => AssetKind::Image,
            AssetDetail::Sound { .. } => AssetKind::Sound,
            AssetDetail::RawFile { .. } => AssetKind::RawFile,
            AssetDetail::Material { .. } => AssetKind::Material,
        }
    }
}

/// Identity of one asset found in a pool or a sound bank
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetDescriptor {
    pub name: String,
    /// Record address, or the payload offset for file-backed assets
    pub source_pointer: u64,
    pub pool_index: u32,
    pub status: AssetStatus,
    /// Payload size in bytes, -1 when unknown
    pub size_hint: i64,
    pub is_file_backed: bool,
    pub detail: AssetDetail,
}

impl AssetDescriptor {
    pub fn kind(&self) -> AssetKind {
        self.detail.kind()
    }

    pub fn is_placeholder(&self) -> bool {
        self.status == AssetStatus::Placeholder
    }
}
