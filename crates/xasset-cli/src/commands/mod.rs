//! CLI command implementations.
//!
//! This module contains the implementation of each CLI command.

pub mod convert;
pub mod export;
pub mod hexdump;
pub mod list;
pub mod package;
pub mod resolve;
pub mod scan;
pub mod sounds;

use xasset_core::{AssetDescriptor, AssetDetail, AssetKind, ExtractConfig};

/// `config` with exactly `kinds` enabled, or unchanged when `kinds` is empty
pub fn with_kinds(config: &ExtractConfig, kinds: &[AssetKind]) -> ExtractConfig {
    let mut config = config.clone();
    if kinds.is_empty() {
        return config;
    }
    config.load_animations = kinds.contains(&AssetKind::Animation);
    config.load_models = kinds.contains(&AssetKind::Model);
    config.load_images = kinds.contains(&AssetKind::Image);
    config.load_sounds = kinds.contains(&AssetKind::Sound);
    config.load_rawfiles = kinds.contains(&AssetKind::RawFile);
    config
}

/// Case-insensitive substring match on the asset name
pub fn matches_filter(descriptor: &AssetDescriptor, filter: Option<&str>) -> bool {
    match filter {
        Some(filter) => descriptor
            .name
            .to_ascii_lowercase()
            .contains(&filter.to_ascii_lowercase()),
        None => true,
    }
}

/// One-line summary of the kind-specific details
pub fn describe(detail: &AssetDetail) -> String {
    match detail {
        AssetDetail::Animation {
            framerate,
            frame_count,
            bone_count,
            streamed,
        } => format!(
            "{} frames @ {}fps, {} bones{}",
            frame_count,
            framerate,
            bone_count,
            if *streamed { ", streamed" } else { "" }
        ),
        AssetDetail::Model {
            bone_count,
            cosmetic_bone_count,
            lod_count,
        } => format!(
            "{} bones ({} cosmetic), {} lods",
            bone_count, cosmetic_bone_count, lod_count
        ),
        AssetDetail::Image {
            width,
            height,
            format,
            streamed,
        } => format!(
            "{}x{} format {}{}",
            width,
            height,
            format,
            if *streamed { ", streamed" } else { "" }
        ),
        AssetDetail::Sound {
            frame_rate,
            channels,
            length_ms,
            codec,
            ..
        } => format!(
            "{} Hz, {} ch, {} ms, {}",
            frame_rate, channels, length_ms, codec
        ),
        AssetDetail::RawFile { path, size, .. } => format!("{} bytes in {}/", size, path),
        AssetDetail::Material { image_count } => format!("{} images", image_count),
    }
}
