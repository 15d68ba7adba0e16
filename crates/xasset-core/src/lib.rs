//! # xasset-core
//!
//! Core library for extracting assets from running games built on the
//! IW/Treyarch engine family.
//!
//! This crate provides:
//! - Source readers (Windows process memory, memory images) and a bounds-checked cursor
//! - Asset table resolution via static tables and code signatures, with an offset cache
//! - Pool walking with placeholder detection
//! - Table-driven decoding of animations, models, materials, images, sounds and raw files
//! - Package archive indexes (IWD, XPAK, IPAK, XPTOC) and sound banks
//! - DDS, WAV and FLAC transcoding
//! - An extraction [`Session`] that exports assets on a worker pool
//!
//! ## Feature Flags
//!
//! - `debug-tools`: Enables debug utilities for inspecting pools, memory and signatures.
//!   This feature is intended for CLI tools and development, not production use.

pub mod config;
#[cfg(feature = "debug-tools")]
pub mod debug;
pub mod decode;
pub mod error;
pub mod memory;
pub mod offset;
pub mod package;
pub mod pool;
pub mod schema;
pub mod session;
pub mod title;
pub mod transcode;

pub use config::{ExtractConfig, ExtractConfigBuilder};
pub use decode::{
    ImageSource, ImageUsage, SoundCodec, SoundSource, StructDecoder, XAnim, XImageSpec, XMaterial,
    XModel, XRawFile, XSoundSpec, infer_usage_from_name,
};
pub use error::{Error, ResolutionError, Result};
#[cfg(target_os = "windows")]
pub use memory::{MemoryReader, ProcessHandle, ProcessInfo, list_processes};
pub use memory::{Cursor, PointerWidth, ReadMemory, SnapshotReader};
pub use offset::{
    CodeSignature, OffsetResolver, OffsetSignatureSet, PoolLocation, ResolutionSource,
    ResolvedOffsets, load_signatures, save_signatures,
};
pub use package::{PackageCache, PackageFlavor, SoundBank, open_package_cache};
pub use pool::{AssetDescriptor, AssetDetail, AssetKind, AssetStatus};
pub use session::{AssetSink, ExportSummary, ExportedAsset, ExportedImage, Session, post_process_for};
pub use title::{
    GameMode, GameSupport, GameTitle, TitleRegistry, TitleSpec, TitleSupport, builtin_titles,
    detect_title,
};
pub use transcode::{
    AudioContainer, DxgiFormat, PostProcess, StandardAudio, StandardImage, translate_image,
    translate_sound,
};

// Debug utilities (requires debug-tools feature)
#[cfg(feature = "debug-tools")]
pub use debug::{MemoryDump, PoolStatus, ScanResult, SignatureHit, StatusInfo};
