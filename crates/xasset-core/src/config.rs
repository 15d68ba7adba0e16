//! Extraction settings.
//!
//! [`ExtractConfig`] is read from a TOML file by the front end and handed to
//! the core, which only ever reads it.
//!
//! ```toml
//! load_images = true
//! patch_normals = false
//! worker_count = 4
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::pool::AssetKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub load_animations: bool,
    pub load_models: bool,
    pub load_images: bool,
    pub load_sounds: bool,
    pub load_rawfiles: bool,
    /// Tag normal and gloss maps for post-processing on export
    pub patch_normals: bool,
    pub include_placeholders: bool,
    /// Leave silent sound bank entries out of the asset list
    pub skip_blank_audio: bool,
    /// Export threads, 0 for one per logical CPU
    pub worker_count: usize,
    pub offset_cache_path: Option<PathBuf>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            load_animations: true,
            load_models: true,
            load_images: false,
            load_sounds: false,
            load_rawfiles: false,
            patch_normals: true,
            include_placeholders: false,
            skip_blank_audio: false,
            worker_count: 0,
            offset_cache_path: None,
        }
    }
}

impl ExtractConfig {
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = toml::from_str(&content)?;
        debug!("Loaded extract config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Whether assets of `kind` are enumerated at all
    pub fn loads(&self, kind: AssetKind) -> bool {
        match kind {
            AssetKind::Animation => self.load_animations,
            AssetKind::Model => self.load_models,
            AssetKind::Image => self.load_images,
            AssetKind::Sound => self.load_sounds,
            AssetKind::RawFile => self.load_rawfiles,
            // Materials are reached through models
            AssetKind::Material => false,
        }
    }

    /// Kinds to enumerate, in walk order
    pub fn enabled_kinds(&self) -> Vec<AssetKind> {
        [
            AssetKind::Animation,
            AssetKind::Model,
            AssetKind::Image,
            AssetKind::Sound,
            AssetKind::RawFile,
        ]
        .into_iter()
        .filter(|kind| self.loads(*kind))
        .collect()
    }
}

/// Builder for [`ExtractConfig`]; unset fields keep their defaults
#[derive(Debug, Clone, Default)]
pub struct ExtractConfigBuilder {
    load_animations: Option<bool>,
    load_models: Option<bool>,
    load_images: Option<bool>,
    load_sounds: Option<bool>,
    load_rawfiles: Option<bool>,
    patch_normals: Option<bool>,
    include_placeholders: Option<bool>,
    skip_blank_audio: Option<bool>,
    worker_count: Option<usize>,
    offset_cache_path: Option<PathBuf>,
}

impl ExtractConfigBuilder {
    pub fn load_animations(mut self, enabled: bool) -> Self {
        self.load_animations = Some(enabled);
        self
    }

    pub fn load_models(mut self, enabled: bool) -> Self {
        self.load_models = Some(enabled);
        self
    }

    pub fn load_images(mut self, enabled: bool) -> Self {
        self.load_images = Some(enabled);
        self
    }

    pub fn load_sounds(mut self, enabled: bool) -> Self {
        self.load_sounds = Some(enabled);
        self
    }

    pub fn load_rawfiles(mut self, enabled: bool) -> Self {
        self.load_rawfiles = Some(enabled);
        self
    }

    pub fn patch_normals(mut self, enabled: bool) -> Self {
        self.patch_normals = Some(enabled);
        self
    }

    pub fn include_placeholders(mut self, enabled: bool) -> Self {
        self.include_placeholders = Some(enabled);
        self
    }

    pub fn skip_blank_audio(mut self, enabled: bool) -> Self {
        self.skip_blank_audio = Some(enabled);
        self
    }

    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = Some(count);
        self
    }

    pub fn offset_cache_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.offset_cache_path = Some(path.into());
        self
    }

    pub fn build(self) -> ExtractConfig {
        let default = ExtractConfig::default();
        ExtractConfig {
            load_animations: self.load_animations.unwrap_or(default.load_animations),
            load_models: self.load_models.unwrap_or(default.load_models),
            load_images: self.load_images.unwrap_or(default.load_images),
            load_sounds: self.load_sounds.unwrap_or(default.load_sounds),
            load_rawfiles: self.load_rawfiles.unwrap_or(default.load_rawfiles),
            patch_normals: self.patch_normals.unwrap_or(default.patch_normals),
            include_placeholders: self
                .include_placeholders
                .unwrap_or(default.include_placeholders),
            skip_blank_audio: self.skip_blank_audio.unwrap_or(default.skip_blank_audio),
            worker_count: self.worker_count.unwrap_or(default.worker_count),
            offset_cache_path: self.offset_cache_path.or(default.offset_cache_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ExtractConfig::default();
        assert!(config.load_models);
        assert!(!config.load_images);
        assert!(config.patch_normals);
        assert_eq!(
            config.enabled_kinds(),
            vec![AssetKind::Animation, AssetKind::Model]
        );
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "load_images = true\nworker_count = 4").unwrap();

        let config = ExtractConfig::load(file.path()).unwrap();
        assert!(config.load_images);
        assert!(config.load_animations);
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.offset_cache_path, None);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "load_images = maybe").unwrap();
        assert!(ExtractConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ExtractConfig::builder()
            .load_animations(false)
            .load_sounds(true)
            .offset_cache_path("offsets.json")
            .build();
        assert!(!config.loads(AssetKind::Animation));
        assert!(config.loads(AssetKind::Sound));
        assert!(!config.loads(AssetKind::Material));
        assert_eq!(config.offset_cache_path, Some(PathBuf::from("offsets.json")));
        assert!(config.patch_normals);
    }
}
