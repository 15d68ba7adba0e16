//! Directory output for exported assets.
//!
//! Layout under the output root:
//!
//! ```text
//! anims/<name>.json
//! models/<name>/<name>.json        models/<name>/_images/<image>.dds
//! materials/<name>.json            materials/_images/<image>.dds
//! images/<name>.dds
//! sounds/<path>/<name>.wav|.flac
//! rawfiles/<path>/<name>
//! ```

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::debug;
use xasset_core::transcode::write_dds_header;
use xasset_core::{
    AssetDescriptor, AssetSink, ExportedAsset, ExportedImage, ImageUsage, PostProcess,
    StandardImage, XMaterial, XModel,
};

/// Characters not allowed in a file name on any supported host
const RESERVED: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Image entry of a model or material metadata file
#[derive(Debug, Serialize)]
struct ImageRecord<'a> {
    name: &'a str,
    usage: ImageUsage,
    file: String,
    post_process: PostProcess,
}

#[derive(Serialize)]
struct ModelMetadata<'a> {
    #[serde(flatten)]
    model: &'a XModel,
    images: Vec<ImageRecord<'a>>,
}

#[derive(Serialize)]
struct MaterialMetadata<'a> {
    #[serde(flatten)]
    material: &'a XMaterial,
    images: Vec<ImageRecord<'a>>,
}

pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `root/<dir>/<relative>`, with every part made safe
    fn dir_path(&self, dir: &str, relative: &str) -> PathBuf {
        let mut path = self.root.join(dir);
        for part in relative.split(['/', '\\']).filter_map(safe_component) {
            path.push(part);
        }
        path
    }

    /// `root/<dir>/<relative>/<name>.<extension>`
    fn asset_path(&self, dir: &str, relative: &str, name: &str, extension: Option<&str>) -> PathBuf {
        let mut path = self.dir_path(dir, relative);
        let mut file = safe_component(name).unwrap_or_else(|| "_".to_string());
        if let Some(extension) = extension {
            file.push('.');
            file.push_str(extension);
        }
        path.push(file);
        path
    }

    fn write_file(path: &Path, bytes: &[u8]) -> xasset_core::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("Writing {} ({} bytes)", path.display(), bytes.len());
        fs::write(path, bytes)?;
        Ok(())
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> xasset_core::Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        Self::write_file(path, json.as_bytes())
    }

    fn write_images<'a>(&self, dir: &Path, images: &'a [ExportedImage]) -> xasset_core::Result<Vec<ImageRecord<'a>>> {
        images
            .iter()
            .map(|exported| {
                let path = dir.join(format!(
                    "{}.dds",
                    safe_component(&exported.spec.name).unwrap_or_else(|| "_".to_string())
                ));
                Self::write_file(&path, &dds_bytes(&exported.image)?)?;
                Ok(ImageRecord {
                    name: &exported.spec.name,
                    usage: exported.spec.usage,
                    file: path
                        .strip_prefix(&self.root)
                        .unwrap_or(&path)
                        .display()
                        .to_string(),
                    post_process: exported.image.post_process,
                })
            })
            .collect()
    }
}

impl AssetSink for FileSink {
    fn write(&self, descriptor: &AssetDescriptor, asset: &ExportedAsset) -> xasset_core::Result<()> {
        match asset {
            ExportedAsset::Anim(anim) => {
                Self::write_json(&self.asset_path("anims", "", &anim.name, Some("json")), anim)
            }
            ExportedAsset::Model { model, images } => {
                let path = self.asset_path("models", &model.name, &model.name, Some("json"));
                let dir = path.parent().map(|p| p.join("_images")).unwrap_or_default();
                let images = self.write_images(&dir, images)?;
                Self::write_json(&path, &ModelMetadata { model, images })
            }
            ExportedAsset::Material { material, images } => {
                let path = self.asset_path("materials", "", &material.name, Some("json"));
                let dir = self.root.join("materials").join("_images");
                let images = self.write_images(&dir, images)?;
                Self::write_json(&path, &MaterialMetadata { material, images })
            }
            ExportedAsset::Image(exported) => {
                let path = self.asset_path("images", "", &exported.spec.name, Some("dds"));
                Self::write_file(&path, &dds_bytes(&exported.image)?)
            }
            ExportedAsset::Sound { spec, audio } => {
                // Some banks keep the full path in the name
                let relative = match (&descriptor.detail, spec.name.contains(['/', '\\'])) {
                    (_, true) => String::new(),
                    (xasset_core::AssetDetail::Sound { path, .. }, false) => path.clone(),
                    _ => String::new(),
                };
                let mut path = self.dir_path("sounds", &relative);
                for part in spec.name.split(['/', '\\']).filter_map(safe_component) {
                    path.push(part);
                }
                let mut file = path.into_os_string();
                file.push(".");
                file.push(audio.container.extension());
                Self::write_file(Path::new(&file), &audio.data)
            }
            ExportedAsset::RawFile { file, data } => {
                Self::write_file(&self.asset_path("rawfiles", &file.path, &file.name, None), data)
            }
        }
    }
}

/// DDS header followed by the image payload
pub fn dds_bytes(image: &StandardImage) -> xasset_core::Result<Vec<u8>> {
    let mut bytes = write_dds_header(
        image.format,
        image.width,
        image.height,
        image.mip_levels,
        image.cubemap,
    )?;
    bytes.extend_from_slice(&image.data);
    Ok(bytes)
}

/// One path component with reserved characters replaced.
///
/// Empty, `.` and `..` parts are dropped so names cannot leave the output root.
fn safe_component(part: &str) -> Option<String> {
    let cleaned: String = part
        .chars()
        .map(|c| if RESERVED.contains(&c) || c.is_control() { '_' } else { c })
        .collect();
    match Path::new(&cleaned).components().next() {
        Some(Component::Normal(_)) if !cleaned.contains(['/', '\\']) => Some(cleaned),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use xasset_core::transcode::DDS_HEADER_SIZE;
    use xasset_core::{
        AssetDetail, AssetStatus, AudioContainer, DxgiFormat, SoundCodec, StandardAudio,
        XImageSpec, XRawFile, XSoundSpec,
    };
    use xasset_core::decode::{ImageSource, SoundSource};

    fn descriptor(name: &str, detail: AssetDetail) -> AssetDescriptor {
        AssetDescriptor {
            name: name.to_string(),
            source_pointer: 0x1000,
            pool_index: 0,
            status: AssetStatus::Loaded,
            size_hint: -1,
            is_file_backed: false,
            detail,
        }
    }

    fn bc1_image(name: &str) -> ExportedImage {
        ExportedImage {
            spec: XImageSpec {
                name: name.to_string(),
                usage: ImageUsage::Normal,
                source_pointer: 0x2000,
                width: 4,
                height: 4,
                format: 71,
                source: ImageSource::Resident {
                    pointer: 0x3000,
                    size: 8,
                },
            },
            image: StandardImage {
                data: vec![0xAB; 8],
                width: 4,
                height: 4,
                format: DxgiFormat::BC1_UNORM,
                mip_levels: 1,
                cubemap: false,
                post_process: PostProcess::NormalMapBump,
            },
        }
    }

    #[test]
    fn test_raw_file_keeps_directory() {
        let dir = tempdir().unwrap();
        let sink = FileSink::new(dir.path());
        let file = XRawFile {
            name: "zm_usermap.gsc".to_string(),
            path: "scripts/zm".to_string(),
            data_pointer: 0x5000,
            size: 6,
        };
        let desc = descriptor(
            "zm_usermap.gsc",
            AssetDetail::RawFile {
                path: "scripts/zm".to_string(),
                size: 6,
                data_pointer: 0x5000,
            },
        );

        sink.write(
            &desc,
            &ExportedAsset::RawFile {
                file,
                data: b"#using".to_vec(),
            },
        )
        .unwrap();

        let written = dir.path().join("rawfiles/scripts/zm/zm_usermap.gsc");
        assert_eq!(fs::read(written).unwrap(), b"#using");
    }

    #[test]
    fn test_image_written_as_dds() {
        let dir = tempdir().unwrap();
        let sink = FileSink::new(dir.path());
        let image = bc1_image("~-gweapon_ak47_nml");
        let desc = descriptor(
            &image.spec.name,
            AssetDetail::Image {
                width: 4,
                height: 4,
                format: 71,
                streamed: false,
            },
        );

        sink.write(&desc, &ExportedAsset::Image(image)).unwrap();

        let bytes = fs::read(dir.path().join("images/~-gweapon_ak47_nml.dds")).unwrap();
        assert_eq!(&bytes[..4], b"DDS ");
        assert_eq!(bytes.len(), DDS_HEADER_SIZE + 8);
    }

    #[test]
    fn test_model_metadata_lists_images() {
        let dir = tempdir().unwrap();
        let sink = FileSink::new(dir.path());
        let model = XModel {
            name: "vehicle_tank".to_string(),
            rotation: xasset_core::schema::KeyEncoding::DivideBySize,
            streamed: false,
            bone_count: 2,
            root_bone_count: 1,
            cosmetic_bone_count: 0,
            bone_ids: 0,
            bone_index_size: 2,
            parents: 0,
            bone_parent_size: 1,
            rotations: 0,
            translations: 0,
            base_matrices: 0,
            lods: Vec::new(),
        };
        let desc = descriptor(
            "vehicle_tank",
            AssetDetail::Model {
                bone_count: 2,
                cosmetic_bone_count: 0,
                lod_count: 0,
            },
        );

        sink.write(
            &desc,
            &ExportedAsset::Model {
                model,
                images: vec![bc1_image("tank_body_n")],
            },
        )
        .unwrap();

        let model_dir = dir.path().join("models/vehicle_tank");
        assert!(model_dir.join("_images/tank_body_n.dds").is_file());
        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(model_dir.join("vehicle_tank.json")).unwrap()).unwrap();
        assert_eq!(json["name"], "vehicle_tank");
        assert_eq!(json["bone_count"], 2);
        assert_eq!(json["images"][0]["usage"], "normal");
        assert_eq!(json["images"][0]["post_process"], "NormalMapBump");
    }

    #[test]
    fn test_sound_uses_container_extension() {
        let dir = tempdir().unwrap();
        let sink = FileSink::new(dir.path());
        let desc = descriptor(
            "zmb_spawn",
            AssetDetail::Sound {
                frame_rate: 48000,
                frame_count: 1,
                channels: 1,
                length_ms: 0,
                package_index: 0,
                localized: false,
                codec: SoundCodec::FlacWithHeader,
                path: "zombie/fx".to_string(),
            },
        );
        let spec = XSoundSpec {
            name: "zmb_spawn".to_string(),
            source: SoundSource::File { offset: 0 },
            size: 4,
            frame_rate: 48000,
            frame_count: 1,
            channels: 1,
            bits_per_sample: 16,
            codec: SoundCodec::FlacWithHeader,
        };
        let audio = StandardAudio {
            container: AudioContainer::Flac,
            data: b"fLaC".to_vec(),
        };

        sink.write(&desc, &ExportedAsset::Sound { spec, audio }).unwrap();
        assert!(dir.path().join("sounds/zombie/fx/zmb_spawn.flac").is_file());
    }

    #[test]
    fn test_names_cannot_leave_root() {
        let sink = FileSink::new("/out");
        let path = sink.asset_path("rawfiles", "../../etc", "a:b?.cfg", None);
        assert_eq!(path, PathBuf::from("/out/rawfiles/etc/a_b_.cfg"));
        assert_eq!(safe_component(".."), None);
        assert_eq!(safe_component(""), None);
    }
}
