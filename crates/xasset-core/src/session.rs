//! An attached extraction session.
//!
//! A [`Session`] is created once the asset tables of a title are resolved and
//! owns everything later calls need: the reader, the title support, the
//! resolved offsets, the configuration, optional package caches and sound
//! banks, and the asset list found by the last [`Session::load_assets`].
//!
//! Export runs the per-asset pipeline (decode, package extract, transcode,
//! write) on a worker pool. A shared continue flag stops new work; assets
//! already handed to the [`AssetSink`] stay written.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ExtractConfig;
use crate::decode::{
    ImageSource, ImageUsage, SoundSource, StructDecoder, XAnim, XImageSpec, XMaterial, XModel,
    XRawFile, XSoundSpec, file_sound_spec, infer_usage_from_name,
};
use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::offset::ResolvedOffsets;
use crate::package::{PackageCache, SoundBank, iwd_key, open_package_cache};
use crate::pool::{AssetDescriptor, AssetDetail, AssetKind};
use crate::title::{GameMode, GameSupport, GameTitle, TitleSpec};
use crate::transcode::{
    PostProcess, SoundFormat, StandardAudio, StandardImage, translate_iwi, translate_raw_image,
    translate_sound,
};

/// Post-processing tag for an image of `usage`
pub fn post_process_for(title: GameTitle, usage: ImageUsage, patch_normals: bool) -> PostProcess {
    if !patch_normals {
        return PostProcess::None;
    }
    match (usage, title) {
        (ImageUsage::Normal, GameTitle::BlackOps2 | GameTitle::BlackOps3) => {
            PostProcess::NormalMapExpand
        }
        (ImageUsage::Normal, _) => PostProcess::NormalMapBump,
        (ImageUsage::Gloss, _) => PostProcess::ColorStripAlpha,
        _ => PostProcess::None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportedImage {
    pub spec: XImageSpec,
    pub image: StandardImage,
}

/// A fully processed asset handed to an [`AssetSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum ExportedAsset {
    Anim(XAnim),
    Model {
        model: XModel,
        images: Vec<ExportedImage>,
    },
    Material {
        material: XMaterial,
        images: Vec<ExportedImage>,
    },
    Image(ExportedImage),
    Sound {
        spec: XSoundSpec,
        audio: StandardAudio,
    },
    RawFile {
        file: XRawFile,
        data: Vec<u8>,
    },
}

/// Destination of exported assets, shared by every export worker
pub trait AssetSink: Send + Sync {
    fn write(&self, descriptor: &AssetDescriptor, asset: &ExportedAsset) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub exported: usize,
    /// Placeholders and assets never started because the export stopped
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
}

pub struct Session<R: ReadMemory + Sync> {
    reader: R,
    support: Box<dyn GameSupport>,
    offsets: ResolvedOffsets,
    config: ExtractConfig,
    packages: Option<Box<dyn PackageCache>>,
    sound_banks: Vec<SoundBank>,
    assets: Mutex<Vec<AssetDescriptor>>,
    running: Arc<AtomicBool>,
    progress: AtomicUsize,
}

impl<R: ReadMemory + Sync> Session<R> {
    /// Resolve the tables of `support`'s title and start a session
    pub fn attach(
        reader: R,
        support: Box<dyn GameSupport>,
        mode: GameMode,
        config: ExtractConfig,
    ) -> Result<Self> {
        let offsets = support.resolve(&reader, mode, config.offset_cache_path.as_deref())?;
        info!(
            "Attached to {} {} (pools: {:#x}, strings: {:#x})",
            offsets.title, offsets.mode, offsets.tables.pool_table, offsets.tables.string_table
        );
        Ok(Self::from_offsets(reader, support, offsets, config))
    }

    /// Start a session on tables resolved elsewhere
    pub fn from_offsets(
        reader: R,
        support: Box<dyn GameSupport>,
        offsets: ResolvedOffsets,
        config: ExtractConfig,
    ) -> Self {
        Self {
            reader,
            support,
            offsets,
            config,
            packages: None,
            sound_banks: Vec::new(),
            assets: Mutex::new(Vec::new()),
            running: Arc::new(AtomicBool::new(true)),
            progress: AtomicUsize::new(0),
        }
    }

    /// Share a continue flag owned by the caller, e.g. a Ctrl+C handler
    pub fn with_running_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn spec(&self) -> &'static TitleSpec {
        self.support.spec()
    }

    pub fn offsets(&self) -> &ResolvedOffsets {
        &self.offsets
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop issuing new work; in-flight assets still complete
    pub fn cancel(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Assets finished by the current or last export
    pub fn progress(&self) -> usize {
        self.progress.load(Ordering::Relaxed)
    }

    /// Index the title's package archives under `path`
    pub fn load_packages(&mut self, path: &Path) -> Result<usize> {
        let flavor = self.spec().package;
        match open_package_cache(flavor, path)? {
            Some(cache) => {
                let entries = cache.len();
                info!("Indexed {} {} package entries", entries, flavor);
                self.packages = Some(cache);
                Ok(entries)
            }
            None => {
                warn!("{} has no package archives", self.spec().title);
                Ok(0)
            }
        }
    }

    pub fn packages(&self) -> Option<&dyn PackageCache> {
        self.packages.as_deref()
    }

    /// Open a sound bank; its entries join the list on the next load
    pub fn add_sound_bank(&mut self, path: &Path) -> Result<usize> {
        let bank = SoundBank::open(path, self.config.skip_blank_audio)?;
        let count = bank.descriptors().len();
        self.sound_banks.push(bank);
        Ok(count)
    }

    fn lock_assets(&self) -> MutexGuard<'_, Vec<AssetDescriptor>> {
        self.assets.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Snapshot of the current asset list
    pub fn assets(&self) -> Vec<AssetDescriptor> {
        self.lock_assets().clone()
    }

    /// Walk every pool the configuration enables and replace the asset list.
    ///
    /// A pool that cannot be read is skipped; losing the source aborts.
    pub fn load_assets(&self) -> Result<usize> {
        let reader: &dyn ReadMemory = &self.reader;
        let mut loaded = Vec::new();

        for kind in self.config.enabled_kinds() {
            let walker = match self.support.enumerate(
                reader,
                &self.offsets,
                kind,
                self.config.include_placeholders,
            ) {
                Ok(Some(walker)) => walker,
                Ok(None) => {
                    debug!("{} has no {} pool", self.spec().title, kind);
                    continue;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Cannot locate {} pool: {}", kind, e);
                    continue;
                }
            };

            let before = loaded.len();
            for item in walker {
                if !self.is_running() {
                    return Err(Error::Cancelled);
                }
                match item {
                    Ok(descriptor) => loaded.push(descriptor),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        warn!("{} pool ended early: {}", kind, e);
                        break;
                    }
                }
            }
            info!("Found {} {} assets", loaded.len() - before, kind);
        }

        if self.config.load_sounds {
            for (index, bank) in self.sound_banks.iter().enumerate() {
                loaded.extend(bank.descriptors().iter().cloned().map(|mut descriptor| {
                    if let AssetDetail::Sound { package_index, .. } = &mut descriptor.detail {
                        *package_index = index as u32;
                    }
                    descriptor
                }));
            }
        }

        let count = loaded.len();
        *self.lock_assets() = loaded;
        Ok(count)
    }

    /// Export the whole asset list
    pub fn export_all(&self, sink: &dyn AssetSink) -> Result<ExportSummary> {
        let assets = self.assets();
        self.export(&assets, sink)
    }

    /// Run the export pipeline for `selection` on the worker pool.
    ///
    /// Per-asset failures are logged and counted. A fatal error stops new
    /// work and is returned once in-flight assets finish.
    pub fn export(&self, selection: &[AssetDescriptor], sink: &dyn AssetSink) -> Result<ExportSummary> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_count)
            .build()
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;
        info!(
            "Exporting {} assets on {} workers",
            selection.len(),
            pool.current_num_threads()
        );

        self.progress.store(0, Ordering::Relaxed);
        let exported = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);
        let fatal: Mutex<Option<Error>> = Mutex::new(None);

        pool.install(|| {
            selection.par_iter().for_each(|descriptor| {
                if stop.load(Ordering::SeqCst) || !self.is_running() || descriptor.is_placeholder() {
                    skipped.fetch_add(1, Ordering::Relaxed);
                    return;
                }

                match self
                    .export_one(descriptor)
                    .and_then(|asset| sink.write(descriptor, &asset))
                {
                    Ok(()) => {
                        exported.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) if e.is_fatal() => {
                        stop.store(true, Ordering::SeqCst);
                        failed.fetch_add(1, Ordering::Relaxed);
                        let mut slot = fatal.lock().unwrap_or_else(|p| p.into_inner());
                        slot.get_or_insert(e);
                    }
                    Err(e) => {
                        warn!("Skipping {} {}: {}", descriptor.kind(), descriptor.name, e);
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
                self.progress.fetch_add(1, Ordering::Relaxed);
            });
        });

        if let Some(e) = fatal.into_inner().unwrap_or_else(|p| p.into_inner()) {
            return Err(e);
        }

        let summary = ExportSummary {
            exported: exported.into_inner(),
            skipped: skipped.into_inner(),
            failed: failed.into_inner(),
            cancelled: !self.is_running(),
        };
        info!(
            "Export finished: {} exported, {} skipped, {} failed",
            summary.exported, summary.skipped, summary.failed
        );
        Ok(summary)
    }

    /// Decode one asset and load its payloads
    pub fn export_one(&self, descriptor: &AssetDescriptor) -> Result<ExportedAsset> {
        let reader: &dyn ReadMemory = &self.reader;
        let support = self.support.as_ref();

        match descriptor.kind() {
            AssetKind::Animation => Ok(ExportedAsset::Anim(support.decode_anim(reader, descriptor)?)),
            AssetKind::Model => {
                let model = support.decode_model(reader, descriptor)?;
                let images = if self.config.load_images {
                    self.material_images(model.lods.iter().flat_map(|lod| &lod.materials))?
                } else {
                    Vec::new()
                };
                Ok(ExportedAsset::Model { model, images })
            }
            AssetKind::Material => {
                let material = support.decode_material(reader, descriptor.source_pointer)?;
                let images = self.material_images(std::iter::once(&material))?;
                Ok(ExportedAsset::Material { material, images })
            }
            AssetKind::Image => {
                let mut spec = support.decode_image(reader, descriptor)?;
                if spec.usage == ImageUsage::Unknown {
                    spec.usage = infer_usage_from_name(&spec.name);
                }
                let image = self.load_image(&spec)?;
                Ok(ExportedAsset::Image(ExportedImage { spec, image }))
            }
            AssetKind::Sound => {
                let spec = if descriptor.is_file_backed {
                    file_sound_spec(descriptor)?
                } else {
                    support.decode_sound(reader, descriptor)?
                };
                let bytes = self.sound_payload(descriptor, &spec)?;
                let audio = translate_sound(&bytes, spec.codec, &SoundFormat::from(&spec))?;
                Ok(ExportedAsset::Sound { spec, audio })
            }
            AssetKind::RawFile => {
                let file = support.decode_rawfile(reader, descriptor)?;
                let data = if file.data_pointer == 0 || file.size == 0 {
                    Vec::new()
                } else {
                    reader.read_bytes(file.data_pointer, file.size as usize)?
                };
                Ok(ExportedAsset::RawFile { file, data })
            }
        }
    }

    /// Images of every slot of `materials`. Unloadable images are skipped;
    /// a lost source or failing disk ends the whole asset.
    fn material_images<'m>(
        &self,
        materials: impl Iterator<Item = &'m XMaterial>,
    ) -> Result<Vec<ExportedImage>> {
        let decoder = StructDecoder::new(&self.reader, self.spec());
        let mut images: Vec<ExportedImage> = Vec::new();
        for material in materials {
            for slot in &material.images {
                if images.iter().any(|i| i.spec.name == slot.name) {
                    continue;
                }
                let loaded = decoder
                    .decode_material_image(slot)
                    .and_then(|spec| self.load_image(&spec).map(|image| ExportedImage { spec, image }));
                match loaded {
                    Ok(image) => images.push(image),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => warn!("Skipping image {} of {}: {}", slot.name, material.name, e),
                }
            }
        }
        Ok(images)
    }

    /// Pixels of a decoded image, wrapped and tagged for post-processing
    pub fn load_image(&self, spec: &XImageSpec) -> Result<StandardImage> {
        let image = match &spec.source {
            ImageSource::Resident { pointer, size } => {
                let bytes = self.reader.read_bytes(*pointer, *size as usize)?;
                translate_raw_image(&bytes, spec.width, spec.height, spec.format)?
            }
            ImageSource::Streamed { hash, .. } => {
                let bytes = self.package()?.extract(*hash)?;
                translate_raw_image(&bytes, spec.width, spec.height, spec.format)?
            }
            ImageSource::Package { name } => {
                let bytes = self.package()?.extract(iwd_key(name))?;
                translate_iwi(&bytes)?
            }
            ImageSource::PackagedIwi { key } => {
                let bytes = self.package()?.extract(*key)?;
                translate_iwi(&bytes)?
            }
        };
        Ok(image.with_post_process(post_process_for(
            self.spec().title,
            spec.usage,
            self.config.patch_normals,
        )))
    }

    fn package(&self) -> Result<&dyn PackageCache> {
        self.packages
            .as_deref()
            .ok_or_else(|| Error::UnsupportedFormat("no package archives loaded".to_string()))
    }

    fn sound_payload(&self, descriptor: &AssetDescriptor, spec: &XSoundSpec) -> Result<Vec<u8>> {
        match spec.source {
            SoundSource::Memory { pointer } => self.reader.read_bytes(pointer, spec.size as usize),
            SoundSource::File { offset } => {
                let index = match descriptor.detail {
                    AssetDetail::Sound { package_index, .. } => package_index as usize,
                    _ => 0,
                };
                let bank = self.sound_banks.get(index).ok_or_else(|| {
                    Error::decode(&descriptor.name, format!("sound bank {} is not open", index))
                })?;
                bank.read_payload(offset, spec.size)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::XMaterialImage;
    use crate::memory::{MockMemoryBuilder, MockMemoryReader};
    use crate::offset::ResolutionSource;
    use crate::package::{DuplicatePolicy, PackageFlavor, PackageIndex};
    use crate::pool::AssetStatus;
    use crate::title::{TableAddresses, TitleRegistry, TitleSupport};
    use crate::transcode::DxgiFormat;

    const POOL_TABLE: u64 = 0x10_0000;
    const RAWFILES: u64 = 0x40000;

    /// BO3 with a two-slot raw file pool, the first slot free
    fn bo3_session(config: ExtractConfig) -> Session<MockMemoryReader> {
        let spec = TitleRegistry::builtin().get(GameTitle::BlackOps3).unwrap();
        let pool_data = POOL_TABLE + 0x20 * 0x2F;
        let reader = MockMemoryBuilder::new()
            .zeroed(POOL_TABLE, 0x20 * 0x30)
            .write_u64(pool_data, RAWFILES)
            .write_u32(pool_data + 0xC, 2)
            .zeroed(RAWFILES, 0x30)
            .write_u64(RAWFILES + 0x18, 0x2000)
            .write_cstring(0x2000, "scripts/zm/zm_usermap.gsc")
            .write_u64(RAWFILES + 0x20, 6)
            .write_u64(RAWFILES + 0x28, 0x3000)
            .write(0x3000, b"#using")
            .build();
        let offsets = ResolvedOffsets {
            title: GameTitle::BlackOps3,
            mode: GameMode::SinglePlayer,
            tables: TableAddresses::new(POOL_TABLE, 0, 0x20_0000),
            source: ResolutionSource::Cache,
        };
        Session::from_offsets(reader, Box::new(TitleSupport::new(spec)), offsets, config)
    }

    fn session_for(title: GameTitle, reader: MockMemoryReader) -> Session<MockMemoryReader> {
        let spec = TitleRegistry::builtin().get(title).unwrap();
        let offsets = ResolvedOffsets {
            title,
            mode: GameMode::SinglePlayer,
            tables: TableAddresses::new(POOL_TABLE, 0, 0x20_0000),
            source: ResolutionSource::Cache,
        };
        Session::from_offsets(reader, Box::new(TitleSupport::new(spec)), offsets, ExtractConfig::default())
    }

    /// Package cache whose every extract fails with the given error
    struct FailingPackages {
        index: PackageIndex,
        error: fn(u64) -> Error,
    }

    impl FailingPackages {
        fn boxed(error: fn(u64) -> Error) -> Option<Box<dyn PackageCache>> {
            Some(Box::new(Self {
                index: PackageIndex::new(DuplicatePolicy::LastWins),
                error,
            }))
        }
    }

    impl PackageCache for FailingPackages {
        fn flavor(&self) -> PackageFlavor {
            PackageFlavor::Iwd
        }

        fn load_index(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn extract(&self, key: u64) -> Result<Vec<u8>> {
            Err((self.error)(key))
        }

        fn index(&self) -> &PackageIndex {
            &self.index
        }
    }

    /// Package cache holding a single entry
    struct OneEntryPackage {
        index: PackageIndex,
        key: u64,
        bytes: Vec<u8>,
    }

    impl PackageCache for OneEntryPackage {
        fn flavor(&self) -> PackageFlavor {
            PackageFlavor::Ipak
        }

        fn load_index(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn extract(&self, key: u64) -> Result<Vec<u8>> {
            if key == self.key {
                Ok(self.bytes.clone())
            } else {
                Err(Error::NotFound { key })
            }
        }

        fn index(&self) -> &PackageIndex {
            &self.index
        }
    }

    /// Version 6 `.iwi` holding one 4x4 BC1 block
    fn bc1_iwi() -> Vec<u8> {
        let mut bytes = vec![0u8; 0x1C];
        bytes[..4].copy_from_slice(b"IWi\x06");
        bytes[4] = 0xB;
        bytes[6..8].copy_from_slice(&4u16.to_le_bytes());
        bytes[8..10].copy_from_slice(&4u16.to_le_bytes());
        for mip in 0..4 {
            bytes[0xC + mip * 4..0x10 + mip * 4].copy_from_slice(&0x1Cu32.to_le_bytes());
        }
        bytes.extend_from_slice(&[0x55; 8]);
        bytes
    }

    fn waw_material() -> XMaterial {
        XMaterial {
            name: "mtl_wood_crate".to_string(),
            images: vec![XMaterialImage {
                usage: ImageUsage::Diffuse,
                pointer: 0x5000,
                semantic_hash: 0,
                name: "wood_crate_c".to_string(),
            }],
        }
    }

    fn rawfiles_only() -> ExtractConfig {
        ExtractConfig::builder()
            .load_animations(false)
            .load_models(false)
            .load_rawfiles(true)
            .worker_count(2)
            .build()
    }

    #[derive(Default)]
    struct RecordingSink {
        written: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl AssetSink for RecordingSink {
        fn write(&self, descriptor: &AssetDescriptor, asset: &ExportedAsset) -> Result<()> {
            let ExportedAsset::RawFile { data, .. } = asset else {
                return Err(Error::decode(&descriptor.name, "unexpected asset"));
            };
            self.written
                .lock()
                .unwrap()
                .push((descriptor.name.clone(), data.clone()));
            Ok(())
        }
    }

    #[test]
    fn test_load_and_export_rawfiles() {
        let session = bo3_session(rawfiles_only());
        assert_eq!(session.load_assets().unwrap(), 1);

        let assets = session.assets();
        assert_eq!(assets[0].name, "zm_usermap.gsc");
        assert_eq!(assets[0].pool_index, 1);

        let sink = RecordingSink::default();
        let summary = session.export_all(&sink).unwrap();
        assert_eq!(
            summary,
            ExportSummary {
                exported: 1,
                skipped: 0,
                failed: 0,
                cancelled: false,
            }
        );
        assert_eq!(session.progress(), 1);
        assert_eq!(
            sink.written.lock().unwrap()[0],
            ("zm_usermap.gsc".to_string(), b"#using".to_vec())
        );
    }

    #[test]
    fn test_cancelled_export_starts_nothing() {
        let session = bo3_session(rawfiles_only());
        session.load_assets().unwrap();
        session.cancel();

        let sink = RecordingSink::default();
        let summary = session.export_all(&sink).unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.exported, 0);
        assert_eq!(summary.skipped, 1);
        assert!(sink.written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failed_asset_does_not_stop_batch() {
        let session = bo3_session(rawfiles_only());
        session.load_assets().unwrap();
        let mut assets = session.assets();
        let mut broken = assets[0].clone();
        broken.source_pointer = 0xDEAD_0000;
        assets.insert(0, broken);

        let sink = RecordingSink::default();
        let summary = session.export(&assets, &sink).unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.exported, 1);
    }

    #[test]
    fn test_disabled_kinds_are_not_walked() {
        let session = bo3_session(ExtractConfig::builder().load_animations(false).load_models(false).build());
        assert_eq!(session.load_assets().unwrap(), 0);
        assert!(session.assets().is_empty());
    }

    #[test]
    fn test_streamed_image_needs_packages() {
        let session = bo3_session(rawfiles_only());
        let spec = XImageSpec {
            name: "~-grock_cliff_n".to_string(),
            usage: ImageUsage::Normal,
            source_pointer: 0,
            width: 4,
            height: 4,
            format: 71,
            source: ImageSource::Streamed { hash: 0xABC, size: 8 },
        };
        assert!(matches!(
            session.load_image(&spec).unwrap_err(),
            Error::UnsupportedFormat(_)
        ));
    }

    #[test]
    fn test_resident_image_gets_post_process() {
        let reader = MockMemoryBuilder::new().zeroed(0x8000, 16).build();
        let spec = TitleRegistry::builtin().get(GameTitle::BlackOps3).unwrap();
        let offsets = ResolvedOffsets {
            title: GameTitle::BlackOps3,
            mode: GameMode::SinglePlayer,
            tables: TableAddresses::new(POOL_TABLE, 0, 0x20_0000),
            source: ResolutionSource::Cache,
        };
        let session = Session::from_offsets(
            reader,
            Box::new(TitleSupport::new(spec)),
            offsets,
            ExtractConfig::default(),
        );
        let image = session
            .load_image(&XImageSpec {
                name: "~-grock_cliff_n".to_string(),
                usage: ImageUsage::Normal,
                source_pointer: 0,
                width: 4,
                height: 4,
                format: 83,
                source: ImageSource::Resident {
                    pointer: 0x8000,
                    size: 16,
                },
            })
            .unwrap();
        assert_eq!(image.post_process, PostProcess::NormalMapExpand);
    }

    #[test]
    fn test_exported_image_usage_comes_from_its_name() {
        let image = 0x1000;
        let reader = MockMemoryBuilder::new()
            .zeroed(image, 0x108)
            .write_u16(image + 0xC0, 64)
            .write_u16(image + 0xC2, 32)
            .write_u8(image + 0xF0, 78)
            .write_u64(image + 0xD8, 0x8000)
            .write_u32(image + 0xE8, 0x800)
            .zeroed(0x8000, 0x800)
            .build();
        let session = session_for(GameTitle::BlackOps3, reader);
        let descriptor = AssetDescriptor {
            name: "~-grock_cliff_n".to_string(),
            source_pointer: image,
            pool_index: 0,
            status: AssetStatus::Loaded,
            size_hint: -1,
            is_file_backed: false,
            detail: AssetDetail::Image {
                width: 64,
                height: 32,
                format: 78,
                streamed: false,
            },
        };

        let ExportedAsset::Image(exported) = session.export_one(&descriptor).unwrap() else {
            panic!("expected an image");
        };
        assert_eq!(exported.spec.usage, ImageUsage::Normal);
        assert_eq!(exported.image.post_process, PostProcess::NormalMapExpand);
    }

    #[test]
    fn test_material_image_lost_source_aborts() {
        let mut session = session_for(GameTitle::WorldAtWar, MockMemoryBuilder::new().build());
        session.packages = FailingPackages::boxed(|_| Error::NotAccessible("game exited".to_string()));

        let material = waw_material();
        let err = session.material_images(std::iter::once(&material)).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_material_image_missing_entry_is_skipped() {
        let mut session = session_for(GameTitle::WorldAtWar, MockMemoryBuilder::new().build());
        session.packages = FailingPackages::boxed(|key| Error::NotFound { key });

        let material = waw_material();
        let images = session.material_images(std::iter::once(&material)).unwrap();
        assert!(images.is_empty());
    }

    #[test]
    fn test_packaged_iwi_is_extracted_by_key() {
        let mut session = session_for(GameTitle::BlackOps2, MockMemoryBuilder::new().build());
        session.packages = Some(Box::new(OneEntryPackage {
            index: PackageIndex::new(DuplicatePolicy::LastWins),
            key: 0x0123_4567_89AB_CDEF,
            bytes: bc1_iwi(),
        }));
        let mut spec = XImageSpec {
            name: "~-gcrate_wood_nml".to_string(),
            usage: ImageUsage::Normal,
            source_pointer: 0x2000,
            width: 4,
            height: 4,
            format: 0,
            source: ImageSource::PackagedIwi {
                key: 0x0123_4567_89AB_CDEF,
            },
        };

        let image = session.load_image(&spec).unwrap();
        assert_eq!(image.format, DxgiFormat::BC1_UNORM);
        assert_eq!(image.post_process, PostProcess::NormalMapExpand);

        spec.source = ImageSource::PackagedIwi { key: 0x42 };
        assert!(session.load_image(&spec).unwrap_err().is_not_found());
    }

    #[test]
    fn test_post_process_policy() {
        assert_eq!(
            post_process_for(GameTitle::ModernWarfare2, ImageUsage::Normal, true),
            PostProcess::NormalMapBump
        );
        assert_eq!(
            post_process_for(GameTitle::WorldAtWar, ImageUsage::Gloss, true),
            PostProcess::ColorStripAlpha
        );
        assert_eq!(
            post_process_for(GameTitle::BlackOps3, ImageUsage::Normal, false),
            PostProcess::None
        );
        assert_eq!(
            post_process_for(GameTitle::BlackOps3, ImageUsage::Diffuse, true),
            PostProcess::None
        );
        assert_eq!(
            post_process_for(GameTitle::BlackOps2, ImageUsage::Normal, true),
            PostProcess::NormalMapExpand
        );
    }
}
