use std::path::Path;

use tracing::debug;

use crate::decode::{StructDecoder, XAnim, XImageSpec, XMaterial, XModel, XRawFile, XSoundSpec};
use crate::error::Result;
use crate::memory::ReadMemory;
use crate::offset::{OffsetResolver, PoolLocation, ResolvedOffsets};
use crate::pool::{
    AssetDescriptor, AssetKind, AssetPoolWalker, FixedPoolWalker, LayoutDescriber,
    LinkedPoolWalker, RecordSource,
};

use super::{GameMode, TitleSpec};

/// Capabilities a supported title offers a session
pub trait GameSupport: Send + Sync {
    fn spec(&self) -> &'static TitleSpec;

    /// Locate and verify the asset tables, reusing `cache` when given
    fn resolve(
        &self,
        reader: &dyn ReadMemory,
        mode: GameMode,
        cache: Option<&Path>,
    ) -> Result<ResolvedOffsets>;

    /// Lazy walk over one pool; `None` when the title has no pool of `kind`
    fn enumerate<'a>(
        &'a self,
        reader: &'a dyn ReadMemory,
        offsets: &ResolvedOffsets,
        kind: AssetKind,
        include_placeholders: bool,
    ) -> Result<Option<AssetPoolWalker<'a, dyn ReadMemory + 'a>>>;

    fn decode_anim(&self, reader: &dyn ReadMemory, descriptor: &AssetDescriptor) -> Result<XAnim>;
    fn decode_model(&self, reader: &dyn ReadMemory, descriptor: &AssetDescriptor) -> Result<XModel>;
    fn decode_material(&self, reader: &dyn ReadMemory, pointer: u64) -> Result<XMaterial>;
    fn decode_image(&self, reader: &dyn ReadMemory, descriptor: &AssetDescriptor) -> Result<XImageSpec>;
    fn decode_sound(&self, reader: &dyn ReadMemory, descriptor: &AssetDescriptor) -> Result<XSoundSpec>;
    fn decode_rawfile(&self, reader: &dyn ReadMemory, descriptor: &AssetDescriptor) -> Result<XRawFile>;

    /// Entry `index` of the resolved string table
    fn string_entry(
        &self,
        reader: &dyn ReadMemory,
        offsets: &ResolvedOffsets,
        index: u64,
    ) -> Result<String>;
}

/// [`GameSupport`] driven entirely by a [`TitleSpec`]
#[derive(Debug, Clone, Copy)]
pub struct TitleSupport {
    spec: &'static TitleSpec,
}

impl TitleSupport {
    pub fn new(spec: &'static TitleSpec) -> Self {
        Self { spec }
    }

    fn decoder<'a>(&self, reader: &'a dyn ReadMemory) -> StructDecoder<'a, dyn ReadMemory + 'a> {
        StructDecoder::new(reader, self.spec)
    }
}

impl GameSupport for TitleSupport {
    fn spec(&self) -> &'static TitleSpec {
        self.spec
    }

    fn resolve(
        &self,
        reader: &dyn ReadMemory,
        mode: GameMode,
        cache: Option<&Path>,
    ) -> Result<ResolvedOffsets> {
        let resolver = OffsetResolver::new(reader, self.spec, mode);
        match cache {
            Some(path) => resolver.resolve_cached(path),
            None => resolver.resolve(),
        }
    }

    fn enumerate<'a>(
        &'a self,
        reader: &'a dyn ReadMemory,
        offsets: &ResolvedOffsets,
        kind: AssetKind,
        include_placeholders: bool,
    ) -> Result<Option<AssetPoolWalker<'a, dyn ReadMemory + 'a>>> {
        let Some(describer) = LayoutDescriber::new(kind, &self.spec.layouts) else {
            return Ok(None);
        };
        let resolver = OffsetResolver::new(reader, self.spec, offsets.mode);
        let Some(location) = resolver.locate_pool(&offsets.tables, kind)? else {
            return Ok(None);
        };

        let pointer = self.spec.pointer;
        let records = match location {
            PoolLocation::Fixed(span) => {
                debug!("{} pool: {} records at {:#x}", kind, span.count, span.base);
                RecordSource::Fixed(FixedPoolWalker::new(reader, span, pointer, describer.name_field()))
            }
            PoolLocation::Linked { root, record_size } => {
                debug!("{} pool: linked from {:#x}", kind, root);
                RecordSource::Linked(LinkedPoolWalker::new(reader, root, record_size, pointer)?)
            }
        };
        let filter = describer.placeholder_filter(&self.spec.placeholders);
        Ok(Some(AssetPoolWalker::new(
            reader,
            records,
            describer,
            filter,
            include_placeholders,
        )))
    }

    fn decode_anim(&self, reader: &dyn ReadMemory, descriptor: &AssetDescriptor) -> Result<XAnim> {
        self.decoder(reader).decode_anim(descriptor)
    }

    fn decode_model(&self, reader: &dyn ReadMemory, descriptor: &AssetDescriptor) -> Result<XModel> {
        self.decoder(reader).decode_model(descriptor)
    }

    fn decode_material(&self, reader: &dyn ReadMemory, pointer: u64) -> Result<XMaterial> {
        self.decoder(reader).decode_material(pointer)
    }

    fn decode_image(&self, reader: &dyn ReadMemory, descriptor: &AssetDescriptor) -> Result<XImageSpec> {
        self.decoder(reader).decode_image(descriptor)
    }

    fn decode_sound(&self, reader: &dyn ReadMemory, descriptor: &AssetDescriptor) -> Result<XSoundSpec> {
        self.decoder(reader).decode_sound(descriptor)
    }

    fn decode_rawfile(&self, reader: &dyn ReadMemory, descriptor: &AssetDescriptor) -> Result<XRawFile> {
        self.decoder(reader).decode_rawfile(descriptor)
    }

    fn string_entry(
        &self,
        reader: &dyn ReadMemory,
        offsets: &ResolvedOffsets,
        index: u64,
    ) -> Result<String> {
        OffsetResolver::new(reader, self.spec, offsets.mode).string_entry(offsets.tables.string_table, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MockMemoryBuilder, MockMemoryReader};
    use crate::offset::ResolutionSource;
    use crate::pool::AssetStatus;
    use crate::title::{GameTitle, TitleRegistry};

    const MODEL: u64 = 0x134;
    const POOL: u64 = 0x20000;

    fn mw3() -> TitleSupport {
        TitleSupport::new(TitleRegistry::builtin().get(GameTitle::ModernWarfare3).unwrap())
    }

    /// MW3 SP tables with a three-record model pool
    fn mw3_reader() -> MockMemoryReader {
        let tables = mw3().spec().single_player[0];
        let mut builder = MockMemoryBuilder::new()
            // slot 4 points at the free-list head, records follow it
            .write_u32(tables.pool_table + 4 * 4, (POOL - 4) as u32)
            .write_u32(tables.pool_size_table + 4 * 4, 3)
            .write_cstring(tables.string_table + 16 * 2 + 4, "so_survival")
            .zeroed(POOL, (MODEL * 3) as usize);
        for (i, (name, bone_ids)) in [("void", 0u32), ("helmet_mk1", 0), ("vehicle_tank", 0x7000)]
            .iter()
            .enumerate()
        {
            let slot = POOL + MODEL * i as u64;
            let string = 0x80000 + 0x40 * i as u64;
            builder = builder
                .write_u32(slot, string as u32)
                .write_cstring(string, name)
                .write_u8(slot + 4, 1)
                .write_u8(slot + 0xF1, 1)
                .write_u32(slot + 0x24, *bone_ids);
        }
        builder.build()
    }

    #[test]
    fn test_resolve_then_enumerate_models() {
        let support = mw3();
        let reader = mw3_reader();
        let offsets = support
            .resolve(&reader, GameMode::SinglePlayer, None)
            .unwrap();
        assert_eq!(offsets.source, ResolutionSource::Static(0));

        let models: Vec<_> = support
            .enumerate(&reader, &offsets, AssetKind::Model, false)
            .unwrap()
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].name, "vehicle_tank");
        assert_eq!(models[0].status, AssetStatus::Loaded);
        assert_eq!(models[0].source_pointer, POOL + 2 * MODEL);

        assert_eq!(
            support.string_entry(&reader, &offsets, 2).unwrap(),
            "so_survival"
        );
    }

    #[test]
    fn test_missing_pools_enumerate_nothing() {
        let support = mw3();
        let reader = mw3_reader();
        let offsets = support
            .resolve(&reader, GameMode::SinglePlayer, None)
            .unwrap();
        assert!(support
            .enumerate(&reader, &offsets, AssetKind::Image, false)
            .unwrap()
            .is_none());
        assert!(support
            .enumerate(&reader, &offsets, AssetKind::Material, false)
            .unwrap()
            .is_none());
    }
}
