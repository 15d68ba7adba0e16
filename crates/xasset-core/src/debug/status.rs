use serde::Serialize;

use crate::memory::ReadMemory;
use crate::offset::{OffsetResolver, PoolLocation, ResolvedOffsets};
use crate::pool::AssetKind;
use crate::title::{GameMode, GameTitle, TitleSpec};

#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub kind: AssetKind,
    pub slot: u32,
    /// First record (fixed pools) or list root (linked pools)
    pub address: u64,
    pub stride: u64,
    /// `None` for linked pools and unreadable slots
    pub capacity: Option<u32>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub title: GameTitle,
    pub mode: GameMode,
    pub module_base: u64,
    pub module_size: u64,
    pub offsets: ResolvedOffsets,
    pub tables_verified: bool,
    pub string_sample: Option<String>,
    pub pools: Vec<PoolStatus>,
}

impl StatusInfo {
    pub fn collect<R: ReadMemory + ?Sized>(
        reader: &R,
        spec: &'static TitleSpec,
        offsets: &ResolvedOffsets,
    ) -> Self {
        let resolver = OffsetResolver::new(reader, spec, offsets.mode);

        let pools = spec
            .pools
            .iter()
            .map(|slot| {
                let mut status = PoolStatus {
                    kind: slot.kind,
                    slot: slot.index,
                    address: 0,
                    stride: spec.record_size(slot.kind).unwrap_or(0),
                    capacity: None,
                    error: None,
                };
                match resolver.locate_pool(&offsets.tables, slot.kind) {
                    Ok(Some(PoolLocation::Fixed(span))) => {
                        status.address = span.base;
                        status.capacity = Some(span.count);
                    }
                    Ok(Some(PoolLocation::Linked { root, .. })) => status.address = root,
                    Ok(None) => {}
                    Err(e) => status.error = Some(e.to_string()),
                }
                status
            })
            .collect();

        Self {
            title: spec.title,
            mode: offsets.mode,
            module_base: reader.base_address(),
            module_size: reader.module_size(),
            offsets: offsets.clone(),
            tables_verified: resolver.verify(&offsets.tables).unwrap_or(false),
            string_sample: resolver.string_entry(offsets.tables.string_table, 2).ok(),
            pools,
        }
    }
}
