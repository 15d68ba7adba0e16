//! Asset table resolution for an attached title
//!
//! Static candidates for the running build are tried first; if none of them
//! verifies, the code signatures of the title are scanned and the heuristic
//! result goes through the same verification.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, ResolutionError, Result};
use crate::memory::ReadMemory;
use crate::pool::{AssetKind, PoolSpan};
use crate::schema::Record;
use crate::title::{GameMode, GameTitle, PoolShape, TableAddresses, TitleSpec};

use super::{
    Addressing, BuildKey, CodeSignature, OffsetCache, OffsetSignatureSet, ScanRegion,
    SignatureScanner,
};

/// Where a set of resolved tables came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Built-in candidate at this index
    Static(usize),
    Heuristic,
    Cache,
}

/// Verified, absolute table addresses for one attached title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedOffsets {
    pub title: GameTitle,
    pub mode: GameMode,
    pub tables: TableAddresses,
    pub source: ResolutionSource,
}

impl ResolvedOffsets {
    pub fn is_valid(&self) -> bool {
        self.tables.pool_table != 0 && self.tables.string_table != 0
    }
}

/// Location of one asset pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolLocation {
    Fixed(PoolSpan),
    Linked { root: u64, record_size: u64 },
}

pub struct OffsetResolver<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
    spec: &'a TitleSpec,
    mode: GameMode,
}

impl<'a, R: ReadMemory + ?Sized> OffsetResolver<'a, R> {
    pub fn new(reader: &'a R, spec: &'a TitleSpec, mode: GameMode) -> Self {
        Self { reader, spec, mode }
    }

    /// Resolve and verify the asset tables.
    ///
    /// Losing the source mid-resolution is reported as
    /// [`ResolutionError::NoGamesRunning`]; exhausting every candidate as
    /// [`ResolutionError::FailedToLocateInfo`].
    pub fn resolve(&self) -> Result<ResolvedOffsets> {
        match self.resolve_inner() {
            Err(Error::NotAccessible(message)) => {
                warn!("Source lost during resolution: {}", message);
                Err(ResolutionError::NoGamesRunning.into())
            }
            other => other,
        }
    }

    /// Resolve, trying a cached table set for this build first.
    ///
    /// Cached tables go through the same verification as static candidates;
    /// a stale entry is replaced by the freshly resolved tables.
    pub fn resolve_cached(&self, cache_path: &Path) -> Result<ResolvedOffsets> {
        let key = self.build_key();
        let mut cache = OffsetCache::open(cache_path);
        if let Some(cached) = cache.lookup(&key) {
            if self.verify(&cached.tables)? {
                return Ok(cached);
            }
            warn!("Cached tables for {} no longer verify, resolving again", key);
            cache.forget(&key);
        }

        let resolved = self.resolve()?;
        cache.record(&key, resolved.tables);
        if let Err(e) = cache.save(cache_path) {
            warn!("Failed to save offset cache: {}", e);
        }
        Ok(resolved)
    }

    fn build_key(&self) -> BuildKey {
        BuildKey {
            title: self.spec.title,
            mode: self.mode,
            module_base: self.reader.base_address(),
            module_size: self.reader.module_size(),
        }
    }

    fn resolve_inner(&self) -> Result<ResolvedOffsets> {
        let title = self.spec.title;
        debug!("Resolving asset tables for {} {}...", title, self.mode);

        // Phase 1: built-in candidates
        debug!("Phase 1: Trying static candidates...");
        for (index, candidate) in self.spec.candidates(self.mode).iter().enumerate() {
            let tables = if self.spec.module_relative {
                candidate.rebased(self.reader.base_address())
            } else {
                *candidate
            };
            if self.verify(&tables)? {
                info!("Using static tables #{} for {} {}", index, title, self.mode);
                return Ok(self.resolved(tables, ResolutionSource::Static(index)));
            }
            debug!("  Candidate #{} rejected", index);
        }

        // Phase 2: code signatures
        debug!("Phase 2: Searching tables via signatures...");
        let signatures = (self.spec.signatures)(self.mode);
        match self.search_tables_by_signature(&signatures) {
            Ok(tables) => {
                info!("Located tables for {} {} via signatures", title, self.mode);
                Ok(self.resolved(tables, ResolutionSource::Heuristic))
            }
            Err(e @ Error::NotAccessible(_)) => Err(e),
            Err(e) => {
                warn!("Signature search failed: {}", e);
                Err(ResolutionError::FailedToLocateInfo(format!("{} {}", title, self.mode)).into())
            }
        }
    }

    fn resolved(&self, tables: TableAddresses, source: ResolutionSource) -> ResolvedOffsets {
        ResolvedOffsets {
            title: self.spec.title,
            mode: self.mode,
            tables,
            source,
        }
    }

    /// Check a table set: the first model record must carry one of the
    /// title's verification names and string entry 2 must be non-blank.
    ///
    /// Unreadable addresses reject the candidate; a lost source is an error.
    pub fn verify(&self, tables: &TableAddresses) -> Result<bool> {
        soften(self.verify_inner(tables))
    }

    fn verify_inner(&self, tables: &TableAddresses) -> Result<bool> {
        if tables.pool_table == 0 || tables.string_table == 0 {
            return Ok(false);
        }

        let Some(first) = self.first_record(tables, AssetKind::Model)? else {
            return Ok(false);
        };
        let name_field = self.spec.layouts.model.name;
        let name_ptr = self
            .reader
            .read_ptr(first + name_field.offset, self.spec.pointer)?;
        let name = self.reader.read_cstring(name_ptr)?;
        if !self.spec.verify_names.contains(&name.as_str()) {
            debug!("  First model is {:?}, not a verification name", name);
            return Ok(false);
        }

        let entry = self.string_entry(tables.string_table, 2)?;
        Ok(!entry.trim().is_empty())
    }

    /// Address of the first record of a pool, `None` for an empty pool
    fn first_record(&self, tables: &TableAddresses, kind: AssetKind) -> Result<Option<u64>> {
        match self.locate_pool(tables, kind)? {
            Some(PoolLocation::Fixed(span)) if span.count > 0 => Ok(Some(span.base)),
            Some(PoolLocation::Linked { root, .. }) => {
                let node = self.reader.read_ptr(root, self.spec.pointer)?;
                if node == 0 {
                    return Ok(None);
                }
                Ok(Some(self.reader.read_ptr(node, self.spec.pointer)?))
            }
            _ => Ok(None),
        }
    }

    /// Locate the pool of `kind`, `None` when the title has no such pool
    pub fn locate_pool(&self, tables: &TableAddresses, kind: AssetKind) -> Result<Option<PoolLocation>> {
        let (Some(index), Some(record_size)) =
            (self.spec.pool_index(kind), self.spec.record_size(kind))
        else {
            return Ok(None);
        };
        let index = index as u64;
        let pointer = self.spec.pointer;

        let location = match self.spec.pool_shape {
            PoolShape::PointerArray { header_skip } => {
                let pool = self
                    .reader
                    .read_ptr(tables.pool_table + pointer.bytes() as u64 * index, pointer)?;
                let count = if tables.pool_size_table == 0 {
                    0
                } else {
                    self.reader.read_u32(tables.pool_size_table + 4 * index)?
                };
                PoolLocation::Fixed(PoolSpan::new(pool + header_skip, record_size, count))
            }
            PoolShape::PoolData {
                record_size: data_size,
                pool,
                capacity,
            } => {
                let data = Record::read(
                    self.reader,
                    tables.pool_table + data_size * index,
                    data_size,
                    pointer,
                )?;
                PoolLocation::Fixed(PoolSpan::new(
                    data.get(pool)?,
                    record_size,
                    data.get_u32(capacity)?,
                ))
            }
            PoolShape::LinkedRoots { root_size } => PoolLocation::Linked {
                root: tables.pool_table + root_size * index,
                record_size,
            },
        };
        Ok(Some(location))
    }

    /// Inline string at entry `index` of the string table
    pub fn string_entry(&self, string_table: u64, index: u64) -> Result<String> {
        let address = self
            .spec
            .strings
            .entry_address(string_table, self.mode, index);
        self.reader.read_cstring(address)
    }

    fn search_tables_by_signature(&self, signatures: &OffsetSignatureSet) -> Result<TableAddresses> {
        let mut tables = TableAddresses::default();

        debug!("  Searching stringTable...");
        tables.string_table = self.search_offset_by_signature(signatures, "stringTable", |this, addr| {
            this.string_entry(addr, 2)
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false)
        })?;
        debug!("  stringTable: 0x{:X}", tables.string_table);

        if signatures.entry("poolSizeTable").is_some() {
            debug!("  Searching poolSizeTable...");
            let model = self.spec.pool_index(AssetKind::Model).unwrap_or(0) as u64;
            tables.pool_size_table =
                self.search_offset_by_signature(signatures, "poolSizeTable", |this, addr| {
                    this.reader.read_u32(addr + 4 * model).is_ok_and(|n| n > 0)
                })?;
            debug!("  poolSizeTable: 0x{:X}", tables.pool_size_table);
        }

        debug!("  Searching poolTable...");
        tables.pool_table = self.search_offset_by_signature(signatures, "poolTable", |this, addr| {
            let candidate = TableAddresses {
                pool_table: addr,
                ..tables
            };
            this.verify(&candidate).unwrap_or(false)
        })?;
        debug!("  poolTable: 0x{:X}", tables.pool_table);

        Ok(tables)
    }

    fn search_offset_by_signature<F>(
        &self,
        signatures: &OffsetSignatureSet,
        name: &str,
        validate: F,
    ) -> Result<u64>
    where
        F: Fn(&Self, u64) -> bool,
    {
        let entry = signatures.entry(name).ok_or_else(|| {
            Error::OffsetSearchFailed(format!("Signature entry '{}' not found", name))
        })?;

        for signature in &entry.signatures {
            let candidates = self.resolve_signature_targets(signature)?;
            if !candidates.is_empty() {
                debug!(
                    "  {}: signature {} found {} raw candidates: {:X?}",
                    name,
                    signature.pattern,
                    candidates.len(),
                    &candidates[..candidates.len().min(5)]
                );
            }

            let mut valid: Vec<u64> = candidates
                .into_iter()
                .filter(|addr| validate(self, *addr))
                .collect();
            if !valid.is_empty() {
                valid.sort_unstable();
                debug!("  {}: selected 0x{:X} ({} valid)", name, valid[0], valid.len());
                return Ok(valid[0]);
            }
        }

        Err(Error::OffsetSearchFailed(format!(
            "No valid candidates found for {} via signatures",
            name
        )))
    }

    fn resolve_signature_targets(&self, signature: &CodeSignature) -> Result<Vec<u64>> {
        let pattern = signature.pattern_bytes()?;
        let matches = SignatureScanner::new(self.reader)
            .scan(&pattern, ScanRegion::main_module(self.reader))?;
        let mut targets = Vec::new();

        for match_addr in matches {
            let instr_addr = match_addr.wrapping_add_signed(signature.instr_offset);
            let operand_addr = instr_addr + signature.disp_offset as u64;

            let mut target = match signature.addressing {
                Addressing::Relative => match self.reader.read_i32(operand_addr) {
                    Ok(disp) => (instr_addr + signature.instr_len as u64).wrapping_add_signed(disp as i64),
                    Err(_) => continue,
                },
                Addressing::Absolute => match self.reader.read_u32(operand_addr) {
                    Ok(value) => value as u64,
                    Err(_) => continue,
                },
            };

            if signature.deref {
                match self.reader.read_ptr(target, self.spec.pointer) {
                    Ok(ptr) => target = ptr,
                    Err(_) => continue,
                }
            }
            if signature.add_module_base {
                target = target.wrapping_add(self.reader.base_address());
            }
            if signature.addend != 0 {
                target = target.wrapping_add_signed(signature.addend);
            }

            if target != 0 {
                targets.push(target);
            }
        }

        targets.sort_unstable();
        targets.dedup();
        Ok(targets)
    }
}

/// Turn read failures into a rejection, keep losing the source as an error
fn soften(result: Result<bool>) -> Result<bool> {
    match result {
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            debug!("  Verification read failed: {}", e);
            Ok(false)
        }
        ok => ok,
    }
}
