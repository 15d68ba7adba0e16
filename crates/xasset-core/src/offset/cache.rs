//! Table addresses remembered per loaded build.
//!
//! One file holds every build seen so far, keyed by [`BuildKey`], so switching
//! between titles or modes does not throw earlier results away. An entry is
//! only a hint: the resolver verifies it against the live source before use.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::title::{GameMode, GameTitle, TableAddresses};

use super::{ResolutionSource, ResolvedOffsets};

/// Default cache file name
pub const CACHE_FILE: &str = ".xasset-cache.json";

/// Entries older than this are dropped (30 days)
const MAX_ENTRY_AGE_SECS: u64 = 30 * 24 * 60 * 60;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// One loaded build of a title: its mode plus where and how large the main
/// module is mapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildKey {
    pub title: GameTitle,
    pub mode: GameMode,
    pub module_base: u64,
    pub module_size: u64,
}

impl fmt::Display for BuildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} {:#x}+{:#x}",
            self.title, self.mode, self.module_base, self.module_size
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedTables {
    tables: TableAddresses,
    /// Unix seconds
    saved_at: u64,
}

impl CachedTables {
    fn is_fresh(&self, now: u64) -> bool {
        now.saturating_sub(self.saved_at) <= MAX_ENTRY_AGE_SECS
    }
}

/// Every cached build, stored as one JSON object keyed by the build's text form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OffsetCache {
    #[serde(default)]
    builds: BTreeMap<String, CachedTables>,
}

impl OffsetCache {
    /// Read the cache file. A missing or unparsable file is an empty cache.
    pub fn open(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                debug!("No offset cache at {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str::<OffsetCache>(&content) {
            Ok(cache) => {
                debug!("Offset cache holds {} builds", cache.builds.len());
                cache
            }
            Err(e) => {
                warn!("Ignoring unreadable offset cache {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.builds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }

    /// Fresh tables recorded for `key`, marked as coming from the cache
    pub fn lookup(&self, key: &BuildKey) -> Option<ResolvedOffsets> {
        let cached = self.builds.get(&key.to_string())?;
        if !cached.is_fresh(now_secs()) {
            debug!("Cached tables for {} expired", key);
            return None;
        }
        let offsets = ResolvedOffsets {
            title: key.title,
            mode: key.mode,
            tables: cached.tables,
            source: ResolutionSource::Cache,
        };
        if !offsets.is_valid() {
            debug!("Cached tables for {} are incomplete", key);
            return None;
        }
        info!("Using cached tables for {}", key);
        Some(offsets)
    }

    /// Remember `tables` for `key`, replacing any earlier entry
    pub fn record(&mut self, key: &BuildKey, tables: TableAddresses) {
        self.builds.insert(
            key.to_string(),
            CachedTables {
                tables,
                saved_at: now_secs(),
            },
        );
    }

    pub fn forget(&mut self, key: &BuildKey) -> bool {
        self.builds.remove(&key.to_string()).is_some()
    }

    /// Write the cache, dropping expired entries first
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let now = now_secs();
        self.builds.retain(|_, cached| cached.is_fresh(now));
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Saved {} cached builds to {}", self.builds.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn key(title: GameTitle, mode: GameMode, module_size: u64) -> BuildKey {
        BuildKey {
            title,
            mode,
            module_base: 0x40_0000,
            module_size,
        }
    }

    fn tables(pool_table: u64) -> TableAddresses {
        TableAddresses::new(pool_table, 0x8AAF78, 0x1D6FF00)
    }

    #[test]
    fn test_builds_share_one_file() {
        let file = NamedTempFile::new().unwrap();
        let mw3 = key(GameTitle::ModernWarfare3, GameMode::MultiPlayer, 0x63_0000);
        let waw = key(GameTitle::WorldAtWar, GameMode::SinglePlayer, 0x3A_0000);

        let mut cache = OffsetCache::open(file.path());
        cache.record(&mw3, tables(0x8AB258));
        cache.save(file.path()).unwrap();

        let mut cache = OffsetCache::open(file.path());
        cache.record(&waw, tables(0x8DC828));
        cache.save(file.path()).unwrap();

        let cache = OffsetCache::open(file.path());
        assert_eq!(cache.len(), 2);
        let loaded = cache.lookup(&mw3).unwrap();
        assert_eq!(loaded.tables.pool_table, 0x8AB258);
        assert_eq!(loaded.title, GameTitle::ModernWarfare3);
        assert_eq!(loaded.source, ResolutionSource::Cache);
        assert_eq!(cache.lookup(&waw).unwrap().tables.pool_table, 0x8DC828);
    }

    #[test]
    fn test_other_build_misses() {
        let mut cache = OffsetCache::default();
        cache.record(&key(GameTitle::ModernWarfare3, GameMode::MultiPlayer, 0x63_0000), tables(0x8AB258));

        assert!(cache.lookup(&key(GameTitle::ModernWarfare3, GameMode::MultiPlayer, 0x64_0000)).is_none());
        assert!(cache.lookup(&key(GameTitle::ModernWarfare3, GameMode::SinglePlayer, 0x63_0000)).is_none());
    }

    #[test]
    fn test_incomplete_tables_are_not_used() {
        let build = key(GameTitle::ModernWarfare3, GameMode::MultiPlayer, 0x63_0000);
        let mut cache = OffsetCache::default();
        cache.record(&build, tables(0));
        assert!(cache.lookup(&build).is_none());
    }

    #[test]
    fn test_expired_entries_are_dropped_on_save() {
        let file = NamedTempFile::new().unwrap();
        let old = key(GameTitle::ModernWarfare2, GameMode::SinglePlayer, 0x50_0000);
        let new = key(GameTitle::ModernWarfare3, GameMode::SinglePlayer, 0x50_0000);

        let mut cache = OffsetCache::default();
        cache.record(&old, tables(0x1000));
        cache.record(&new, tables(0x2000));
        cache.builds.get_mut(&old.to_string()).unwrap().saved_at = 0;
        assert!(cache.lookup(&old).is_none());

        cache.save(file.path()).unwrap();
        let cache = OffsetCache::open(file.path());
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup(&new).is_some());
    }

    #[test]
    fn test_forget_removes_entry() {
        let build = key(GameTitle::BlackOps3, GameMode::SinglePlayer, 0x1000_0000);
        let mut cache = OffsetCache::default();
        cache.record(&build, tables(0x1_493F_A290));
        assert!(cache.forget(&build));
        assert!(!cache.forget(&build));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_corrupt_cache_is_empty() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{ not json").unwrap();
        assert!(OffsetCache::open(file.path()).is_empty());
    }
}
