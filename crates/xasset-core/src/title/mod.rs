//! Supported titles and their declarative descriptions.
//!
//! A [`TitleSpec`] bundles everything that differs between releases: static
//! table candidates, heuristic code signatures, pool slot indices, record
//! layouts and placeholder rules. [`TitleSupport`] interprets a spec and
//! implements the [`GameSupport`] capability interface once for all titles.

mod bo2;
mod bo3;
mod ghosts;
mod mw2;
mod mw3;
mod registry;
mod support;
mod waw;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::memory::PointerWidth;
use crate::offset::OffsetSignatureSet;
use crate::package::PackageFlavor;
use crate::pool::AssetKind;
use crate::schema::{Field, TitleLayouts};

pub use registry::{TitleRegistry, builtin_titles, detect_title};
pub use support::{GameSupport, TitleSupport};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum GameTitle {
    #[strum(serialize = "waw", to_string = "World at War")]
    WorldAtWar,
    #[strum(serialize = "mw2", to_string = "Modern Warfare 2")]
    ModernWarfare2,
    #[strum(serialize = "mw3", to_string = "Modern Warfare 3")]
    ModernWarfare3,
    #[strum(serialize = "bo2", to_string = "Black Ops 2")]
    BlackOps2,
    #[strum(serialize = "ghosts", to_string = "Ghosts")]
    Ghosts,
    #[strum(serialize = "bo3", to_string = "Black Ops 3")]
    BlackOps3,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum GameMode {
    #[strum(serialize = "sp", to_string = "SP")]
    SinglePlayer,
    #[strum(serialize = "mp", to_string = "MP")]
    MultiPlayer,
    #[strum(serialize = "zm", to_string = "ZM")]
    Zombies,
}

/// One candidate set of table addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableAddresses {
    pub pool_table: u64,
    pub pool_size_table: u64,
    pub string_table: u64,
    pub package_table: u64,
}

impl TableAddresses {
    pub const fn new(pool_table: u64, pool_size_table: u64, string_table: u64) -> Self {
        Self {
            pool_table,
            pool_size_table,
            string_table,
            package_table: 0,
        }
    }

    pub const fn with_package_table(mut self, package_table: u64) -> Self {
        self.package_table = package_table;
        self
    }

    /// Shift every non-zero address by the module base
    pub fn rebased(&self, base: u64) -> Self {
        let shift = |addr: u64| if addr == 0 { 0 } else { base + addr };
        Self {
            pool_table: shift(self.pool_table),
            pool_size_table: shift(self.pool_size_table),
            string_table: shift(self.string_table),
            package_table: shift(self.package_table),
        }
    }
}

/// Shape of the pool table the resolved `pool_table` address points at
#[derive(Debug, Clone, Copy)]
pub enum PoolShape {
    /// Array of pool pointers with a parallel `u32` capacity array.
    /// Each pool starts with a free-list head pointer of `header_skip` bytes.
    PointerArray { header_skip: u64 },
    /// Array of fixed-size pool-data records carrying pointer and capacity
    PoolData {
        record_size: u64,
        pool: Field,
        capacity: Field,
    },
    /// Array of linked-list roots; records hang off `{header, temp, next, previous}` nodes
    LinkedRoots { root_size: u64 },
}

#[derive(Debug, Clone, Copy)]
pub struct PoolSlot {
    pub kind: AssetKind,
    pub index: u32,
}

/// String table entry addressing: `stride * index + table + offset`.
/// Zombies builds use the multiplayer stride.
#[derive(Debug, Clone, Copy)]
pub struct StringTableLayout {
    pub sp_stride: u64,
    pub mp_stride: u64,
    pub offset: u64,
}

impl StringTableLayout {
    pub fn entry_address(&self, table: u64, mode: GameMode, index: u64) -> u64 {
        let stride = match mode {
            GameMode::SinglePlayer => self.sp_stride,
            GameMode::MultiPlayer | GameMode::Zombies => self.mp_stride,
        };
        stride * index + table + self.offset
    }
}

/// Names and prefixes marking placeholder records per kind
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderRules {
    pub anim_sentinels: &'static [&'static str],
    pub model_sentinels: &'static [&'static str],
    pub model_prefixes: &'static [&'static str],
}

/// Semantic hashes mapping material image slots to usages
#[derive(Debug, Clone, Copy)]
pub struct UsageHashes {
    pub diffuse: u32,
    pub normal: u32,
    pub specular: u32,
}

/// Static description of one title
#[derive(Debug, Clone, Copy)]
pub struct TitleSpec {
    pub title: GameTitle,
    pub executables: &'static [(&'static str, GameMode)],
    pub pointer: PointerWidth,
    /// Static candidates are relative to the main module base
    pub module_relative: bool,
    pub single_player: &'static [TableAddresses],
    pub multi_player: &'static [TableAddresses],
    pub zombies: &'static [TableAddresses],
    pub signatures: fn(GameMode) -> OffsetSignatureSet,
    pub pool_shape: PoolShape,
    pub pools: &'static [PoolSlot],
    /// Accepted names of the first model record
    pub verify_names: &'static [&'static str],
    pub strings: StringTableLayout,
    pub layouts: TitleLayouts,
    pub placeholders: PlaceholderRules,
    pub usage_hashes: UsageHashes,
    pub package: PackageFlavor,
}

impl TitleSpec {
    pub fn candidates(&self, mode: GameMode) -> &'static [TableAddresses] {
        match mode {
            GameMode::SinglePlayer => self.single_player,
            GameMode::MultiPlayer => self.multi_player,
            GameMode::Zombies => self.zombies,
        }
    }

    pub fn supports_mode(&self, mode: GameMode) -> bool {
        self.executables.iter().any(|(_, m)| *m == mode)
    }

    pub fn pool_index(&self, kind: AssetKind) -> Option<u32> {
        self.pools.iter().find(|p| p.kind == kind).map(|p| p.index)
    }

    /// Size of one record of `kind`, if the title has such a pool
    pub fn record_size(&self, kind: AssetKind) -> Option<u64> {
        let layouts = &self.layouts;
        match kind {
            AssetKind::Animation => Some(layouts.anim.size),
            AssetKind::Model => Some(layouts.model.size),
            AssetKind::Image => layouts.image.map(|l| l.size),
            AssetKind::Sound => layouts.sound.map(|l| l.size),
            AssetKind::RawFile => layouts.rawfile.map(|l| l.size),
            AssetKind::Material => None,
        }
    }

    /// Mode implied by a running executable name
    pub fn mode_for_executable(&self, exe: &str) -> Option<GameMode> {
        self.executables
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(exe))
            .map(|(_, mode)| *mode)
    }
}
