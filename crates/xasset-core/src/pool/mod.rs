//! Asset pool enumeration.
//!
//! A pool is a contiguous array of fixed-size records (or, on newer engines,
//! a linked list of records) the game fills as it loads assets. Walking a pool
//! yields one [`AssetDescriptor`] per live, non-placeholder record.

mod describe;
mod descriptor;
mod placeholder;
mod walker;

pub use describe::LayoutDescriber;
pub use descriptor::{AssetDescriptor, AssetDetail, AssetKind, AssetStatus};
pub use placeholder::PlaceholderFilter;
pub use walker::{
    AssetPoolWalker, FixedPoolWalker, LinkedLayout, LinkedPoolWalker, PoolRecord, PoolSpan,
    RecordSource,
};
