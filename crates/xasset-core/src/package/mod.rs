//! Package archives holding streamed asset payloads.
//!
//! Every flavor parses its index once into a key → entry map and re-reads
//! the archive bytes on each [`PackageCache::extract`]. Archive handles are
//! opened lazily, shared read-only, and only read positionally.

mod archive;
mod blocks;
mod compress;
mod index;
mod ipak;
mod iwd;
mod sab;
mod xpak;
mod xptoc;

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::Result;

pub use archive::ArchiveSet;
pub use compress::{decompress_lz4, decompress_lzo, inflate};
pub use index::{DuplicatePolicy, PackageEntry, PackageIndex};
pub use ipak::IpakCache;
pub use iwd::{IwdCache, iwd_key};
pub use sab::{SoundBank, sound_name_hash};
pub use xpak::XpakCache;
pub use xptoc::{XptocCache, xptoc_key};

/// Archive flavor a title stores its streamed payloads in
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PackageFlavor {
    Iwd,
    Xpak,
    Ipak,
    Xptoc,
    #[default]
    None,
}

impl PackageFlavor {
    /// File extension of the archives of this flavor
    pub fn extension(self) -> Option<&'static str> {
        match self {
            PackageFlavor::Iwd => Some("iwd"),
            PackageFlavor::Xpak => Some("xpak"),
            PackageFlavor::Ipak => Some("ipak"),
            PackageFlavor::Xptoc => Some("toc"),
            PackageFlavor::None => None,
        }
    }
}

/// Index of one archive set plus extraction of its payloads
pub trait PackageCache: Send + Sync {
    fn flavor(&self) -> PackageFlavor;

    /// Parse the index of one archive file, or of every matching archive in
    /// a directory, and merge it into the cache
    fn load_index(&mut self, path: &Path) -> Result<()>;

    /// Payload stored under `key`, decompressed. Absent keys fail with
    /// [`Error::NotFound`](crate::error::Error::NotFound).
    fn extract(&self, key: u64) -> Result<Vec<u8>>;

    fn index(&self) -> &PackageIndex;

    fn contains(&self, key: u64) -> bool {
        self.index().get(key).is_some()
    }

    fn len(&self) -> usize {
        self.index().len()
    }

    fn is_empty(&self) -> bool {
        self.index().is_empty()
    }
}

/// Empty cache of `flavor`, ready for [`PackageCache::load_index`]
pub fn package_cache_for(flavor: PackageFlavor) -> Option<Box<dyn PackageCache>> {
    match flavor {
        PackageFlavor::Iwd => Some(Box::new(IwdCache::new())),
        PackageFlavor::Xpak => Some(Box::new(XpakCache::new())),
        PackageFlavor::Ipak => Some(Box::new(IpakCache::new())),
        PackageFlavor::Xptoc => Some(Box::new(XptocCache::new())),
        PackageFlavor::None => None,
    }
}

/// Open and index the archives of `flavor` under `path`
pub fn open_package_cache(flavor: PackageFlavor, path: &Path) -> Result<Option<Box<dyn PackageCache>>> {
    let Some(mut cache) = package_cache_for(flavor) else {
        return Ok(None);
    };
    cache.load_index(path)?;
    Ok(Some(cache))
}

/// Archive files to index for `path`: the file itself, or every file in the
/// directory with `extension`, sorted by name
pub(crate) fn archive_paths(path: &Path, extension: &str) -> Result<Vec<std::path::PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry_path = entry?.path();
        let matches = entry_path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if matches && entry_path.is_file() {
            paths.push(entry_path);
        }
    }
    paths.sort();
    Ok(paths)
}
