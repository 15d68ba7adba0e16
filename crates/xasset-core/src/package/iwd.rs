//! `.iwd` archives: plain zip files whose `.iwi` images are indexed by file
//! stem. Later archives in a set override earlier ones, matching how the
//! game layers its patch archives.

use std::fs::File;
use std::path::Path;

use rawzip::{CompressionMethod, RECOMMENDED_BUFFER_SIZE, ZipArchive};
use tracing::{debug, info, trace};
use xxhash_rust::xxh64::xxh64;

use crate::error::{Error, Result};

use super::archive::fits;
use super::compress::inflate;
use super::{ArchiveSet, DuplicatePolicy, PackageCache, PackageEntry, PackageFlavor, PackageIndex, archive_paths};

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATE: u16 = 8;

/// Package key of an image name
pub fn iwd_key(stem: &str) -> u64 {
    xxh64(stem.as_bytes(), 0)
}

fn entry_stem(name: &str) -> Option<&str> {
    let file = name.rsplit(['/', '\\']).next()?;
    let (stem, extension) = file.rsplit_once('.')?;
    extension.eq_ignore_ascii_case("iwi").then_some(stem)
}

fn zip_error(path: &Path, e: rawzip::Error) -> Error {
    Error::UnsupportedFormat(format!("{}: {}", path.display(), e))
}

pub struct IwdCache {
    index: PackageIndex,
    archives: ArchiveSet,
}

impl IwdCache {
    pub fn new() -> Self {
        Self {
            index: PackageIndex::new(DuplicatePolicy::LastWins),
            archives: ArchiveSet::new(),
        }
    }

    /// Extract an image by name, without extension
    pub fn extract_image(&self, name: &str) -> Result<Vec<u8>> {
        self.extract(iwd_key(name))
    }

    fn load_archive(&mut self, path: &Path) -> Result<usize> {
        let archive = self.archives.push(path);
        let len = self.archives.archive_len(archive)?;
        let mut buffer = vec![0u8; RECOMMENDED_BUFFER_SIZE];
        let zip = ZipArchive::from_file(File::open(path)?, &mut buffer).map_err(|e| zip_error(path, e))?;

        let mut images = Vec::new();
        let mut records = zip.entries(&mut buffer);
        while let Some(record) = records.next_entry().map_err(|e| zip_error(path, e))? {
            if record.is_dir() {
                continue;
            }
            let Ok(name) = record.file_path().try_normalize() else {
                continue;
            };
            let Some(stem) = entry_stem(name.as_ref()) else {
                continue;
            };
            let method = match record.compression_method() {
                CompressionMethod::Store => METHOD_STORED,
                CompressionMethod::Deflate => METHOD_DEFLATE,
                other => {
                    debug!("  {}: unsupported method {:?}", name.as_ref(), other);
                    continue;
                }
            };
            trace!("  {} -> {:#x}", name.as_ref(), iwd_key(stem));
            images.push((iwd_key(stem), record.wayfinder(), method, record.uncompressed_size_hint()));
        }

        let mut added = 0;
        for (key, wayfinder, method, uncompressed) in images {
            let (start, end) = zip
                .get_entry(wayfinder)
                .map_err(|e| zip_error(path, e))?
                .compressed_data_range();
            if end < start || !fits(start, end - start, len) {
                return Err(Error::UnsupportedFormat(format!(
                    "{}: entry data {:#x}..{:#x} lies outside the file",
                    path.display(),
                    start,
                    end
                )));
            }
            let mut entry = PackageEntry::new(archive, start, end - start, uncompressed);
            entry.method = method;
            self.index.insert(key, entry);
            added += 1;
        }
        Ok(added)
    }
}

impl Default for IwdCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageCache for IwdCache {
    fn flavor(&self) -> PackageFlavor {
        PackageFlavor::Iwd
    }

    fn load_index(&mut self, path: &Path) -> Result<()> {
        let paths = archive_paths(path, "iwd")?;
        for archive in &paths {
            let added = self.load_archive(archive)?;
            debug!("  {}: {} images", archive.display(), added);
        }
        info!("Indexed {} iwd images from {} archives", self.index.len(), paths.len());
        Ok(())
    }

    fn extract(&self, key: u64) -> Result<Vec<u8>> {
        let entry = self.index.get(key).ok_or(Error::NotFound { key })?;
        let data = self
            .archives
            .read_at(entry.archive, entry.offset, entry.compressed_size as usize)?;
        match entry.method {
            METHOD_STORED => Ok(data),
            METHOD_DEFLATE => inflate(&data, entry.uncompressed_size as usize),
            other => Err(Error::UnsupportedCodec(format!("zip method {}", other))),
        }
    }

    fn index(&self) -> &PackageIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::DeflateEncoder;
    use std::io::Write;
    use tempfile::tempdir;

    const LOCAL_SIGNATURE: u32 = 0x0403_4B50;
    const CENTRAL_SIGNATURE: u32 = 0x0201_4B50;
    const EOCD_SIGNATURE: &[u8] = b"PK\x05\x06";

    /// Minimal zip writer: `(name, data, deflate)`
    fn build_zip(files: &[(&str, &[u8], bool)]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();
        for (name, data, deflate) in files {
            let (method, stored) = if *deflate {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data).unwrap();
                (METHOD_DEFLATE, encoder.finish().unwrap())
            } else {
                (METHOD_STORED, data.to_vec())
            };
            let local_offset = out.len() as u32;

            out.extend_from_slice(&LOCAL_SIGNATURE.to_le_bytes());
            out.extend_from_slice(&[20, 0, 0, 0]);
            out.extend_from_slice(&method.to_le_bytes());
            out.extend_from_slice(&[0u8; 8]);
            out.extend_from_slice(&(stored.len() as u32).to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(&stored);

            central.extend_from_slice(&CENTRAL_SIGNATURE.to_le_bytes());
            central.extend_from_slice(&[20, 0, 20, 0, 0, 0]);
            central.extend_from_slice(&method.to_le_bytes());
            central.extend_from_slice(&[0u8; 8]);
            central.extend_from_slice(&(stored.len() as u32).to_le_bytes());
            central.extend_from_slice(&(data.len() as u32).to_le_bytes());
            central.extend_from_slice(&(name.len() as u16).to_le_bytes());
            central.extend_from_slice(&[0u8; 12]);
            central.extend_from_slice(&local_offset.to_le_bytes());
            central.extend_from_slice(name.as_bytes());
        }

        let directory_offset = out.len() as u32;
        out.extend_from_slice(&central);
        out.extend_from_slice(EOCD_SIGNATURE);
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&(files.len() as u16).to_le_bytes());
        out.extend_from_slice(&(files.len() as u16).to_le_bytes());
        out.extend_from_slice(&(central.len() as u32).to_le_bytes());
        out.extend_from_slice(&directory_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    #[test]
    fn test_entry_stem_only_iwi() {
        assert_eq!(entry_stem("images/~-gweapon_ak47_col.iwi"), Some("~-gweapon_ak47_col"));
        assert_eq!(entry_stem("IMAGES\\foo.IWI"), Some("foo"));
        assert_eq!(entry_stem("sound/foo.wav"), None);
        assert_eq!(entry_stem("images/noext"), None);
    }

    #[test]
    fn test_later_archive_overrides_image() {
        let dir = tempdir().unwrap();
        let base = build_zip(&[
            ("images/wall_col.iwi", b"old wall", false),
            ("images/floor_nml.iwi", &[7u8; 300], true),
            ("maps/readme.txt", b"skip", false),
        ]);
        let patch = build_zip(&[("images/wall_col.iwi", b"patched wall", true)]);
        std::fs::write(dir.path().join("iw_00.iwd"), base).unwrap();
        std::fs::write(dir.path().join("iw_01.iwd"), patch).unwrap();

        let mut cache = IwdCache::new();
        cache.load_index(dir.path()).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.extract_image("wall_col").unwrap(), b"patched wall");
        assert_eq!(cache.extract_image("floor_nml").unwrap(), vec![7u8; 300]);
        assert!(cache.extract_image("readme").unwrap_err().is_not_found());
    }

    #[test]
    fn test_non_zip_is_rejected() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("iw_00.iwd"), vec![0x5Au8; 64]).unwrap();

        let mut cache = IwdCache::new();
        let err = cache.load_index(dir.path()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }
}
