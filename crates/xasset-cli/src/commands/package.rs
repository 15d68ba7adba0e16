//! Package commands: inspect and extract archive entries without a game.

use std::fs;
use std::path::Path;

use anyhow::{Result, anyhow, bail};
use xasset_core::package::iwd_key;
use xasset_core::{PackageCache, PackageFlavor, open_package_cache};

fn open(flavor: PackageFlavor, path: &Path) -> Result<Box<dyn PackageCache>> {
    open_package_cache(flavor, path)?
        .ok_or_else(|| anyhow!("{} is not a package flavor", flavor))
}

/// List index entries, sorted by key
pub fn list(flavor: PackageFlavor, path: &Path, limit: Option<usize>) -> Result<()> {
    let cache = open(flavor, path)?;
    let mut entries = cache.index().entries();
    entries.sort_by_key(|(key, _)| *key);

    println!("{} {} entries in {}", entries.len(), flavor, path.display());
    for (key, entry) in entries.iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "  {:016X}  archive {:>3}  offset {:#012x}  {:>10} -> {:>10} bytes",
            key, entry.archive, entry.offset, entry.compressed_size, entry.uncompressed_size
        );
    }
    if let Some(limit) = limit.filter(|l| *l < entries.len()) {
        println!("  ... and {} more", entries.len() - limit);
    }
    Ok(())
}

/// Extract one entry by key, or by file name for IWD archives
pub fn extract(
    flavor: PackageFlavor,
    path: &Path,
    key: Option<u64>,
    name: Option<&str>,
    output: &Path,
) -> Result<()> {
    let key = match (key, name) {
        (Some(key), _) => key,
        (None, Some(name)) if flavor == PackageFlavor::Iwd => iwd_key(name),
        (None, Some(_)) => bail!("{} entries can only be extracted by --key", flavor),
        (None, None) => bail!("Either --key or --name is required"),
    };

    let cache = open(flavor, path)?;
    let bytes = cache.extract(key)?;
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, &bytes)?;
    println!("Extracted {:016X} ({} bytes) to {}", key, bytes.len(), output.display());
    Ok(())
}
