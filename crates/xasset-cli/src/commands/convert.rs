//! Convert command: turn a standalone `.iwi` texture into a DDS file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use xasset_core::transcode::translate_iwi;

use crate::sink::dds_bytes;

/// `input` with its extension replaced by `.dds`
fn default_output(input: &Path) -> PathBuf {
    input.with_extension("dds")
}

/// Run the convert command
pub fn run(input: &Path, output: Option<&Path>) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let image = translate_iwi(&bytes)?;
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| default_output(input));

    fs::write(&output, dds_bytes(&image)?)?;
    println!(
        "Converted {} ({}x{}, {} mips) to {}",
        input.display(),
        image.width,
        image.height,
        image.mip_levels,
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_replaces_extension() {
        assert_eq!(
            default_output(Path::new("images/~-gweapon_ak47_col.iwi")),
            PathBuf::from("images/~-gweapon_ak47_col.dds")
        );
    }
}
