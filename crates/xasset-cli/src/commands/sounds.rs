//! Sound bank commands: list and extract `.sabs`/`.sabl` entries directly.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use tracing::warn;
use xasset_core::decode::file_sound_spec;
use xasset_core::transcode::SoundFormat;
use xasset_core::{AssetDescriptor, AssetSink, ExportedAsset, SoundBank, translate_sound};

use super::{describe, matches_filter};
use crate::shutdown::ShutdownSignal;
use crate::sink::FileSink;

/// List the entries of a sound bank
pub fn list(bank: &Path, skip_blank: bool, filter: Option<&str>) -> Result<()> {
    let bank = SoundBank::open(bank, skip_blank)?;
    println!("Sound bank version {:#x}", bank.version());
    for descriptor in bank.descriptors().iter().filter(|d| matches_filter(d, filter)) {
        println!("  {:<48} {}", descriptor.name, describe(&descriptor.detail));
    }
    Ok(())
}

fn export_one(bank: &SoundBank, descriptor: &AssetDescriptor, sink: &FileSink) -> xasset_core::Result<()> {
    let spec = file_sound_spec(descriptor)?;
    let offset = descriptor.source_pointer;
    let bytes = bank.read_payload(offset, spec.size)?;
    let audio = translate_sound(&bytes, spec.codec, &SoundFormat::from(&spec))?;
    sink.write(descriptor, &ExportedAsset::Sound { spec, audio })
}

/// Extract the entries of a sound bank to `output`
pub fn extract(bank: &Path, output: &Path, skip_blank: bool, filter: Option<&str>) -> Result<()> {
    let signal = ShutdownSignal::install_ctrlc()?;
    let bank = SoundBank::open(bank, skip_blank)?;
    let sink = FileSink::new(output);

    let (mut exported, mut failed) = (0usize, 0usize);
    for descriptor in bank.descriptors().iter().filter(|d| matches_filter(d, filter)) {
        if signal.is_shutdown() {
            break;
        }
        match export_one(&bank, descriptor, &sink) {
            Ok(()) => exported += 1,
            Err(e) => {
                warn!("Failed to export {}: {}", descriptor.name, e);
                failed += 1;
            }
        }
    }

    println!(
        "{} {} exported, {} failed -> {}",
        "Done:".green(),
        exported,
        failed,
        output.display()
    );
    Ok(())
}
