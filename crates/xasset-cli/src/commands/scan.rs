//! Scan command: report raw matches of the code signatures.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use xasset_core::{ScanResult, load_signatures};

use crate::source::SourceArgs;

/// Matches shown per signature
const MAX_SHOWN: usize = 8;

/// Run the scan command
pub fn run(source: &SourceArgs, signatures: Option<&Path>, json: bool) -> Result<()> {
    source.with_target(|target| {
        let signatures = match signatures {
            Some(path) => load_signatures(path)?,
            None => (target.spec.signatures)(target.mode),
        };
        let result = ScanResult::collect(target.reader, &signatures)?;

        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        println!(
            "Signature set {} over {:#X}..{:#X}",
            result.signature_set,
            result.region_start,
            result.region_start + result.region_len
        );
        for hit in &result.hits {
            let count = match hit.matches.len() {
                1 => "1 match".green().to_string(),
                0 => "no match".red().to_string(),
                n => format!("{} matches", n).yellow().to_string(),
            };
            println!("  {:<16} {}  [{}]", hit.entry, count, hit.pattern);
            for address in hit.matches.iter().take(MAX_SHOWN) {
                println!("      {:#X}", address);
            }
        }
        Ok(())
    })
}
