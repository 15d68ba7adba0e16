//! Resolve command: locate and verify the asset tables of a game.

use anyhow::Result;
use owo_colors::OwoColorize;
use xasset_core::{ExtractConfig, GameSupport, StatusInfo, TitleSupport};

use crate::source::SourceArgs;

/// Run the resolve command
pub fn run(source: &SourceArgs, config: &ExtractConfig, json: bool) -> Result<()> {
    source.with_target(|target| {
        let support = TitleSupport::new(target.spec);
        let offsets = support.resolve(
            target.reader,
            target.mode,
            config.offset_cache_path.as_deref(),
        )?;
        let status = StatusInfo::collect(target.reader, target.spec, &offsets);

        if json {
            println!("{}", serde_json::to_string_pretty(&status)?);
            return Ok(());
        }

        println!("{} {} {}", "Title:".bold(), status.title, status.mode);
        println!(
            "{} {:#X} ({} bytes)",
            "Module:".bold(),
            status.module_base,
            status.module_size
        );
        println!("{} {:?}", "Source:".bold(), offsets.source);
        println!();
        println!("=== Tables ===");
        println!("  pools:      {:#X}", offsets.tables.pool_table);
        println!("  pool sizes: {:#X}", offsets.tables.pool_size_table);
        println!("  strings:    {:#X}", offsets.tables.string_table);
        println!("  packages:   {:#X}", offsets.tables.package_table);
        match status.tables_verified {
            true => println!("  {}", "verified".green()),
            false => println!("  {}", "not verified".red()),
        }
        if let Some(sample) = &status.string_sample {
            println!("  string #2:  {:?}", sample);
        }

        println!();
        println!("=== Pools ===");
        for pool in &status.pools {
            let capacity = match pool.capacity {
                Some(count) => count.to_string(),
                None => "linked".to_string(),
            };
            print!(
                "  {:<9} slot {:>3}  {:#X}  stride {:#x}  capacity {}",
                pool.kind.to_string(),
                pool.slot,
                pool.address,
                pool.stride,
                capacity
            );
            match &pool.error {
                Some(error) => println!("  {}", error.red()),
                None => println!(),
            }
        }

        Ok(())
    })
}
