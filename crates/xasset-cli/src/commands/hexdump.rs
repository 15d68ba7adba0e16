//! Hexdump command implementation.
//!
//! Displays raw bytes of the selected source, useful for checking record
//! layouts against a live game.

use anyhow::Result;
use xasset_core::MemoryDump;

use crate::source::SourceArgs;

/// Run the hexdump command
pub fn run(source: &SourceArgs, address: u64, size: usize) -> Result<()> {
    source.with_target(|target| {
        let dump = MemoryDump::read(target.reader, address, size)?;
        println!("Hexdump at 0x{:X} ({} bytes):", dump.address, dump.size);
        println!();
        for line in &dump.hex_dump {
            println!("{}", line);
        }
        Ok(())
    })
}
