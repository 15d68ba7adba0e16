use serde::Serialize;

use crate::error::Result;
use crate::memory::ReadMemory;

#[derive(Debug, Clone, Serialize)]
pub struct MemoryDump {
    pub address: u64,
    pub size: usize,
    pub hex_dump: Vec<String>,
}

impl MemoryDump {
    pub fn read<R: ReadMemory + ?Sized>(reader: &R, address: u64, size: usize) -> Result<Self> {
        let bytes = reader.read_bytes(address, size)?;
        Ok(Self {
            address,
            size,
            hex_dump: hex_lines(&bytes, address),
        })
    }
}

/// Classic 16-column hexdump lines with an ASCII column
pub fn hex_lines(bytes: &[u8], base: u64) -> Vec<String> {
    bytes
        .chunks(16)
        .enumerate()
        .map(|(i, chunk)| {
            let mut line = format!("{:#010x}: ", base + 16 * i as u64);
            for j in 0..16 {
                if j == 8 {
                    line.push(' ');
                }
                match chunk.get(j) {
                    Some(byte) => line.push_str(&format!("{:02X} ", byte)),
                    None => line.push_str("   "),
                }
            }
            line.push_str(" |");
            line.extend(chunk.iter().map(|&b| {
                if (0x20..0x7F).contains(&b) {
                    b as char
                } else {
                    '.'
                }
            }));
            line.push('|');
            line
        })
        .collect()
}
