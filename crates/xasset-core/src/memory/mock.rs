//! Sparse in-memory address space for tests

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::memory::ReadMemory;

const PAGE_SIZE: u64 = 0x1000;

/// Mock reader backed by 4 KiB pages; reads touching an unmapped page fail.
#[derive(Debug, Clone, Default)]
pub struct MockMemoryReader {
    pages: BTreeMap<u64, Vec<u8>>,
    base_address: u64,
    module_size: u64,
}

impl MockMemoryReader {
    pub fn builder() -> MockMemoryBuilder {
        MockMemoryBuilder::new()
    }

    fn write(&mut self, address: u64, data: &[u8]) {
        for (i, byte) in data.iter().enumerate() {
            let addr = address + i as u64;
            let page = addr - addr % PAGE_SIZE;
            let entry = self
                .pages
                .entry(page)
                .or_insert_with(|| vec![0u8; PAGE_SIZE as usize]);
            entry[(addr - page) as usize] = *byte;
        }
    }
}

impl ReadMemory for MockMemoryReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(size);
        for i in 0..size as u64 {
            let addr = address.checked_add(i).ok_or(Error::MemoryReadFailed {
                address,
                message: "address overflow".to_string(),
            })?;
            let page = addr - addr % PAGE_SIZE;
            let data = self.pages.get(&page).ok_or_else(|| Error::MemoryReadFailed {
                address,
                message: format!("page {:#x} is not mapped", page),
            })?;
            out.push(data[(addr - page) as usize]);
        }
        Ok(out)
    }

    fn base_address(&self) -> u64 {
        self.base_address
    }

    fn module_size(&self) -> u64 {
        self.module_size
    }
}

/// Builder for [`MockMemoryReader`]
#[derive(Debug, Clone, Default)]
pub struct MockMemoryBuilder {
    reader: MockMemoryReader,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the main module range
    pub fn module(mut self, base: u64, size: u64) -> Self {
        self.reader.base_address = base;
        self.reader.module_size = size;
        self
    }

    pub fn write(mut self, address: u64, data: &[u8]) -> Self {
        self.reader.write(address, data);
        self
    }

    pub fn write_u8(self, address: u64, value: u8) -> Self {
        self.write(address, &[value])
    }

    pub fn write_u16(self, address: u64, value: u16) -> Self {
        self.write(address, &value.to_le_bytes())
    }

    pub fn write_u32(self, address: u64, value: u32) -> Self {
        self.write(address, &value.to_le_bytes())
    }

    pub fn write_u64(self, address: u64, value: u64) -> Self {
        self.write(address, &value.to_le_bytes())
    }

    pub fn write_f32(self, address: u64, value: f32) -> Self {
        self.write(address, &value.to_le_bytes())
    }

    pub fn write_cstring(self, address: u64, value: &str) -> Self {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        self.write(address, &bytes)
    }

    /// Map a zero-filled range
    pub fn zeroed(self, address: u64, size: usize) -> Self {
        self.write(address, &vec![0u8; size])
    }

    pub fn build(self) -> MockMemoryReader {
        self.reader
    }
}
