use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound for asset and table names read from the source
pub const MAX_STRING_LEN: usize = 1024;

/// Strings are read in small chunks that never straddle a page boundary,
/// so a name near the end of a committed page stays readable.
const STRING_CHUNK: usize = 64;
const PAGE_SIZE: u64 = 0x1000;

/// Width of a pointer in the source address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerWidth {
    U32,
    U64,
}

impl PointerWidth {
    pub const fn bytes(self) -> usize {
        match self {
            PointerWidth::U32 => 4,
            PointerWidth::U64 => 8,
        }
    }

    /// Decode a little-endian pointer from the start of `bytes`.
    pub fn decode(self, bytes: &[u8]) -> Option<u64> {
        match self {
            PointerWidth::U32 => bytes
                .get(..4)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as u64),
            PointerWidth::U64 => bytes.get(..8).map(|b| {
                u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
            }),
        }
    }
}

/// Trait for reading a source address space (live process or memory image)
pub trait ReadMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Base address of the main module
    fn base_address(&self) -> u64;

    /// Size of the main module image, 0 if unknown
    fn module_size(&self) -> u64 {
        0
    }

    fn read_u8(&self, address: u64) -> Result<u8> {
        let buffer = self.read_bytes(address, 1)?;
        Ok(buffer[0])
    }

    fn read_u16(&self, address: u64) -> Result<u16> {
        let buffer = self.read_bytes(address, 2)?;
        Ok(u16::from_le_bytes([buffer[0], buffer[1]]))
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        let buffer = self.read_bytes(address, 4)?;
        Ok(u32::from_le_bytes([
            buffer[0], buffer[1], buffer[2], buffer[3],
        ]))
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        Ok(self.read_u32(address)? as i32)
    }

    fn read_f32(&self, address: u64) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32(address)?))
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        let buffer = self.read_bytes(address, 8)?;
        Ok(u64::from_le_bytes([
            buffer[0], buffer[1], buffer[2], buffer[3], buffer[4], buffer[5], buffer[6],
            buffer[7],
        ]))
    }

    fn read_ptr(&self, address: u64, width: PointerWidth) -> Result<u64> {
        match width {
            PointerWidth::U32 => self.read_u32(address).map(u64::from),
            PointerWidth::U64 => self.read_u64(address),
        }
    }

    /// Read a NUL-terminated string of at most [`MAX_STRING_LEN`] bytes.
    ///
    /// Fails if the first byte is unreadable; a string running into an
    /// unreadable page is cut at the page boundary.
    fn read_cstring(&self, address: u64) -> Result<String> {
        if address == 0 {
            return Err(Error::MemoryReadFailed {
                address,
                message: "null string pointer".to_string(),
            });
        }

        let mut bytes = Vec::new();
        let mut cursor = address;

        while bytes.len() < MAX_STRING_LEN {
            let to_page_end = (PAGE_SIZE - (cursor % PAGE_SIZE)) as usize;
            let size = STRING_CHUNK
                .min(to_page_end)
                .min(MAX_STRING_LEN - bytes.len());

            let chunk = match self.read_bytes(cursor, size) {
                Ok(chunk) => chunk,
                Err(e) if bytes.is_empty() => return Err(e),
                Err(_) => break,
            };

            if let Some(end) = chunk.iter().position(|&b| b == 0) {
                bytes.extend_from_slice(&chunk[..end]);
                return Ok(String::from_utf8_lossy(&bytes).into_owned());
            }

            bytes.extend_from_slice(&chunk);
            cursor += size as u64;
        }

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl<T: ReadMemory + ?Sized> ReadMemory for &T {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }

    fn base_address(&self) -> u64 {
        (**self).base_address()
    }

    fn module_size(&self) -> u64 {
        (**self).module_size()
    }
}

impl<T: ReadMemory + ?Sized> ReadMemory for Box<T> {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }

    fn base_address(&self) -> u64 {
        (**self).base_address()
    }

    fn module_size(&self) -> u64 {
        (**self).module_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemoryBuilder;

    #[test]
    fn test_typed_reads() {
        let reader = MockMemoryBuilder::new()
            .write_u32(0x1000, 0xDEADBEEF)
            .write_u64(0x1008, 0x1122_3344_5566_7788)
            .write_f32(0x1010, 30.0)
            .build();

        assert_eq!(reader.read_u32(0x1000).unwrap(), 0xDEADBEEF);
        assert_eq!(reader.read_u16(0x1000).unwrap(), 0xBEEF);
        assert_eq!(reader.read_u8(0x1003).unwrap(), 0xDE);
        assert_eq!(reader.read_u64(0x1008).unwrap(), 0x1122_3344_5566_7788);
        assert_eq!(reader.read_f32(0x1010).unwrap(), 30.0);
        assert_eq!(
            reader.read_ptr(0x1008, PointerWidth::U32).unwrap(),
            0x5566_7788
        );
    }

    #[test]
    fn test_read_cstring() {
        let reader = MockMemoryBuilder::new()
            .write_cstring(0x2000, "viewmodel_reload")
            .build();
        assert_eq!(reader.read_cstring(0x2000).unwrap(), "viewmodel_reload");
        assert!(reader.read_cstring(0).is_err());
        assert!(reader.read_cstring(0x9000).is_err());
    }

    #[test]
    fn test_read_cstring_stops_at_unreadable_page() {
        // The string fills the tail of a page and the next page is not mapped
        let reader = MockMemoryBuilder::new()
            .write(0x1FFC, b"abcd")
            .build();
        assert_eq!(reader.read_cstring(0x1FFC).unwrap(), "abcd");
    }

    #[test]
    fn test_pointer_width_decode() {
        let bytes = [0x78, 0x56, 0x34, 0x12, 0, 0, 0, 0x80];
        assert_eq!(PointerWidth::U32.decode(&bytes), Some(0x1234_5678));
        assert_eq!(
            PointerWidth::U64.decode(&bytes),
            Some(0x8000_0000_1234_5678)
        );
        assert_eq!(PointerWidth::U64.decode(&bytes[..4]), None);
    }
}
