//! Bounds-checked view over a byte window with a known source address.
//!
//! Every record, header and table read from a process or an archive goes
//! through a `Cursor`. Any access outside `[base, base + len)` fails with
//! [`Error::OutOfBounds`] instead of reading neighbouring memory.

use crate::error::{Error, Result};
use crate::memory::{PointerWidth, ReadMemory};

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    base: u64,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8], base: u64) -> Self {
        Self { data, base, pos: 0 }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn end(&self) -> u64 {
        self.base + self.data.len() as u64
    }

    /// Current absolute position
    pub fn position(&self) -> u64 {
        self.base + self.pos as u64
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn contains(&self, address: u64, len: usize) -> bool {
        address >= self.base
            && (address - self.base)
                .checked_add(len as u64)
                .is_some_and(|end| end <= self.data.len() as u64)
    }

    /// Move to an absolute position inside the window (the end is allowed)
    pub fn seek(&mut self, address: u64) -> Result<()> {
        if !self.contains(address, 0) {
            return Err(self.out_of_bounds(address, 0));
        }
        self.pos = (address - self.base) as usize;
        Ok(())
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        let address = self.position();
        if !self.contains(address, len) {
            return Err(self.out_of_bounds(address, len));
        }
        self.pos += len;
        Ok(())
    }

    /// Advance to the next multiple of `alignment` relative to the window start
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let rem = self.pos % alignment;
        if rem != 0 {
            self.skip(alignment - rem)?;
        }
        Ok(())
    }

    pub fn bytes_at(&self, address: u64, len: usize) -> Result<&'a [u8]> {
        if !self.contains(address, len) {
            return Err(self.out_of_bounds(address, len));
        }
        let start = (address - self.base) as usize;
        Ok(&self.data[start..start + len])
    }

    pub fn u8_at(&self, address: u64) -> Result<u8> {
        Ok(self.bytes_at(address, 1)?[0])
    }

    pub fn u16_at(&self, address: u64) -> Result<u16> {
        let b = self.bytes_at(address, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32_at(&self, address: u64) -> Result<u32> {
        let b = self.bytes_at(address, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i32_at(&self, address: u64) -> Result<i32> {
        Ok(self.u32_at(address)? as i32)
    }

    pub fn u64_at(&self, address: u64) -> Result<u64> {
        let b = self.bytes_at(address, 8)?;
        Ok(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    pub fn f32_at(&self, address: u64) -> Result<f32> {
        Ok(f32::from_bits(self.u32_at(address)?))
    }

    pub fn ptr_at(&self, address: u64, width: PointerWidth) -> Result<u64> {
        match width {
            PointerWidth::U32 => self.u32_at(address).map(u64::from),
            PointerWidth::U64 => self.u64_at(address),
        }
    }

    /// NUL-terminated string starting at `address`, bounded by the window
    pub fn cstring_at(&self, address: u64) -> Result<String> {
        let tail = self.bytes_at(address, (self.end().saturating_sub(address)) as usize)?;
        let len = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        Ok(String::from_utf8_lossy(&tail[..len]).into_owned())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let bytes = self.bytes_at(self.position(), len)?;
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let value = self.u8_at(self.position())?;
        self.pos += 1;
        Ok(value)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let value = self.u16_at(self.position())?;
        self.pos += 2;
        Ok(value)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let value = self.u32_at(self.position())?;
        self.pos += 4;
        Ok(value)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let value = self.u64_at(self.position())?;
        self.pos += 8;
        Ok(value)
    }

    pub fn read_cstring(&mut self) -> Result<String> {
        let value = self.cstring_at(self.position())?;
        self.pos = (self.pos + value.len() + 1).min(self.data.len());
        Ok(value)
    }

    fn out_of_bounds(&self, address: u64, len: usize) -> Error {
        Error::OutOfBounds {
            address,
            len,
            base: self.base,
            end: self.end(),
        }
    }
}

/// Owned window read from a [`ReadMemory`] source.
///
/// Holds the bytes so that callers can create short-lived [`Cursor`]s over them.
#[derive(Debug, Clone)]
pub struct Window {
    pub base: u64,
    pub data: Vec<u8>,
}

impl Window {
    pub fn read<R: ReadMemory + ?Sized>(reader: &R, base: u64, len: usize) -> Result<Self> {
        Ok(Self {
            base,
            data: reader.read_bytes(base, len)?,
        })
    }

    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(&self.data, self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_reads_inside_window() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let cursor = Cursor::new(&data, 0x1000);
        assert_eq!(cursor.u8_at(0x1000).unwrap(), 0x01);
        assert_eq!(cursor.u16_at(0x1002).unwrap(), 0x0403);
        assert_eq!(cursor.u32_at(0x1004).unwrap(), 0x08070605);
        assert_eq!(cursor.u64_at(0x1000).unwrap(), 0x0807060504030201);
    }

    #[test]
    fn test_reads_outside_window_fail_closed() {
        let data = [0u8; 8];
        let cursor = Cursor::new(&data, 0x1000);
        assert!(matches!(
            cursor.u32_at(0x1006),
            Err(Error::OutOfBounds { address: 0x1006, len: 4, .. })
        ));
        assert!(cursor.u8_at(0xFFF).is_err());
        assert!(cursor.bytes_at(u64::MAX, 2).is_err());
    }

    #[test]
    fn test_sequential_reads_and_align() {
        let mut data = vec![0u8; 0x100];
        data[0] = 7;
        data[0x80..0x84].copy_from_slice(&0xCAFEBABEu32.to_le_bytes());
        let mut cursor = Cursor::new(&data, 0);
        assert_eq!(cursor.read_u8().unwrap(), 7);
        cursor.align(0x80).unwrap();
        assert_eq!(cursor.position(), 0x80);
        assert_eq!(cursor.read_u32().unwrap(), 0xCAFEBABE);
        assert_eq!(cursor.remaining(), 0x7C);
        assert!(cursor.skip(0x7D).is_err());
    }

    #[test]
    fn test_cstring_bounded_by_window() {
        let data = b"void\0abc";
        let mut cursor = Cursor::new(data, 0x40);
        assert_eq!(cursor.read_cstring().unwrap(), "void");
        assert_eq!(cursor.read_cstring().unwrap(), "abc");
        assert_eq!(cursor.remaining(), 0);
    }
}
