//! Declarative record layouts.
//!
//! Each title describes its in-memory structures as plain `Field` tables
//! (offset + width). A [`Record`] holds the bytes of one structure read from
//! the source and decodes fields through a bounds-checked [`Cursor`], so a
//! single decoder per asset kind can serve every title.

mod layouts;

pub use layouts::*;

use crate::error::Result;
use crate::memory::{Cursor, PointerWidth, ReadMemory};

/// Storage width of a field in the source record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidth {
    U8,
    U16,
    U32,
    U64,
    F32,
    /// Pointer sized, 4 or 8 bytes depending on the title
    Ptr,
}

impl FieldWidth {
    pub const fn bytes(self, pointer: PointerWidth) -> usize {
        match self {
            FieldWidth::U8 => 1,
            FieldWidth::U16 => 2,
            FieldWidth::U32 | FieldWidth::F32 => 4,
            FieldWidth::U64 => 8,
            FieldWidth::Ptr => pointer.bytes(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub offset: u64,
    pub width: FieldWidth,
}

impl Field {
    pub const fn new(offset: u64, width: FieldWidth) -> Self {
        Self { offset, width }
    }
}

pub const fn u8_at(offset: u64) -> Field {
    Field::new(offset, FieldWidth::U8)
}

pub const fn u16_at(offset: u64) -> Field {
    Field::new(offset, FieldWidth::U16)
}

pub const fn u32_at(offset: u64) -> Field {
    Field::new(offset, FieldWidth::U32)
}

pub const fn u64_at(offset: u64) -> Field {
    Field::new(offset, FieldWidth::U64)
}

pub const fn f32_at(offset: u64) -> Field {
    Field::new(offset, FieldWidth::F32)
}

pub const fn ptr_at(offset: u64) -> Field {
    Field::new(offset, FieldWidth::Ptr)
}

/// One structure read from the source, addressed by its original location
#[derive(Debug, Clone)]
pub struct Record {
    address: u64,
    data: Vec<u8>,
    pointer: PointerWidth,
}

impl Record {
    pub fn from_bytes(address: u64, data: Vec<u8>, pointer: PointerWidth) -> Self {
        Self {
            address,
            data,
            pointer,
        }
    }

    pub fn read<R: ReadMemory + ?Sized>(
        reader: &R,
        address: u64,
        size: u64,
        pointer: PointerWidth,
    ) -> Result<Self> {
        Ok(Self {
            address,
            data: reader.read_bytes(address, size as usize)?,
            pointer,
        })
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn pointer_width(&self) -> PointerWidth {
        self.pointer
    }

    fn cursor(&self) -> Cursor<'_> {
        Cursor::new(&self.data, self.address)
    }

    /// Field value widened to `u64`; floats are returned as their bit pattern
    pub fn get(&self, field: Field) -> Result<u64> {
        let cursor = self.cursor();
        let at = self.address + field.offset;
        match field.width {
            FieldWidth::U8 => cursor.u8_at(at).map(u64::from),
            FieldWidth::U16 => cursor.u16_at(at).map(u64::from),
            FieldWidth::U32 | FieldWidth::F32 => cursor.u32_at(at).map(u64::from),
            FieldWidth::U64 => cursor.u64_at(at),
            FieldWidth::Ptr => cursor.ptr_at(at, self.pointer),
        }
    }

    pub fn get_u32(&self, field: Field) -> Result<u32> {
        Ok(self.get(field)? as u32)
    }

    /// Optional fields read as 0 when the title does not have them
    pub fn get_opt(&self, field: Option<Field>) -> Result<u64> {
        match field {
            Some(field) => self.get(field),
            None => Ok(0),
        }
    }

    pub fn get_f32(&self, field: Field) -> Result<f32> {
        let cursor = self.cursor();
        cursor.f32_at(self.address + field.offset)
    }

    /// Normalized values of `fields`, used as a placeholder fingerprint
    pub fn fingerprint(&self, fields: &[Field]) -> Result<Vec<u64>> {
        fields.iter().map(|f| self.get(*f)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_reads_each_width() {
        let mut data = vec![0u8; 0x20];
        data[0] = 0xAB;
        data[2..4].copy_from_slice(&0x1234u16.to_le_bytes());
        data[4..8].copy_from_slice(&30.0f32.to_le_bytes());
        data[8..16].copy_from_slice(&0x1122_3344_5566_7788u64.to_le_bytes());

        let record = Record::from_bytes(0x5000, data, PointerWidth::U32);
        assert_eq!(record.get(u8_at(0)).unwrap(), 0xAB);
        assert_eq!(record.get(u16_at(2)).unwrap(), 0x1234);
        assert_eq!(record.get_f32(f32_at(4)).unwrap(), 30.0);
        assert_eq!(record.get(u64_at(8)).unwrap(), 0x1122_3344_5566_7788);
        assert_eq!(record.get(ptr_at(8)).unwrap(), 0x5566_7788);
        assert_eq!(record.get_opt(None).unwrap(), 0);
    }

    #[test]
    fn test_record_field_outside_record_fails() {
        let record = Record::from_bytes(0x5000, vec![0u8; 8], PointerWidth::U64);
        assert!(record.get(ptr_at(4)).is_err());
        assert!(record.get(u32_at(4)).is_ok());
    }

    #[test]
    fn test_fingerprint_normalizes_widths() {
        let mut data = vec![0u8; 0x10];
        data[0..4].copy_from_slice(&7u32.to_le_bytes());
        data[8] = 3;
        let record = Record::from_bytes(0, data, PointerWidth::U32);
        let fp = record.fingerprint(&[ptr_at(0), u8_at(8)]).unwrap();
        assert_eq!(fp, vec![7, 3]);
    }
}
