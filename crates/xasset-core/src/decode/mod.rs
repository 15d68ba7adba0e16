//! Deep structure reading.
//!
//! A [`StructDecoder`] follows the nested pointers of one pool record (lods,
//! surfaces, material tables, delta parts) through the title's layouts and
//! produces the normalized `X*` types. Decoders only read; payloads stay in
//! the source until a transcoder or exporter asks for them.

mod anim;
mod image;
mod material;
mod model;
mod rawfile;
mod sound;
mod types;

pub use image::{StreamedMip, select_streamed_mip};
pub use sound::file_sound_spec;
pub use types::*;

use crate::error::Result;
use crate::memory::{PointerWidth, ReadMemory};
use crate::schema::{Field, Record, TitleLayouts};
use crate::title::TitleSpec;

/// Upper bound on any count used to size a nested read
pub(crate) const MAX_NESTED_COUNT: u32 = 0x10000;

pub struct StructDecoder<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
    spec: &'a TitleSpec,
}

impl<'a, R: ReadMemory + ?Sized> StructDecoder<'a, R> {
    pub fn new(reader: &'a R, spec: &'a TitleSpec) -> Self {
        Self { reader, spec }
    }

    fn layouts(&self) -> &'a TitleLayouts {
        &self.spec.layouts
    }

    fn pointer(&self) -> PointerWidth {
        self.spec.pointer
    }

    fn record(&self, address: u64, size: u64) -> Result<Record> {
        Record::read(self.reader, address, size, self.pointer())
    }

    /// Read one field of a structure at `base` without reading the whole structure
    fn field(&self, base: u64, field: Field) -> Result<u64> {
        let record = self.record(base + field.offset, field.width.bytes(self.pointer()) as u64)?;
        record.get(Field::new(0, field.width))
    }

    fn string_at(&self, pointer: u64) -> Result<String> {
        self.reader.read_cstring(pointer)
    }
}
