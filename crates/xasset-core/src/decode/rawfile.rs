use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::pool::AssetDescriptor;
use crate::schema::directory_of;

use super::{StructDecoder, XRawFile};

/// Raw files larger than this are treated as corrupt records
const MAX_RAWFILE_SIZE: u64 = 256 * 1024 * 1024;

impl<R: ReadMemory + ?Sized> StructDecoder<'_, R> {
    pub fn decode_rawfile(&self, descriptor: &AssetDescriptor) -> Result<XRawFile> {
        let Some(layout) = self.layouts().rawfile else {
            return Err(Error::UnsupportedFormat(format!(
                "{} has no raw file pool",
                self.spec.title
            )));
        };
        let record = self.record(descriptor.source_pointer, layout.size)?;
        let raw_name = self.string_at(record.get(layout.name)?)?;

        let size = record.get(layout.data_size)?;
        if size > MAX_RAWFILE_SIZE {
            return Err(Error::InconsistentCounts {
                asset: descriptor.name.clone(),
                message: format!("raw file of {} bytes", size),
            });
        }

        Ok(XRawFile {
            name: descriptor.name.clone(),
            path: directory_of(&raw_name),
            data_pointer: record.get(layout.data)?,
            size,
        })
    }

    /// Bytes of a decoded raw file
    pub fn read_rawfile(&self, rawfile: &XRawFile) -> Result<Vec<u8>> {
        if rawfile.data_pointer == 0 || rawfile.size == 0 {
            return Ok(Vec::new());
        }
        self.reader.read_bytes(rawfile.data_pointer, rawfile.size as usize)
    }
}
