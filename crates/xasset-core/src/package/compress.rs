//! Decompression primitives used by the archive readers

use std::io::Read;

use flate2::read::DeflateDecoder;

use crate::error::{Error, Result};

/// Decompress one raw LZ4 block of known output size
pub fn decompress_lz4(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let out = lz4_flex::block::decompress(data, expected_size)
        .map_err(|e| Error::Decompression(format!("lz4: {}", e)))?;
    if out.len() != expected_size {
        return Err(Error::Decompression(format!(
            "lz4: expected {} bytes, got {}",
            expected_size,
            out.len()
        )));
    }
    Ok(out)
}

/// Decompress one LZ4 block of unknown output size into `scratch`, returning
/// the number of bytes produced
pub(crate) fn decompress_lz4_into(data: &[u8], scratch: &mut [u8]) -> Result<usize> {
    lz4_flex::block::decompress_into(data, scratch)
        .map_err(|e| Error::Decompression(format!("lz4: {}", e)))
}

/// Decompress one LZO1X block
pub fn decompress_lzo(data: &[u8], expected_size: Option<usize>) -> Result<Vec<u8>> {
    lzokay_native::decompress_all(data, expected_size)
        .map_err(|e| Error::Decompression(format!("lzo: {:?}", e)))
}

/// Inflate a raw deflate stream
pub fn inflate(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_size);
    DeflateDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| Error::Decompression(format!("deflate: {}", e)))?;
    if out.len() != expected_size {
        return Err(Error::Decompression(format!(
            "deflate: expected {} bytes, got {}",
            expected_size,
            out.len()
        )));
    }
    Ok(out)
}
