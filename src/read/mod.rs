//! APIs to read pixelized column chunks back.
mod string;

pub use string::StringChunkReader;

use std::io::{Read, Seek, SeekFrom};

use crate::errors::Result;

/// Reads `length` bytes of a column chunk stored at `offset`.
pub fn read_column_chunk<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    length: usize,
) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut chunk = vec![0u8; length];
    reader.read_exact(&mut chunk)?;
    Ok(chunk)
}
