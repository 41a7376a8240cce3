use std::io::Write;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use crate::errors::{Error, Result};
use crate::options::ByteOrder;
use crate::MAX_CHUNK_OFFSET;

/// Sink wrapper counting the bytes written through it.
#[derive(Debug)]
pub struct OffsetWriter<W: Write> {
    w: W,
    offset: u64,
}

impl<W: Write> OffsetWriter<W> {
    pub fn new(w: W) -> Self {
        Self { w, offset: 0 }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn get_ref(&self) -> &W {
        &self.w
    }

    pub fn into_inner(self) -> W {
        self.w
    }
}

impl<W: Write> Write for OffsetWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.w.write(buf)?;
        self.offset += size as u64;
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.w.flush()
    }
}

/// Converts a chunk position into the 32-bit offset written into the chunk.
pub(crate) fn to_chunk_offset(offset: u64) -> Result<u32> {
    if offset > MAX_CHUNK_OFFSET {
        return Err(Error::CapacityOverflow {
            requested: offset as usize,
            limit: MAX_CHUNK_OFFSET as usize,
        });
    }
    Ok(offset as u32)
}

pub(crate) fn write_int<W: Write>(w: &mut W, value: u32, byte_order: ByteOrder) -> Result<()> {
    match byte_order {
        ByteOrder::LittleEndian => w.write_u32::<LittleEndian>(value)?,
        ByteOrder::BigEndian => w.write_u32::<BigEndian>(value)?,
    }
    Ok(())
}

pub(crate) fn write_ints<W: Write>(w: &mut W, values: &[u32], byte_order: ByteOrder) -> Result<()> {
    if byte_order.is_native() {
        // in native endianess we can use the bytes directly.
        w.write_all(bytemuck::cast_slice(values))?;
    } else {
        for value in values {
            write_int(w, *value, byte_order)?;
        }
    }
    Ok(())
}
