//! APIs to write pixelized column chunks.
pub(crate) mod common;
mod pixel;
mod string;

pub use crate::options::WriteOptions;
pub use common::OffsetWriter;
pub use string::StringColumnWriter;

use crate::errors::Result;
use crate::vector::TypedColumnVector;
use crate::{ColumnChunkIndex, ColumnEncoding};

/// A writer encoding one column into one column chunk.
///
/// Rows are accounted into pixels of `pixel_stride` rows; a pixel is sealed
/// as soon as it is full, and [`ColumnWriter::flush`] seals the last partial
/// pixel and appends the trailing sections of the chunk.
pub trait ColumnWriter {
    type Vector: TypedColumnVector;

    /// Writes the first `size` rows of `vector`, returning the number of
    /// bytes written to the chunk so far.
    fn write(&mut self, vector: &Self::Vector, size: usize) -> Result<usize>;

    /// Seals the current pixel.
    fn new_pixel(&mut self) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    fn column_chunk_encoding(&self) -> ColumnEncoding;

    fn column_chunk_index(&self) -> &ColumnChunkIndex;

    fn close(&mut self) -> Result<()>;
}
