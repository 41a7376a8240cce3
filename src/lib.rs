#[macro_use]
mod errors;

pub mod compression;
pub mod options;
pub mod read;
pub mod stats;
pub mod vector;
pub mod write;

pub use errors::{Error, Result};
pub use options::{BufferLimits, ByteOrder, EncodingLevel, WriteOptions};

use arrow::bitmap::utils::get_bit;
use stats::{StatsRecorder, StringStatsRecorder};

/// Largest offset a column chunk may hold, offsets are written as
/// non-negative 32-bit integers.
pub const MAX_CHUNK_OFFSET: u64 = i32::MAX as u64;

/// Index of one column chunk: where each pixel starts, its nulls and its
/// statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ColumnChunkIndex {
    pub pixel_stride: u64,
    pub nulls_padding: bool,
    pub little_endian: bool,
    pub pixels: Vec<PixelMeta>,
    pub statistics: StringStatsRecorder,
}

impl ColumnChunkIndex {
    pub fn new(options: &WriteOptions) -> Self {
        Self {
            pixel_stride: options.pixel_stride as u64,
            nulls_padding: options.nulls_padding,
            little_endian: options.byte_order.is_little_endian(),
            pixels: vec![],
            statistics: StringStatsRecorder::default(),
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        if self.little_endian {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }

    pub fn num_rows(&self) -> u64 {
        self.pixels.iter().map(|p| p.num_rows).sum()
    }

    pub fn has_null(&self) -> bool {
        self.statistics.has_null()
    }

    /// Whether `row` of the chunk is null, `None` when out of range.
    pub fn is_null(&self, row: u64) -> Option<bool> {
        let (pixel, row) = self.locate(row)?;
        Some(self.pixels[pixel].is_null(row as usize))
    }

    /// Maps a chunk row to `(pixel, row within the pixel)`.
    pub fn locate(&self, mut row: u64) -> Option<(usize, u64)> {
        for (i, pixel) in self.pixels.iter().enumerate() {
            if row < pixel.num_rows {
                return Some((i, row));
            }
            row -= pixel.num_rows;
        }
        None
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PixelMeta {
    // offset in the chunk where the pixel's content begins
    pub position: u64,
    pub num_rows: u64,
    // LSB-first null bitmap, only present when the pixel has nulls
    pub is_null: Option<Vec<u8>>,
    pub statistics: StringStatsRecorder,
}

impl PixelMeta {
    pub fn is_null(&self, row: usize) -> bool {
        match &self.is_null {
            Some(bitmap) => row < bitmap.len() * 8 && get_bit(bitmap, row),
            None => false,
        }
    }

    pub fn null_count(&self) -> u64 {
        (0..self.num_rows as usize)
            .filter(|row| self.is_null(*row))
            .count() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EncodingKind {
    None,
    Dictionary,
}

/// Encoding of a column chunk, stored next to the chunk's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ColumnEncoding {
    pub kind: EncodingKind,
    pub dictionary_size: u32,
    /// Dictionary codes and dictionary starts are run-length encoded.
    pub cascade_run_length: bool,
}

impl ColumnEncoding {
    pub fn none() -> Self {
        Self {
            kind: EncodingKind::None,
            dictionary_size: 0,
            cascade_run_length: false,
        }
    }

    pub fn dictionary(dictionary_size: u32, cascade_run_length: bool) -> Self {
        Self {
            kind: EncodingKind::Dictionary,
            dictionary_size,
            cascade_run_length,
        }
    }
}

impl Default for ColumnEncoding {
    fn default() -> Self {
        Self::none()
    }
}
