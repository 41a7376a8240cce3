use arrow::bitmap::{Bitmap, MutableBitmap};
use log::debug;

use crate::options::WriteOptions;
use crate::stats::{StatsRecorder, StringStatsRecorder};
use crate::{ColumnChunkIndex, PixelMeta};

/// Row accounting of the pixel being filled, plus the index of the pixels
/// already sealed.
#[derive(Debug)]
pub(crate) struct PixelState {
    pixel_stride: usize,
    rows: usize,
    is_null: MutableBitmap,
    has_null: bool,
    stats: StringStatsRecorder,
    // chunk position where the current pixel begins
    position: u64,
    index: ColumnChunkIndex,
}

impl PixelState {
    pub fn new(options: &WriteOptions) -> Self {
        Self {
            pixel_stride: options.pixel_stride,
            rows: 0,
            is_null: MutableBitmap::with_capacity(options.pixel_stride),
            has_null: false,
            stats: StringStatsRecorder::default(),
            position: 0,
            index: ColumnChunkIndex::new(options),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Rows left before the current pixel is full.
    pub fn remaining(&self) -> usize {
        self.pixel_stride - self.rows
    }

    pub fn is_full(&self) -> bool {
        self.rows >= self.pixel_stride
    }

    pub fn push_null(&mut self) {
        self.is_null.push(true);
        self.has_null = true;
        self.stats.increment();
        self.rows += 1;
    }

    pub fn push_value(&mut self, value: &[u8]) {
        self.is_null.push(false);
        self.stats.update_string(value, 1);
        self.rows += 1;
    }

    /// Seals the current pixel; the next one begins at `next_position`.
    pub fn seal(&mut self, next_position: u64) {
        let is_null = std::mem::replace(
            &mut self.is_null,
            MutableBitmap::with_capacity(self.pixel_stride),
        );
        let is_null = if self.has_null {
            let bitmap: Bitmap = is_null.into();
            let (slice, _, _) = bitmap.as_slice();
            Some(slice.to_vec())
        } else {
            None
        };

        debug!(
            "seal pixel {}: {} rows, {} bytes",
            self.index.pixels.len(),
            self.rows,
            next_position - self.position
        );

        self.index.statistics.merge(&self.stats);
        self.index.pixels.push(PixelMeta {
            position: self.position,
            num_rows: self.rows as u64,
            is_null,
            statistics: std::mem::take(&mut self.stats),
        });

        self.rows = 0;
        self.has_null = false;
        self.position = next_position;
    }

    pub fn index(&self) -> &ColumnChunkIndex {
        &self.index
    }
}
