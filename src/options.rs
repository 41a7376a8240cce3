use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Byte order of the integers written into a column chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    pub fn is_little_endian(&self) -> bool {
        matches!(self, ByteOrder::LittleEndian)
    }

    pub fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }

    pub fn is_native(&self) -> bool {
        *self == Self::native()
    }
}

/// Coarse encoding switch, mapped onto the individual encoding flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EncodingLevel {
    /// No encoding: raw bytes plus a starts array.
    EL0,
    /// Dictionary encoding.
    EL1,
    /// Dictionary encoding with run-length encoded codes.
    EL2,
}

impl EncodingLevel {
    pub fn from_level(level: u8) -> Result<Self> {
        match level {
            0 => Ok(EncodingLevel::EL0),
            1 => Ok(EncodingLevel::EL1),
            2 => Ok(EncodingLevel::EL2),
            other => Err(general_err!("Unknown encoding level {}", other)),
        }
    }
}

/// Options declaring the behaviour of a column writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Number of rows per pixel.
    pub pixel_stride: usize,
    pub byte_order: ByteOrder,
    /// Keep a starts entry (or a code) for null rows so rows map 1:1 onto slots.
    pub nulls_padding: bool,
    pub run_length_encoding: bool,
    pub dictionary_encoding: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            pixel_stride: Self::DEFAULT_PIXEL_STRIDE,
            byte_order: ByteOrder::default(),
            nulls_padding: false,
            run_length_encoding: false,
            dictionary_encoding: false,
        }
    }
}

impl WriteOptions {
    pub const DEFAULT_PIXEL_STRIDE: usize = 10_000;

    pub fn with_encoding_level(mut self, level: EncodingLevel) -> Self {
        self.dictionary_encoding = level >= EncodingLevel::EL1;
        self.run_length_encoding = level >= EncodingLevel::EL2;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pixel_stride == 0 {
            return Err(general_err!("pixel_stride must be positive"));
        }
        Ok(())
    }
}

/// Sizing policy of the by-value buffers of a binary column vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferLimits {
    /// Minimum size of the first small buffer.
    pub default_buffer_size: usize,
    /// Values longer than this get a dedicated buffer.
    pub max_small_value_size: usize,
    /// Upper bound of any single buffer.
    pub max_buffer_capacity: usize,
    /// Slack applied to the estimated size of the first small buffer.
    pub extra_space_factor: f32,
}

impl Default for BufferLimits {
    fn default() -> Self {
        Self {
            default_buffer_size: 16 * crate::vector::DEFAULT_SIZE,
            max_small_value_size: 1024 * 1024,
            max_buffer_capacity: i32::MAX as usize,
            extra_space_factor: 1.2,
        }
    }
}
