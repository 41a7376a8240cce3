// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::io::Write;

use log::{info, trace};

use crate::compression::dict::{Dictionary, HashTableDictionary};
use crate::compression::rle::RunLenIntEncoder;
use crate::errors::{Error, Result};
use crate::options::WriteOptions;
use crate::vector::{BinaryColumnVector, TypedColumnVector};
use crate::{ColumnChunkIndex, ColumnEncoding};

use super::common::{to_chunk_offset, write_int, write_ints, OffsetWriter};
use super::pixel::PixelState;
use super::ColumnWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Accumulating,
    Flushed,
    // a write, seal or flush failed part-way, the chunk is unusable
    Failed,
    Closed,
}

/// Encodes a string column into one column chunk.
///
/// Without dictionary encoding the chunk is the concatenated content of the
/// rows followed by their starts array and the starts offset. With dictionary
/// encoding the chunk holds the per-pixel codes, then the dictionary keys,
/// the dictionary starts and two trailing offsets. Null flags never reach the
/// chunk: they are kept per pixel in the [`ColumnChunkIndex`].
#[derive(Debug)]
pub struct StringColumnWriter<W: Write> {
    writer: OffsetWriter<W>,
    options: WriteOptions,
    pixels: PixelState,
    // start of every stored row, unencoded path only
    starts: Vec<u32>,
    start_offset: u64,
    // codes of the current pixel, dictionary path only
    codes: Vec<u32>,
    dictionary: Option<HashTableDictionary>,
    dictionary_size: u32,
    encoder: RunLenIntEncoder,
    state: State,
}

impl<W: Write> StringColumnWriter<W> {
    pub fn new(writer: W, options: WriteOptions) -> Result<Self> {
        options.validate()?;
        let dictionary = options
            .dictionary_encoding
            .then(HashTableDictionary::new);
        Ok(Self {
            writer: OffsetWriter::new(writer),
            options,
            pixels: PixelState::new(&options),
            starts: Vec::with_capacity(options.pixel_stride),
            start_offset: 0,
            codes: Vec::with_capacity(options.pixel_stride),
            dictionary,
            dictionary_size: 0,
            encoder: RunLenIntEncoder::new(),
            state: State::Accumulating,
        })
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Bytes written to the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.writer.offset()
    }

    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    /// Returns the sink; closing or syncing it is up to the caller.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn check_accumulating(&self) -> Result<()> {
        match self.state {
            State::Accumulating => Ok(()),
            State::Flushed | State::Failed | State::Closed => Err(Error::SealedChunkMutation),
        }
    }

    /// Marks the chunk failed when `result` is an error.
    fn abort_on_error<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.state = State::Failed;
        }
        result
    }

    /// Every row of `0..size` must be null or hold a value.
    fn check_rows(vector: &BinaryColumnVector, size: usize) -> Result<()> {
        if size > vector.len() {
            return Err(row_err!(
                "cannot write {} rows of a vector of {} rows",
                size,
                vector.len()
            ));
        }
        match (0..size).find(|row| !vector.is_null(*row) && vector.value(*row).is_none()) {
            Some(row) => Err(row_err!("row {} is neither null nor set", row)),
            None => Ok(()),
        }
    }

    fn write_rows(&mut self, vector: &BinaryColumnVector, size: usize) -> Result<()> {
        let mut row = 0;
        while row < size {
            let part = (size - row).min(self.pixels.remaining());
            self.write_part(vector, row, part)?;
            row += part;
            if self.pixels.is_full() {
                self.seal_pixel()?;
            }
        }
        Ok(())
    }

    fn write_part(&mut self, vector: &BinaryColumnVector, start: usize, len: usize) -> Result<()> {
        for row in start..start + len {
            if vector.is_null(row) {
                self.write_null();
                continue;
            }
            let value = vector
                .value(row)
                .ok_or_else(|| row_err!("row {} is neither null nor set", row))?;
            match self.dictionary.as_mut() {
                Some(dictionary) => self.codes.push(dictionary.add(value)),
                None => {
                    let end = to_chunk_offset(self.start_offset + value.len() as u64)?;
                    self.writer.write_all(value)?;
                    self.starts.push(self.start_offset as u32);
                    self.start_offset = end as u64;
                }
            }
            self.pixels.push_value(value);
        }
        trace!(
            "wrote rows {}..{}, {} bytes so far",
            start,
            start + len,
            self.writer.offset()
        );
        Ok(())
    }

    fn write_null(&mut self) {
        self.pixels.push_null();
        if self.options.nulls_padding {
            if self.dictionary.is_some() {
                self.codes.push(0);
            } else {
                self.starts.push(self.start_offset as u32);
            }
        }
    }

    fn seal_pixel(&mut self) -> Result<()> {
        if self.pixels.rows() == 0 {
            return Ok(());
        }
        if self.options.run_length_encoding {
            let encoded = self.encoder.encode(&self.codes);
            self.writer.write_all(encoded)?;
        } else if self.dictionary.is_some() {
            write_ints(&mut self.writer, &self.codes, self.options.byte_order)?;
        }
        self.codes.clear();
        self.pixels.seal(self.writer.offset());
        Ok(())
    }

    fn flush_chunk(&mut self) -> Result<()> {
        self.seal_pixel()?;
        if self.dictionary.is_some() {
            self.flush_dictionary()?;
        } else {
            self.flush_starts()?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn flush_starts(&mut self) -> Result<()> {
        let byte_order = self.options.byte_order;
        let starts_offset = to_chunk_offset(self.writer.offset())?;
        self.starts.push(to_chunk_offset(self.start_offset)?);
        write_ints(&mut self.writer, &self.starts, byte_order)?;
        write_int(&mut self.writer, starts_offset, byte_order)
    }

    fn flush_dictionary(&mut self) -> Result<()> {
        let byte_order = self.options.byte_order;
        let dictionary = match self.dictionary.as_ref() {
            Some(dictionary) => dictionary,
            None => return Ok(()),
        };
        self.dictionary_size = dictionary.len() as u32;

        let content_offset = to_chunk_offset(self.writer.offset())?;
        let mut starts = Vec::with_capacity(dictionary.len() + 1);
        starts.push(0u32);
        let mut position = 0u64;
        let mut written = Ok(());
        dictionary.visit(|_, key| {
            if written.is_ok() {
                written = self.writer.write_all(key);
            }
            position += key.len() as u64;
            starts.push(position as u32);
        });
        written?;

        // the keys fit when their end offset does
        let starts_offset = to_chunk_offset(self.writer.offset())?;
        if self.options.run_length_encoding {
            let encoded = self.encoder.encode(&starts);
            self.writer.write_all(encoded)?;
        } else {
            write_ints(&mut self.writer, &starts, byte_order)?;
        }
        write_int(&mut self.writer, content_offset, byte_order)?;
        write_int(&mut self.writer, starts_offset, byte_order)
    }
}

impl<W: Write> ColumnWriter for StringColumnWriter<W> {
    type Vector = BinaryColumnVector;

    /// Writes the first `size` rows of `vector`.
    ///
    /// Rows are checked before anything is written, so an invalid row leaves
    /// the chunk untouched. A failure past that point (offset overflow or a
    /// sink error) leaves a partial batch behind: the chunk is then failed
    /// and every later `write`, `new_pixel` or `flush` returns
    /// [`Error::SealedChunkMutation`].
    fn write(&mut self, vector: &BinaryColumnVector, size: usize) -> Result<usize> {
        self.check_accumulating()?;
        Self::check_rows(vector, size)?;

        let result = self.write_rows(vector, size);
        self.abort_on_error(result)?;
        Ok(self.writer.offset() as usize)
    }

    fn new_pixel(&mut self) -> Result<()> {
        self.check_accumulating()?;
        let result = self.seal_pixel();
        self.abort_on_error(result)
    }

    fn flush(&mut self) -> Result<()> {
        self.check_accumulating()?;
        let result = self.flush_chunk();
        self.abort_on_error(result)?;
        self.state = State::Flushed;

        let index = self.pixels.index();
        info!(
            "flushed string column chunk: {} rows in {} pixels, {} bytes, {:?}",
            index.num_rows(),
            index.pixels.len(),
            self.writer.offset(),
            self.column_chunk_encoding().kind
        );
        Ok(())
    }

    fn column_chunk_encoding(&self) -> ColumnEncoding {
        if !self.options.dictionary_encoding {
            return ColumnEncoding::none();
        }
        let size = self
            .dictionary
            .as_ref()
            .map(|dictionary| dictionary.len() as u32)
            .unwrap_or(self.dictionary_size);
        ColumnEncoding::dictionary(size, self.options.run_length_encoding)
    }

    fn column_chunk_index(&self) -> &ColumnChunkIndex {
        self.pixels.index()
    }

    fn close(&mut self) -> Result<()> {
        if self.state == State::Closed {
            return Ok(());
        }
        if let Some(dictionary) = self.dictionary.take() {
            self.dictionary_size = dictionary.len() as u32;
        }
        self.starts = Vec::new();
        self.codes = Vec::new();
        self.encoder.close();
        self.state = State::Closed;
        Ok(())
    }
}
