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

use arrow::bitmap::{Bitmap, MutableBitmap};
use byteorder::{BigEndian as BE, ByteOrder as _, LittleEndian as LE};
use log::debug;

use crate::compression::rle::RunLenIntEncoder;
use crate::errors::{Error, Result};
use crate::options::ByteOrder;
use crate::{ColumnChunkIndex, ColumnEncoding, EncodingKind};

const INT_SIZE: usize = std::mem::size_of::<u32>();

/// Random access over the rows of a string column chunk.
#[derive(Debug)]
pub struct StringChunkReader<'a> {
    // row content, or dictionary keys when dictionary encoded
    content: &'a [u8],
    starts: Vec<u32>,
    codes: Option<Vec<u32>>,
    is_null: Bitmap,
    // stored slot of every row, only when nulls are not padded
    row_map: Option<Vec<u32>>,
}

impl<'a> StringChunkReader<'a> {
    pub fn try_new(
        chunk: &'a [u8],
        index: &ColumnChunkIndex,
        encoding: &ColumnEncoding,
    ) -> Result<Self> {
        let byte_order = index.byte_order();

        let mut is_null = MutableBitmap::with_capacity(index.num_rows() as usize);
        let mut row_map = (!index.nulls_padding).then(Vec::new);
        let mut stored = 0u32;
        for pixel in &index.pixels {
            for row in 0..pixel.num_rows as usize {
                let null = pixel.is_null(row);
                is_null.push(null);
                if let Some(row_map) = row_map.as_mut() {
                    row_map.push(stored);
                }
                if !null || index.nulls_padding {
                    stored += 1;
                }
            }
        }
        let stored = stored as usize;
        let is_null: Bitmap = is_null.into();

        let reader = match encoding.kind {
            EncodingKind::None => {
                let (content, starts) = read_plain(chunk, stored, byte_order)?;
                Self {
                    content,
                    starts,
                    codes: None,
                    is_null,
                    row_map,
                }
            }
            EncodingKind::Dictionary => {
                let (content, starts, content_offset) = read_dictionary(chunk, encoding, byte_order)?;
                let codes = read_codes(&chunk[..content_offset], index, encoding, byte_order)?;
                if codes.len() != stored {
                    return Err(general_err!(
                        "expected {} dictionary codes, found {}",
                        stored,
                        codes.len()
                    ));
                }
                check_codes(&codes, &is_null, row_map.as_deref(), encoding.dictionary_size)?;
                Self {
                    content,
                    starts,
                    codes: Some(codes),
                    is_null,
                    row_map,
                }
            }
        };
        debug!(
            "opened string column chunk of {} bytes, {} rows",
            chunk.len(),
            reader.num_rows()
        );
        Ok(reader)
    }

    pub fn num_rows(&self) -> usize {
        self.is_null.len()
    }

    pub fn is_null(&self, row: usize) -> bool {
        row < self.num_rows() && self.is_null.get_bit(row)
    }

    /// The bytes of `row`, `None` for a null row.
    pub fn value(&self, row: usize) -> Result<Option<&'a [u8]>> {
        if row >= self.num_rows() {
            return Err(row_err!(
                "row {} is out of a chunk of {} rows",
                row,
                self.num_rows()
            ));
        }
        if self.is_null.get_bit(row) {
            return Ok(None);
        }
        let slot = match &self.row_map {
            Some(row_map) => row_map[row] as usize,
            None => row,
        };
        let slot = match &self.codes {
            Some(codes) => codes[slot] as usize,
            None => slot,
        };
        let start = self.starts[slot] as usize;
        let end = self.starts[slot + 1] as usize;
        Ok(Some(&self.content[start..end]))
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<Option<&'a [u8]>>> + '_ {
        (0..self.num_rows()).map(move |row| self.value(row))
    }

    pub fn read_all(&self) -> Result<Vec<Option<Vec<u8>>>> {
        self.iter()
            .map(|value| value.map(|v| v.map(<[u8]>::to_vec)))
            .collect()
    }
}

fn read_int(bytes: &[u8], byte_order: ByteOrder) -> u32 {
    match byte_order {
        ByteOrder::LittleEndian => LE::read_u32(bytes),
        ByteOrder::BigEndian => BE::read_u32(bytes),
    }
}

fn read_ints(bytes: &[u8], length: usize, byte_order: ByteOrder) -> Result<Vec<u32>> {
    if bytes.len() != length * INT_SIZE {
        return Err(general_err!(
            "expected {} integers, found {} bytes",
            length,
            bytes.len()
        ));
    }
    let mut values = vec![0u32; length];
    match byte_order {
        ByteOrder::LittleEndian => LE::read_u32_into(bytes, &mut values),
        ByteOrder::BigEndian => BE::read_u32_into(bytes, &mut values),
    }
    Ok(values)
}

/// Reads the trailing offset ending `INT_SIZE * back` bytes before the end.
fn read_trailer(chunk: &[u8], back: usize, byte_order: ByteOrder) -> Result<usize> {
    if chunk.len() < back * INT_SIZE {
        return Err(general_err!(
            "column chunk of {} bytes is too short for its trailer",
            chunk.len()
        ));
    }
    let end = chunk.len() - (back - 1) * INT_SIZE;
    Ok(read_int(&chunk[end - INT_SIZE..end], byte_order) as usize)
}

fn check_starts(starts: &[u32], content_len: usize) -> Result<()> {
    let monotone = starts.windows(2).all(|w| w[0] <= w[1]);
    let last = starts.last().copied().unwrap_or(0) as usize;
    if !monotone || last > content_len {
        return Err(general_err!(
            "starts array does not fit a content of {} bytes",
            content_len
        ));
    }
    Ok(())
}

fn read_plain(chunk: &[u8], stored: usize, byte_order: ByteOrder) -> Result<(&[u8], Vec<u32>)> {
    let starts_offset = read_trailer(chunk, 1, byte_order)?;
    let trailer = chunk.len() - INT_SIZE;
    if starts_offset > trailer {
        return Err(general_err!(
            "starts offset {} is beyond the chunk of {} bytes",
            starts_offset,
            chunk.len()
        ));
    }
    let starts = read_ints(&chunk[starts_offset..trailer], stored + 1, byte_order)?;
    let content = &chunk[..starts_offset];
    check_starts(&starts, content.len())?;
    Ok((content, starts))
}

fn read_dictionary<'a>(
    chunk: &'a [u8],
    encoding: &ColumnEncoding,
    byte_order: ByteOrder,
) -> Result<(&'a [u8], Vec<u32>, usize)> {
    let content_offset = read_trailer(chunk, 2, byte_order)?;
    let starts_offset = read_trailer(chunk, 1, byte_order)?;
    let trailer = chunk.len() - 2 * INT_SIZE;
    if content_offset > starts_offset || starts_offset > trailer {
        return Err(general_err!(
            "dictionary offsets {} and {} do not fit a chunk of {} bytes",
            content_offset,
            starts_offset,
            chunk.len()
        ));
    }

    let length = encoding.dictionary_size as usize + 1;
    let section = &chunk[starts_offset..trailer];
    let starts = if encoding.cascade_run_length {
        let mut starts = Vec::with_capacity(length);
        let rest = RunLenIntEncoder::decode(section, length, &mut starts)?;
        if !rest.is_empty() {
            return Err(general_err!(
                "{} unexpected bytes after the dictionary starts",
                rest.len()
            ));
        }
        starts
    } else {
        read_ints(section, length, byte_order)?
    };
    let content = &chunk[content_offset..starts_offset];
    check_starts(&starts, content.len())?;
    Ok((content, starts, content_offset))
}

fn read_codes(
    codes_section: &[u8],
    index: &ColumnChunkIndex,
    encoding: &ColumnEncoding,
    byte_order: ByteOrder,
) -> Result<Vec<u32>> {
    let mut codes = Vec::with_capacity(index.num_rows() as usize);
    for (i, pixel) in index.pixels.iter().enumerate() {
        let start = pixel.position as usize;
        let end = index
            .pixels
            .get(i + 1)
            .map(|next| next.position as usize)
            .unwrap_or(codes_section.len());
        if start > end || end > codes_section.len() {
            return Err(general_err!(
                "pixel {} spans {}..{} out of {} bytes of codes",
                i,
                start,
                end,
                codes_section.len()
            ));
        }
        let section = &codes_section[start..end];
        let length = if index.nulls_padding {
            pixel.num_rows as usize
        } else {
            (pixel.num_rows - pixel.null_count()) as usize
        };

        if encoding.cascade_run_length {
            let rest = RunLenIntEncoder::decode(section, length, &mut codes)?;
            if !rest.is_empty() {
                return Err(general_err!(
                    "{} unexpected bytes after the codes of pixel {}",
                    rest.len(),
                    i
                ));
            }
        } else {
            codes.extend(read_ints(section, length, byte_order)?);
        }
    }

    Ok(codes)
}

/// Every non-null row must hold a code of the dictionary; padded nulls are
/// never resolved and may hold anything.
fn check_codes(
    codes: &[u32],
    is_null: &Bitmap,
    row_map: Option<&[u32]>,
    dictionary_size: u32,
) -> Result<()> {
    for row in (0..is_null.len()).filter(|row| !is_null.get_bit(*row)) {
        let slot = row_map.map_or(row, |row_map| row_map[row] as usize);
        let code = codes[slot];
        if code >= dictionary_size {
            return Err(general_err!(
                "row {} holds code {} out of a dictionary of {} keys",
                row,
                code,
                dictionary_size
            ));
        }
    }
    Ok(())
}
