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

use bytes::Bytes;
use rand::{rngs::StdRng, Rng, SeedableRng};
use pixelchunk::{
    read::{read_column_chunk, StringChunkReader},
    vector::{BinaryColumnVector, TypedColumnVector},
    write::{ColumnWriter, StringColumnWriter},
    BufferLimits, ByteOrder, ColumnChunkIndex, ColumnEncoding, EncodingLevel, Error,
    WriteOptions,
};

pub const PIXEL_STRIDE: usize = 128;

pub fn create_random_values(size: usize, null_density: f32) -> Vec<Option<Vec<u8>>> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..size)
        .map(|_| {
            if rng.gen::<f32>() > null_density {
                // repeat values so dictionaries have something to share
                let value = rng.gen_range::<i32, _>(0i32..(size as i32 / 4).max(1));
                if value % 10 == 0 {
                    Some(vec![])
                } else {
                    Some(format!("{value}").into_bytes())
                }
            } else {
                None
            }
        })
        .collect()
}

pub fn new_vector(values: &[Option<Vec<u8>>]) -> BinaryColumnVector {
    BinaryColumnVector::from_values(values.iter().map(|v| v.as_deref())).unwrap()
}

pub fn write_chunk(
    values: &[Option<Vec<u8>>],
    options: WriteOptions,
) -> (Vec<u8>, ColumnChunkIndex, ColumnEncoding) {
    let vector = new_vector(values);
    let mut writer = StringColumnWriter::new(vec![], options).unwrap();
    writer.write(&vector, values.len()).unwrap();
    writer.flush().unwrap();
    let index = writer.column_chunk_index().clone();
    let encoding = writer.column_chunk_encoding();
    writer.close().unwrap();
    (writer.into_inner(), index, encoding)
}

fn test_write_read(values: &[Option<Vec<u8>>]) {
    let levels = [EncodingLevel::EL0, EncodingLevel::EL1, EncodingLevel::EL2];
    for level in levels {
        for nulls_padding in [false, true] {
            for byte_order in [ByteOrder::LittleEndian, ByteOrder::BigEndian] {
                let options = WriteOptions {
                    pixel_stride: PIXEL_STRIDE,
                    byte_order,
                    nulls_padding,
                    ..Default::default()
                }
                .with_encoding_level(level);
                test_write_read_with_options(values, options);
            }
        }
    }
}

fn test_write_read_with_options(values: &[Option<Vec<u8>>], options: WriteOptions) {
    let (chunk, index, encoding) = write_chunk(values, options);

    assert_eq!(index.num_rows(), values.len() as u64);
    assert_eq!(
        index.pixels.len(),
        (values.len() + PIXEL_STRIDE - 1) / PIXEL_STRIDE
    );
    for (row, value) in values.iter().enumerate() {
        assert_eq!(index.is_null(row as u64), Some(value.is_none()));
    }

    let reader = StringChunkReader::try_new(&chunk, &index, &encoding).unwrap();
    assert_eq!(reader.read_all().unwrap(), values, "{options:?}");
}

#[test]
fn test_random_nonull() {
    test_write_read(&create_random_values(1000, 0.0));
}

#[test]
fn test_random() {
    test_write_read(&create_random_values(1000, 0.3));
}

#[test]
fn test_all_null() {
    test_write_read(&create_random_values(300, 1.0));
}

#[test]
fn test_empty() {
    test_write_read(&[]);
}

#[test]
fn test_pixels() {
    let values: Vec<Option<Vec<u8>>> = (0..10)
        .map(|i| (i % 3 != 0).then(|| vec![b'x'; i]))
        .collect();
    let options = WriteOptions {
        pixel_stride: 4,
        ..Default::default()
    };
    let (chunk, index, _) = write_chunk(&values, options);

    let rows: Vec<u64> = index.pixels.iter().map(|p| p.num_rows).collect();
    assert_eq!(rows, vec![4, 4, 2]);
    let positions: Vec<u64> = index.pixels.iter().map(|p| p.position).collect();
    assert_eq!(positions, vec![0, 3, 3 + 4 + 5 + 7]);
    assert_eq!(index.statistics.num_values, 6);
    assert_eq!(index.statistics.null_count, 4);
    assert_eq!(index.statistics.sum_length, 1 + 2 + 4 + 5 + 7 + 8);
    assert_eq!(index.statistics.minimum.as_deref(), Some(&b"x"[..]));
    assert_eq!(index.statistics.maximum.as_deref(), Some(&b"xxxxxxxx"[..]));
    // three pixels, each with one or two nulls
    assert!(index.pixels.iter().all(|p| p.null_count() > 0));

    let content_len: usize = values.iter().flatten().map(|v| v.len()).sum();
    // six stored rows plus the sentinel, then the starts offset
    assert_eq!(chunk.len(), content_len + 7 * 4 + 4);
}

#[test]
fn test_split_writes() {
    let values = create_random_values(500, 0.2);
    let options = WriteOptions {
        pixel_stride: 64,
        ..Default::default()
    };
    let (whole, whole_index, _) = write_chunk(&values, options);

    let mut writer = StringColumnWriter::new(vec![], options).unwrap();
    for part in values.chunks(37) {
        writer.write(&new_vector(part), part.len()).unwrap();
    }
    writer.flush().unwrap();
    assert_eq!(writer.column_chunk_index(), &whole_index);
    assert_eq!(writer.into_inner(), whole);
}

#[test]
fn test_by_ref_and_by_value() {
    let source = Bytes::from_static(b"hello world");
    let mut by_ref = BinaryColumnVector::new(3);
    by_ref.set_ref(0, Some(source.clone()), 0, 5).unwrap();
    by_ref.set_ref(1, None, 0, 0).unwrap();
    by_ref.set_ref(2, Some(source.clone()), 6, 5).unwrap();

    let mut by_value = BinaryColumnVector::new(3);
    by_value.set_val(0, &source, 0, 5).unwrap();
    by_value.set_null(1).unwrap();
    by_value.set_val(2, &source, 6, 5).unwrap();

    let mut chunks = vec![];
    for vector in [&by_ref, &by_value] {
        let mut writer = StringColumnWriter::new(vec![], WriteOptions::default()).unwrap();
        writer.write(vector, 3).unwrap();
        writer.flush().unwrap();
        chunks.push(writer.into_inner());
    }
    assert_eq!(chunks[0], chunks[1]);
}

#[test]
fn test_buffer_growth() {
    let mut vector = BinaryColumnVector::new(4);
    let lengths = [10, 2_000_000, 10, 10];
    let values: Vec<Vec<u8>> = lengths
        .iter()
        .enumerate()
        .map(|(i, len)| vec![b'a' + i as u8; *len])
        .collect();
    for value in &values {
        vector.add(value).unwrap();
    }
    assert!(vector.buffer_allocation_count() >= 1);
    for (row, value) in values.iter().enumerate() {
        assert_eq!(vector.value(row), Some(value.as_slice()));
    }

    let mut writer = StringColumnWriter::new(vec![], WriteOptions::default()).unwrap();
    writer.write(&vector, 4).unwrap();
    writer.flush().unwrap();
    let index = writer.column_chunk_index().clone();
    let chunk = writer.into_inner();
    let reader = StringChunkReader::try_new(&chunk, &index, &ColumnEncoding::none()).unwrap();
    for (row, value) in values.iter().enumerate() {
        assert_eq!(reader.value(row).unwrap(), Some(value.as_slice()));
    }
}

#[test]
fn test_capacity_overflow() {
    let limits = BufferLimits {
        default_buffer_size: 16,
        max_small_value_size: usize::MAX,
        max_buffer_capacity: 64,
        extra_space_factor: 1.0,
    };
    let mut vector = BinaryColumnVector::with_limits(4, limits);
    vector.add(&[0; 16]).unwrap();
    assert!(matches!(
        vector.add(&[0; 100]),
        Err(Error::CapacityOverflow { .. })
    ));
}

#[test]
fn test_repeating() {
    let mut vector = BinaryColumnVector::new(5);
    vector.set_val_slice(0, b"same").unwrap();
    vector.set_repeating(true);

    let options = WriteOptions::default().with_encoding_level(EncodingLevel::EL2);
    let mut writer = StringColumnWriter::new(vec![], options).unwrap();
    writer.write(&vector, 5).unwrap();
    writer.flush().unwrap();
    assert_eq!(
        writer.column_chunk_encoding(),
        ColumnEncoding::dictionary(1, true)
    );
    let index = writer.column_chunk_index().clone();
    let encoding = writer.column_chunk_encoding();
    let chunk = writer.into_inner();
    // one run of codes, one key, two runs of starts, two trailers
    assert_eq!(chunk.len(), 8 + 4 + 2 * 8 + 2 * 4);

    let reader = StringChunkReader::try_new(&chunk, &index, &encoding).unwrap();
    assert_eq!(reader.read_all().unwrap(), vec![Some(b"same".to_vec()); 5]);
}

/// A sink failing after `capacity` bytes.
struct FailingSink {
    capacity: usize,
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if buf.len() > self.capacity {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "sink is full",
            ));
        }
        self.capacity -= buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_failing_sink() {
    let values = create_random_values(100, 0.0);
    let vector = new_vector(&values);
    let mut writer = StringColumnWriter::new(FailingSink { capacity: 16 }, WriteOptions::default())
        .unwrap();
    let result = writer.write(&vector, values.len());
    assert!(matches!(result, Err(Error::EncoderResourceExhaustion(_))));
}

#[test]
fn test_file_sink() {
    let values = create_random_values(1000, 0.1);
    let options = WriteOptions {
        pixel_stride: PIXEL_STRIDE,
        ..Default::default()
    }
    .with_encoding_level(EncodingLevel::EL2);

    let mut file = tempfile::tempfile().unwrap();
    file.write_all(b"header").unwrap();

    let mut writer = StringColumnWriter::new(&mut file, options).unwrap();
    writer.write(&new_vector(&values), values.len()).unwrap();
    writer.flush().unwrap();
    let length = writer.bytes_written() as usize;
    let index = writer.column_chunk_index().clone();
    let encoding = writer.column_chunk_encoding();
    writer.close().unwrap();
    drop(writer);

    let chunk = read_column_chunk(&mut file, 6, length).unwrap();
    let reader = StringChunkReader::try_new(&chunk, &index, &encoding).unwrap();
    assert_eq!(reader.read_all().unwrap(), values);
}
