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

use pixelchunk::{
    read::StringChunkReader,
    write::{ColumnWriter, StringColumnWriter},
    ByteOrder, ColumnChunkIndex, ColumnEncoding, EncodingKind, Error, WriteOptions,
};

use crate::io::{create_random_values, new_vector, write_chunk, PIXEL_STRIDE};

fn write_data(dest: &mut Vec<u8>, options: WriteOptions) -> (ColumnChunkIndex, ColumnEncoding) {
    let values = create_random_values(1000, 0.25);
    let mut writer = StringColumnWriter::new(dest, options).unwrap();
    writer.write(&new_vector(&values), values.len()).unwrap();
    writer.flush().unwrap();
    (
        writer.column_chunk_index().clone(),
        writer.column_chunk_encoding(),
    )
}

#[test]
fn test_index_json() {
    let mut bytes = vec![];
    let options = WriteOptions {
        pixel_stride: PIXEL_STRIDE,
        nulls_padding: true,
        byte_order: ByteOrder::BigEndian,
        ..Default::default()
    };
    let (index, encoding) = write_data(&mut bytes, options);

    let json = index.to_json().unwrap();
    let decoded = ColumnChunkIndex::from_json(&json).unwrap();
    assert_eq!(decoded, index);
    assert_eq!(decoded.byte_order(), ByteOrder::BigEndian);
    assert!(decoded.nulls_padding);
    assert!(decoded.has_null());

    let encoding_json = serde_json::to_vec(&encoding).unwrap();
    let encoding: ColumnEncoding = serde_json::from_slice(&encoding_json).unwrap();
    assert_eq!(encoding.kind, EncodingKind::None);

    // the decoded metadata is enough to read the chunk back
    let reader = StringChunkReader::try_new(&bytes, &decoded, &encoding).unwrap();
    assert_eq!(reader.num_rows(), 1000);
}

#[test]
fn test_invalid_index_json() {
    assert!(matches!(
        ColumnChunkIndex::from_json(b"{\"pixels\": 3}"),
        Err(Error::OutOfSpec(_))
    ));
}

#[test]
fn test_pixel_meta() {
    let values = create_random_values(1000, 0.25);
    let options = WriteOptions {
        pixel_stride: PIXEL_STRIDE,
        dictionary_encoding: true,
        ..Default::default()
    };
    let (chunk, index, encoding) = write_chunk(&values, options);

    assert_eq!(encoding.kind, EncodingKind::Dictionary);
    assert!(!encoding.cascade_run_length);
    let mut distinct: Vec<&Vec<u8>> = values.iter().flatten().collect();
    distinct.sort();
    distinct.dedup();
    assert_eq!(encoding.dictionary_size as usize, distinct.len());

    // each pixel holds one 4-byte code per non-null row
    for (i, pixel) in index.pixels.iter().enumerate() {
        let end = index
            .pixels
            .get(i + 1)
            .map(|next| next.position)
            .unwrap_or_else(|| {
                let len = chunk.len();
                u32::from_le_bytes(chunk[len - 8..len - 4].try_into().unwrap()) as u64
            });
        assert_eq!(end - pixel.position, (pixel.num_rows - pixel.null_count()) * 4);
    }

    let nulls = values.iter().filter(|v| v.is_none()).count() as u64;
    assert_eq!(index.statistics.null_count, nulls);
    assert_eq!(index.statistics.num_values, values.len() as u64 - nulls);
    let merged: u64 = index.pixels.iter().map(|p| p.statistics.null_count).sum();
    assert_eq!(merged, nulls);
}
