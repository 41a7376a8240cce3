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

use arrow::types::NativeType;
use byteorder::{ByteOrder, LittleEndian};

use crate::errors::{Error, Result};

const RUN_LENGTH_BYTES: usize = std::mem::size_of::<u32>();

/// Run-length encoder of integer streams.
///
/// Every run is written as `[u32 LE run length][value LE bytes]`. An empty
/// stream encodes to zero bytes.
#[derive(Debug, Clone, Default)]
pub struct RunLenIntEncoder {
    buffer: Vec<u8>,
}

impl RunLenIntEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes `values`; the returned bytes are valid until the next call.
    pub fn encode<T: NativeType>(&mut self, values: &[T]) -> &[u8] {
        self.buffer.clear();
        Self::encode_native(&mut self.buffer, values.iter().copied());
        &self.buffer
    }

    pub fn encode_native<T: NativeType>(output: &mut Vec<u8>, values: impl IntoIterator<Item = T>) {
        let mut values = values.into_iter();
        let mut last_value = match values.next() {
            Some(v) => v,
            None => return,
        };
        let mut seen_count: u32 = 1;

        for item in values {
            if item == last_value && seen_count < u32::MAX {
                seen_count += 1;
            } else {
                // flush u32 cnt, value
                output.extend_from_slice(&seen_count.to_le_bytes());
                output.extend_from_slice(last_value.to_le_bytes().as_ref());
                last_value = item;
                seen_count = 1;
            }
        }

        output.extend_from_slice(&seen_count.to_le_bytes());
        output.extend_from_slice(last_value.to_le_bytes().as_ref());
    }

    /// Decodes `length` values into `output`, returning the unread input.
    pub fn decode<'a, T: NativeType>(
        mut input: &'a [u8],
        length: usize,
        output: &mut Vec<T>,
    ) -> Result<&'a [u8]> {
        let value_size = std::mem::size_of::<T>();
        let mut num_values = 0;
        output.reserve(length);
        while num_values < length {
            if input.len() < RUN_LENGTH_BYTES + value_size {
                return Err(general_err!(
                    "run-length stream ended after {} of {} values",
                    num_values,
                    length
                ));
            }
            let run = LittleEndian::read_u32(&input[..RUN_LENGTH_BYTES]) as usize;
            let bytes: T::Bytes =
                match input[RUN_LENGTH_BYTES..RUN_LENGTH_BYTES + value_size].try_into() {
                    Ok(bytes) => bytes,
                    Err(_) => unreachable!(),
                };
            let value = T::from_le_bytes(bytes);
            if run == 0 || num_values + run > length {
                return Err(general_err!(
                    "invalid run of {} values at {} of {}",
                    run,
                    num_values,
                    length
                ));
            }
            output.extend(std::iter::repeat(value).take(run));
            num_values += run;
            input = &input[RUN_LENGTH_BYTES + value_size..];
        }
        Ok(input)
    }

    /// Releases the scratch buffer.
    pub fn close(&mut self) {
        self.buffer = Vec::new();
    }
}
