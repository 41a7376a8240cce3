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

use serde::{Deserialize, Serialize};

/// Statistics capability used by the column writers, per pixel and per chunk.
pub trait StatsRecorder {
    /// Records one null value.
    fn increment(&mut self);

    /// Records `count` occurrences of `value`.
    fn update_string(&mut self, value: &[u8], count: u64);

    fn merge(&mut self, other: &Self);

    fn reset(&mut self);

    /// Number of non-null values recorded.
    fn num_values(&self) -> u64;

    fn has_null(&self) -> bool;
}

/// Min/max/count statistics over byte strings, ordered byte-wise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StringStatsRecorder {
    pub num_values: u64,
    pub null_count: u64,
    pub sum_length: u64,
    pub minimum: Option<Vec<u8>>,
    pub maximum: Option<Vec<u8>>,
}

impl StringStatsRecorder {
    fn update_bounds(&mut self, min: &[u8], max: &[u8]) {
        match &mut self.minimum {
            Some(current) if current.as_slice() <= min => {}
            Some(current) => {
                current.clear();
                current.extend_from_slice(min);
            }
            None => self.minimum = Some(min.to_vec()),
        }
        match &mut self.maximum {
            Some(current) if current.as_slice() >= max => {}
            Some(current) => {
                current.clear();
                current.extend_from_slice(max);
            }
            None => self.maximum = Some(max.to_vec()),
        }
    }
}

impl StatsRecorder for StringStatsRecorder {
    fn increment(&mut self) {
        self.null_count += 1;
    }

    fn update_string(&mut self, value: &[u8], count: u64) {
        self.update_bounds(value, value);
        self.num_values += count;
        self.sum_length += value.len() as u64 * count;
    }

    fn merge(&mut self, other: &Self) {
        if let (Some(min), Some(max)) = (&other.minimum, &other.maximum) {
            self.update_bounds(min, max);
        }
        self.num_values += other.num_values;
        self.null_count += other.null_count;
        self.sum_length += other.sum_length;
    }

    fn reset(&mut self) {
        self.num_values = 0;
        self.null_count = 0;
        self.sum_length = 0;
        self.minimum = None;
        self.maximum = None;
    }

    fn num_values(&self) -> u64 {
        self.num_values
    }

    fn has_null(&self) -> bool {
        self.null_count > 0
    }
}
