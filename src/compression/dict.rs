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

use hashbrown::hash_map::RawEntryMut;
use hashbrown::HashMap;

const DEFAULT_DEDUP_CAPACITY: usize = 4096;

/// Interner assigning dense codes to distinct byte strings.
pub trait Dictionary {
    /// Returns the code of `key`, inserting it when unseen.
    fn add(&mut self, key: &[u8]) -> u32;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visits every key in code order, which is also the serialization order.
    fn visit<F: FnMut(u32, &[u8])>(&self, f: F);

    fn clear(&mut self);
}

/// Dictionary backed by a hash table of codes; the keys live contiguously in
/// one byte buffer.
#[derive(Debug)]
pub struct HashTableDictionary {
    state: ahash::RandomState,
    dedup: HashMap<u32, (), ()>,
    content: Vec<u8>,
    starts: Vec<usize>,
}

impl Default for HashTableDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl HashTableDictionary {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_DEDUP_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Default::default(),
            dedup: HashMap::with_capacity_and_hasher(capacity, ()),
            content: vec![],
            starts: vec![0],
        }
    }

    pub fn key(&self, code: u32) -> Option<&[u8]> {
        let code = code as usize;
        if code + 1 >= self.starts.len() {
            return None;
        }
        Some(&self.content[self.starts[code]..self.starts[code + 1]])
    }

    /// Total bytes of all keys.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }
}

fn key_of<'a>(content: &'a [u8], starts: &[usize], code: u32) -> &'a [u8] {
    let code = code as usize;
    &content[starts[code]..starts[code + 1]]
}

impl Dictionary for HashTableDictionary {
    fn add(&mut self, key: &[u8]) -> u32 {
        let hash = self.state.hash_one(key);

        let content = &self.content;
        let starts = &self.starts;
        let entry = self
            .dedup
            .raw_entry_mut()
            .from_hash(hash, |code| key_of(content, starts, *code) == key);

        match entry {
            RawEntryMut::Occupied(entry) => *entry.into_key(),
            RawEntryMut::Vacant(entry) => {
                let code = (self.starts.len() - 1) as u32;
                self.content.extend_from_slice(key);
                self.starts.push(self.content.len());
                let content = &self.content;
                let starts = &self.starts;
                let state = &self.state;
                *entry
                    .insert_with_hasher(hash, code, (), |code| {
                        state.hash_one(key_of(content, starts, *code))
                    })
                    .0
            }
        }
    }

    fn len(&self) -> usize {
        self.starts.len() - 1
    }

    fn visit<F: FnMut(u32, &[u8])>(&self, mut f: F) {
        for (code, range) in self.starts.windows(2).enumerate() {
            f(code as u32, &self.content[range[0]..range[1]]);
        }
    }

    fn clear(&mut self) {
        self.dedup.clear();
        self.content.clear();
        self.starts.clear();
        self.starts.push(0);
    }
}
