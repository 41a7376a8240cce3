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

use bytes::Bytes;
use log::debug;

use crate::errors::{Error, Result};
use crate::options::BufferLimits;

use super::{TypedColumnVector, VectorBase, DEFAULT_SIZE};

/// Owner of the bytes a row points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    /// Caller-owned memory, set by reference.
    Shared(Bytes),
    /// One of the buffers owned by the vector, set by value.
    Arena(usize),
}

/// Location of one row value: `(owner, start, len)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSlot {
    owner: Option<Owner>,
    start: u32,
    len: u32,
}

impl RowSlot {
    pub fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    pub fn start(&self) -> usize {
        self.start as usize
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Column vector of variable-length byte strings.
///
/// Values are either set by reference ([`BinaryColumnVector::set_ref`]), in
/// which case the row points into caller-owned [`Bytes`], or by value
/// ([`BinaryColumnVector::set_val`]), in which case they are copied into
/// buffers owned by the vector. Both can be mixed in one vector.
///
/// By-value writes go to a *small buffer* that grows geometrically. A value
/// longer than [`BufferLimits::max_small_value_size`] gets a buffer sized
/// exactly for it, and the small buffer resumes at its previous fill position
/// on the next small value. Growing never moves bytes: earlier rows keep
/// pointing at the buffer they were written to, which lives until
/// [`TypedColumnVector::reset`].
#[derive(Debug)]
pub struct BinaryColumnVector {
    base: VectorBase,
    slots: Vec<RowSlot>,

    arenas: Vec<Vec<u8>>,
    // arena receiving the next by-value write, `None` until the first one
    current: Option<usize>,
    next_free: usize,

    small: usize,
    small_next_free: usize,

    buffer_allocation_count: usize,
    limits: BufferLimits,
}

impl Default for BinaryColumnVector {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE)
    }
}

impl BinaryColumnVector {
    pub fn new(size: usize) -> Self {
        Self::with_limits(size, BufferLimits::default())
    }

    pub fn with_limits(size: usize, limits: BufferLimits) -> Self {
        let mut base = VectorBase::new(size);
        base.add_memory_usage(std::mem::size_of::<RowSlot>() * size);
        Self {
            base,
            slots: vec![RowSlot::default(); size],
            arenas: vec![],
            current: None,
            next_free: 0,
            small: 0,
            small_next_free: 0,
            buffer_allocation_count: 0,
            limits,
        }
    }

    /// Builds a vector holding copies of `values`, `None` being a null row.
    pub fn from_values<'a, I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = Option<&'a [u8]>>,
    {
        let values = values.into_iter();
        let mut vector = Self::new(values.size_hint().0.max(1));
        for value in values {
            match value {
                Some(v) => vector.add(v)?,
                None => vector.add_null()?,
            }
        }
        Ok(vector)
    }

    pub fn limits(&self) -> &BufferLimits {
        &self.limits
    }

    pub fn slot(&self, row: usize) -> Option<&RowSlot> {
        self.slots.get(self.base.resolve(row))
    }

    /// The bytes of `row`, `None` for a null or unset row.
    pub fn value(&self, row: usize) -> Option<&[u8]> {
        let row = self.base.resolve(row);
        if self.base.is_null(row) {
            return None;
        }
        let slot = self.slots.get(row)?;
        let range = slot.start()..slot.start() + slot.len();
        match slot.owner.as_ref()? {
            Owner::Shared(bytes) => bytes.get(range),
            Owner::Arena(id) => self.arenas.get(*id)?.get(range),
        }
    }

    /// Number of row slots, same as [`TypedColumnVector::len`].
    pub fn capacity(&self) -> usize {
        self.base.len()
    }

    pub fn write_index(&self) -> usize {
        self.base.write_index()
    }

    /// Number of buffers allocated since the first by-value write or the last
    /// reset.
    pub fn buffer_allocation_count(&self) -> usize {
        self.buffer_allocation_count
    }

    pub fn memory_usage(&self) -> usize {
        self.base.memory_usage()
    }

    /// Capacity of the small buffer, 0 before the first by-value write.
    pub fn small_buffer_capacity(&self) -> usize {
        match self.current {
            Some(_) => self.arenas[self.small].len(),
            None => 0,
        }
    }

    /// Sets `row` to `source[start..start + len]` without copying.
    ///
    /// A `None` source marks the row null.
    pub fn set_ref(
        &mut self,
        row: usize,
        source: Option<Bytes>,
        start: usize,
        len: usize,
    ) -> Result<()> {
        self.base.check_row(row)?;
        match source {
            Some(bytes) => {
                check_source_range(bytes.len(), start, len)?;
                self.slots[row] = RowSlot {
                    owner: Some(Owner::Shared(bytes)),
                    start: to_u32(start)?,
                    len: to_u32(len)?,
                };
                self.base.set_null_flag(row, false);
            }
            None => {
                if len != 0 {
                    return Err(row_err!(
                        "row {} references {} bytes without a source",
                        row,
                        len
                    ));
                }
                self.slots[row] = RowSlot::default();
                self.base.set_null_flag(row, true);
            }
        }
        self.base.advance_write_index(row);
        Ok(())
    }

    pub fn set_null(&mut self, row: usize) -> Result<()> {
        self.set_ref(row, None, 0, 0)
    }

    /// Sets `row` to a copy of `source[start..start + len]`.
    pub fn set_val(&mut self, row: usize, source: &[u8], start: usize, len: usize) -> Result<()> {
        self.base.check_row(row)?;
        let end = check_source_range(source.len(), start, len)?;

        let mut current = match self.current {
            Some(current) => current,
            // buffers are only allocated once a value is copied in
            None => self.init_buffer(0),
        };
        if self.next_free + len > self.arenas[current].len() {
            self.increase_buffer_space(len)?;
            current = self.small_or_current();
        }

        let offset = self.next_free;
        self.arenas[current][offset..offset + len].copy_from_slice(&source[start..end]);
        self.slots[row] = RowSlot {
            owner: Some(Owner::Arena(current)),
            start: to_u32(offset)?,
            len: to_u32(len)?,
        };
        self.base.set_null_flag(row, false);
        self.base.advance_write_index(row);
        self.next_free += len;
        Ok(())
    }

    pub fn set_val_slice(&mut self, row: usize, source: &[u8]) -> Result<()> {
        self.set_val(row, source, 0, source.len())
    }

    /// Copies `value` into the next row, growing the row slots when full.
    pub fn add(&mut self, value: &[u8]) -> Result<()> {
        let row = self.ensure_next_row()?;
        self.set_val(row, value, 0, value.len())
    }

    pub fn add_str(&mut self, value: &str) -> Result<()> {
        self.add(value.as_bytes())
    }

    pub fn add_null(&mut self) -> Result<()> {
        let row = self.ensure_next_row()?;
        self.set_null(row)
    }

    fn ensure_next_row(&mut self) -> Result<usize> {
        let row = self.base.write_index();
        if row >= self.len() {
            self.ensure_capacity((row * 2).max(1), true)?;
        }
        Ok(row)
    }

    fn small_or_current(&self) -> usize {
        self.current.unwrap_or(self.small)
    }

    /// Allocates the first small buffer and returns its id.
    fn init_buffer(&mut self, estimated_value_size: usize) -> usize {
        let estimated = (self.len() as f32
            * estimated_value_size as f32
            * self.limits.extra_space_factor) as usize;
        let size = estimated
            .max(self.limits.default_buffer_size)
            .min(self.limits.max_buffer_capacity);

        self.arenas.push(vec![0u8; size]);
        self.base.add_memory_usage(size);
        let id = self.arenas.len() - 1;
        self.small = id;
        self.current = Some(id);
        self.next_free = 0;
        self.small_next_free = 0;
        self.buffer_allocation_count = 0;
        id
    }

    fn allocate(&mut self, size: usize) -> usize {
        self.arenas.push(vec![0u8; size]);
        self.base.add_memory_usage(size);
        self.buffer_allocation_count += 1;
        self.arenas.len() - 1
    }

    /// Makes the current buffer able to take `next_len` more bytes.
    ///
    /// Oversized values get a dedicated buffer; otherwise the small buffer is
    /// resumed and, if still too short, replaced by one of doubled capacity.
    pub fn increase_buffer_space(&mut self, next_len: usize) -> Result<()> {
        self.base.check_open()?;
        let limit = self.limits.max_buffer_capacity;
        if next_len > limit {
            return Err(Error::CapacityOverflow {
                requested: next_len,
                limit,
            });
        }

        let current = match self.current {
            Some(current) => current,
            None => self.init_buffer(0),
        };

        if next_len > self.limits.max_small_value_size {
            if current == self.small {
                self.small_next_free = self.next_free;
            }
            let id = self.allocate(next_len);
            debug!("allocate dedicated buffer of {} bytes for a large value", next_len);
            self.current = Some(id);
            self.next_free = 0;
            return Ok(());
        }

        if current != self.small {
            // the previous value went to a dedicated buffer
            self.current = Some(self.small);
            self.next_free = self.small_next_free;
        }

        let small_len = self.arenas[self.small].len();
        if self.next_free + next_len > small_len {
            let overflow = || Error::CapacityOverflow {
                requested: next_len,
                limit,
            };
            let mut new_len = small_len
                .max(1)
                .checked_mul(2)
                .filter(|len| *len <= limit)
                .ok_or_else(overflow)?;
            while new_len < next_len {
                new_len = new_len
                    .checked_mul(2)
                    .filter(|len| *len <= limit)
                    .ok_or_else(overflow)?;
            }
            let id = self.allocate(new_len);
            debug!("grow small buffer from {} to {} bytes", small_len, new_len);
            self.small = id;
            self.current = Some(id);
            self.small_next_free = 0;
            self.next_free = 0;
        }
        Ok(())
    }

    fn reset_buffers(&mut self) {
        if let Some(current) = self.current {
            if self.buffer_allocation_count > 0 || current != self.small {
                // only the small buffer survives, dedicated and outgrown
                // buffers were referenced by the rows just cleared
                let small = std::mem::take(&mut self.arenas[self.small]);
                self.arenas.clear();
                self.arenas.push(small);
                self.small = 0;
            }
            self.current = Some(self.small);
        }
        self.next_free = 0;
        self.small_next_free = 0;
        self.buffer_allocation_count = 0;
    }
}

impl TypedColumnVector for BinaryColumnVector {
    fn base(&self) -> &VectorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut VectorBase {
        &mut self.base
    }

    fn reset(&mut self) {
        self.base.reset();
        self.slots.iter_mut().for_each(|slot| *slot = RowSlot::default());
        self.reset_buffers();
    }

    fn ensure_capacity(&mut self, size: usize, preserve_data: bool) -> Result<()> {
        self.base.ensure_capacity(size, preserve_data)?;
        if size <= self.slots.len() {
            return Ok(());
        }
        let old = std::mem::replace(&mut self.slots, vec![RowSlot::default(); size]);
        if preserve_data {
            if self.base.is_repeating() {
                if let Some(first) = old.into_iter().next() {
                    self.slots[0] = first;
                }
            } else {
                for (slot, old) in self.slots.iter_mut().zip(old) {
                    *slot = old;
                }
            }
        }
        self.base
            .add_memory_usage(std::mem::size_of::<RowSlot>() * size);
        Ok(())
    }

    fn close(&mut self) {
        self.base.close();
        self.slots = Vec::new();
        self.arenas = Vec::new();
        self.current = None;
        self.next_free = 0;
        self.small = 0;
        self.small_next_free = 0;
    }
}

fn check_source_range(source_len: usize, start: usize, len: usize) -> Result<usize> {
    match start.checked_add(len) {
        Some(end) if end <= source_len => Ok(end),
        _ => Err(row_err!(
            "range {}..{} is out of a source of {} bytes",
            start,
            start.saturating_add(len),
            source_len
        )),
    }
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::CapacityOverflow {
        requested: value,
        limit: u32::MAX as usize,
    })
}
