//! In-memory column vectors consumed by the column writers.
mod binary;

pub use binary::{BinaryColumnVector, Owner, RowSlot};

use crate::errors::{Error, Result};

/// Default number of rows of a column vector.
pub const DEFAULT_SIZE: usize = 1024;

/// Null flags, repeating flag and write cursor shared by every column vector.
#[derive(Debug, Clone)]
pub struct VectorBase {
    is_null: Vec<bool>,
    no_nulls: bool,
    is_repeating: bool,
    write_index: usize,
    memory_usage: usize,
    closed: bool,
}

impl VectorBase {
    pub fn new(len: usize) -> Self {
        Self {
            is_null: vec![false; len],
            no_nulls: true,
            is_repeating: false,
            write_index: 0,
            memory_usage: len,
            closed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.is_null.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_null.is_empty()
    }

    /// Row whose slot holds the value of `row`: a repeating vector keeps
    /// everything in slot 0.
    #[inline]
    pub fn resolve(&self, row: usize) -> usize {
        if self.is_repeating {
            0
        } else {
            row
        }
    }

    pub fn is_null(&self, row: usize) -> bool {
        self.is_null
            .get(self.resolve(row))
            .copied()
            .unwrap_or(false)
    }

    pub fn set_null_flag(&mut self, row: usize, is_null: bool) {
        self.is_null[row] = is_null;
        if is_null {
            self.no_nulls = false;
        }
    }

    pub fn has_nulls(&self) -> bool {
        !self.no_nulls
    }

    pub fn is_repeating(&self) -> bool {
        self.is_repeating
    }

    pub fn set_repeating(&mut self, is_repeating: bool) {
        self.is_repeating = is_repeating;
    }

    pub fn write_index(&self) -> usize {
        self.write_index
    }

    pub(crate) fn advance_write_index(&mut self, row: usize) {
        if row >= self.write_index {
            self.write_index = row + 1;
        }
    }

    pub fn memory_usage(&self) -> usize {
        self.memory_usage
    }

    pub(crate) fn add_memory_usage(&mut self, bytes: usize) {
        self.memory_usage += bytes;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::VectorClosed);
        }
        Ok(())
    }

    /// Fails unless `row` addresses an existing slot of an open vector.
    pub fn check_row(&self, row: usize) -> Result<()> {
        self.check_open()?;
        if row >= self.len() {
            return Err(row_err!(
                "row {} is out of the vector capacity {}",
                row,
                self.len()
            ));
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.is_null.iter_mut().for_each(|v| *v = false);
        self.no_nulls = true;
        self.is_repeating = false;
        self.write_index = 0;
    }

    pub fn ensure_capacity(&mut self, size: usize, preserve_data: bool) -> Result<()> {
        self.check_open()?;
        if size <= self.len() {
            return Ok(());
        }
        let old = std::mem::replace(&mut self.is_null, vec![false; size]);
        if preserve_data {
            if self.is_repeating {
                if let Some(first) = old.first() {
                    self.is_null[0] = *first;
                }
            } else {
                self.is_null[..old.len()].copy_from_slice(&old);
            }
        }
        self.memory_usage += size;
        Ok(())
    }

    pub fn close(&mut self) {
        self.is_null = Vec::new();
        self.closed = true;
    }
}

/// Capability every column vector offers to the column writers: null flags,
/// the repeating flag and lifecycle hooks.
pub trait TypedColumnVector {
    fn base(&self) -> &VectorBase;

    fn base_mut(&mut self) -> &mut VectorBase;

    /// Number of row slots.
    fn len(&self) -> usize {
        self.base().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_null(&self, row: usize) -> bool {
        self.base().is_null(row)
    }

    fn has_nulls(&self) -> bool {
        self.base().has_nulls()
    }

    fn is_repeating(&self) -> bool {
        self.base().is_repeating()
    }

    fn set_repeating(&mut self, is_repeating: bool) {
        self.base_mut().set_repeating(is_repeating)
    }

    /// Prepares the vector for the next batch without releasing its buffers.
    fn reset(&mut self);

    /// Grows the row slots to at least `size`.
    fn ensure_capacity(&mut self, size: usize, preserve_data: bool) -> Result<()>;

    /// Releases all storage, the vector is unusable afterwards.
    fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_ensure_capacity() {
        let mut base = VectorBase::new(2);
        base.set_null_flag(1, true);
        base.ensure_capacity(4, true).unwrap();
        assert_eq!(base.len(), 4);
        assert!(base.is_null(1));
        assert!(!base.is_null(3));
        assert!(base.has_nulls());

        base.reset();
        assert!(!base.is_null(1));
        assert!(!base.has_nulls());
    }

    #[test]
    fn test_base_repeating_resolves_to_first_slot() {
        let mut base = VectorBase::new(4);
        base.set_null_flag(0, true);
        base.set_repeating(true);
        assert!(base.is_null(3));
        base.ensure_capacity(8, true).unwrap();
        assert!(base.is_null(7));
    }

    #[test]
    fn test_base_closed() {
        let mut base = VectorBase::new(4);
        base.close();
        assert!(matches!(base.check_row(0), Err(Error::VectorClosed)));
        assert!(base.ensure_capacity(8, true).is_err());
    }
}
