//! Double-buffered path metrics for add-compare-select decoding.
//!
//! Each decode step reads the metrics finalized by the previous step and
//! writes the metrics of the current one. The two arrays trade roles with
//! `swap` once per step, so nothing is reallocated inside the decode loop.
//!
//! The write target is tracked as a single `Slot` tag; the read array is
//! always the other slot, so the two views can never alias.

use crate::error::{CodeError, Result};

/// Accumulated path error (number of disagreeing bits).
pub type Distance = u16;

/// One of the two metric arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Zero,
    One,
}

impl Slot {
    /// The opposite slot.
    pub fn other(self) -> Self {
        match self {
            Slot::Zero => Slot::One,
            Slot::One => Slot::Zero,
        }
    }

    fn index(self) -> usize {
        match self {
            Slot::Zero => 0,
            Slot::One => 1,
        }
    }
}

/// Two fixed-size metric arrays with rotating read/write roles.
#[derive(Debug, Clone)]
pub struct ErrorBuffer {
    errors: [Vec<Distance>; 2],
    write: Slot,
}

impl ErrorBuffer {
    /// Allocate two zeroed arrays of `num_states` metrics.
    ///
    /// Slot 0 starts as the read array and slot 1 as the write array.
    ///
    /// # Errors
    /// `CodeError::Allocation` if either array cannot be allocated.
    pub fn new(num_states: usize) -> Result<Self> {
        Ok(Self {
            errors: [zeroed(num_states)?, zeroed(num_states)?],
            write: Slot::One,
        })
    }

    /// Number of metrics per array.
    pub fn num_states(&self) -> usize {
        self.errors[0].len()
    }

    /// Zero both arrays and restore the initial roles.
    pub fn reset(&mut self) {
        self.errors[0].fill(0);
        self.errors[1].fill(0);
        self.write = Slot::One;
    }

    /// Rotate roles: the array just written becomes the read array.
    ///
    /// Call once per decoded symbol, after every write for that step.
    pub fn swap(&mut self) {
        self.write = self.write.other();
    }

    /// Slot currently being written.
    pub fn write_slot(&self) -> Slot {
        self.write
    }

    /// Slot currently being read.
    pub fn read_slot(&self) -> Slot {
        self.write.other()
    }

    /// Metrics finalized at the previous step.
    pub fn read_errors(&self) -> &[Distance] {
        &self.errors[self.read_slot().index()]
    }

    /// Metrics being computed for the current step.
    pub fn write_errors(&self) -> &[Distance] {
        &self.errors[self.write.index()]
    }

    /// Mutable view of the metrics being computed for the current step.
    pub fn write_errors_mut(&mut self) -> &mut [Distance] {
        &mut self.errors[self.write.index()]
    }

    /// Borrow the read array and the write array at the same time.
    pub fn split(&mut self) -> (&[Distance], &mut [Distance]) {
        let [zero, one] = &mut self.errors;
        match self.write {
            Slot::Zero => (one.as_slice(), zero.as_mut_slice()),
            Slot::One => (zero.as_slice(), one.as_mut_slice()),
        }
    }
}

fn zeroed(num_states: usize) -> Result<Vec<Distance>> {
    let mut errors = Vec::new();
    errors
        .try_reserve_exact(num_states)
        .map_err(|_| CodeError::Allocation { what: "error buffer" })?;
    errors.resize(num_states, 0);
    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_zeroed_and_distinct() {
        let buf = ErrorBuffer::new(8).unwrap();
        assert_eq!(buf.num_states(), 8);
        assert_eq!(buf.read_slot(), Slot::Zero);
        assert_eq!(buf.write_slot(), Slot::One);
        assert_eq!(buf.read_errors(), &[0; 8]);
        assert_eq!(buf.write_errors(), &[0; 8]);
        assert_ne!(buf.read_errors().as_ptr(), buf.write_errors().as_ptr());
    }

    #[test]
    fn test_swap_promotes_write_array() {
        let mut buf = ErrorBuffer::new(4).unwrap();
        buf.write_errors_mut().copy_from_slice(&[1, 2, 3, 4]);
        let written = buf.write_errors().as_ptr();

        buf.swap();
        assert_eq!(buf.read_errors().as_ptr(), written);
        assert_eq!(buf.read_errors(), &[1, 2, 3, 4]);
        assert_eq!(buf.write_errors(), &[0; 4]);
    }

    #[test]
    fn test_double_swap_restores_roles() {
        let mut buf = ErrorBuffer::new(4).unwrap();
        let read = buf.read_errors().as_ptr();
        let write = buf.write_errors().as_ptr();

        buf.swap();
        buf.swap();
        assert_eq!(buf.read_errors().as_ptr(), read);
        assert_eq!(buf.write_errors().as_ptr(), write);
    }

    #[test]
    fn test_split_views_match_roles() {
        let mut buf = ErrorBuffer::new(3).unwrap();
        buf.swap();
        {
            let (read, write) = buf.split();
            assert_eq!(read.len(), 3);
            write.copy_from_slice(&[7, 8, 9]);
        }
        assert_eq!(buf.write_slot(), Slot::Zero);
        assert_eq!(buf.write_errors(), &[7, 8, 9]);
        buf.swap();
        assert_eq!(buf.read_errors(), &[7, 8, 9]);
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let mut buf = ErrorBuffer::new(4).unwrap();
        buf.write_errors_mut().fill(5);
        buf.swap();
        buf.write_errors_mut().fill(9);

        buf.reset();
        assert_eq!(buf.read_slot(), Slot::Zero);
        assert_eq!(buf.read_errors(), &[0; 4]);
        assert_eq!(buf.write_errors(), &[0; 4]);
    }
}
