//! Survivor history and windowed traceback.
//!
//! For every decode step the decoder records, per register state, which of
//! the two predecessors survived: 1 if the bit shifted out of the top of the
//! register was set. Walking these decisions backwards from a state recovers
//! the input bit of every step (the low bit of each visited state).
//!
//! Memory is bounded: once `min_traceback_length + traceback_group_length`
//! steps are stored, the decoder traces back from its current best state,
//! trusts nothing in the newest `min_traceback_length` steps, and emits the
//! older `traceback_group_length` bits.

use crate::bitio::BitWriter;
use crate::error::{CodeError, Result};
use crate::error_buffer::Distance;
use crate::table::ShiftRegister;

/// Ring of per-step survivor decisions.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    min_traceback_length: usize,
    cap: usize,
    num_states: usize,
    highbit: ShiftRegister,
    /// `cap` slices of `num_states` decisions
    history: Vec<u8>,
    /// Bits recovered by one traceback, newest first
    fetched: Vec<u8>,
    /// Slice the next step writes
    head: usize,
    /// Stored steps
    len: usize,
    renormalize_interval: usize,
    renormalize_counter: usize,
    renormalized: u64,
    tracebacks: u64,
}

impl HistoryBuffer {
    /// Allocate room for `min_traceback_length + traceback_group_length` steps.
    pub fn new(
        min_traceback_length: usize,
        traceback_group_length: usize,
        renormalize_interval: usize,
        num_states: usize,
        highbit: ShiftRegister,
    ) -> Result<Self> {
        let cap = min_traceback_length + traceback_group_length;
        Ok(Self {
            min_traceback_length,
            cap,
            num_states,
            highbit,
            history: zeroed(cap * num_states)?,
            fetched: zeroed(cap)?,
            head: 0,
            len: 0,
            renormalize_interval,
            renormalize_counter: 0,
            renormalized: 0,
            tracebacks: 0,
        })
    }

    /// Forget all stored steps.
    pub fn reset(&mut self) {
        self.head = 0;
        self.len = 0;
        self.renormalize_counter = 0;
        self.renormalized = 0;
    }

    /// Number of steps currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of stored steps before a traceback is forced.
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Total subtracted from every path metric by renormalization since reset.
    pub fn renormalized_total(&self) -> u64 {
        self.renormalized
    }

    /// Number of tracebacks performed over the buffer's lifetime.
    pub fn tracebacks(&self) -> u64 {
        self.tracebacks
    }

    /// Decision slice for the step being decoded.
    pub fn slice_mut(&mut self) -> &mut [u8] {
        let start = self.head * self.num_states;
        &mut self.history[start..start + self.num_states]
    }

    /// Commit the current slice.
    ///
    /// `errors` are the metrics just written for this step. They are
    /// renormalized in place when the interval comes due, and a traceback
    /// into `output` runs when the ring is full.
    pub fn process(&mut self, errors: &mut [Distance], output: &mut BitWriter<'_>) -> Result<()> {
        self.head += 1;
        if self.head == self.cap {
            self.head = 0;
        }
        self.len += 1;
        self.renormalize_counter += 1;

        let renormalize = self.renormalize_counter == self.renormalize_interval;
        let traceback = self.len == self.cap;
        if !(renormalize || traceback) {
            return Ok(());
        }

        let (best, min) = best_path(errors);
        if renormalize {
            for e in errors.iter_mut() {
                *e -= min;
            }
            self.renormalized += u64::from(min);
            self.renormalize_counter = 0;
        }
        if traceback {
            self.traceback(best, self.min_traceback_length, output)?;
        }
        Ok(())
    }

    /// Emit everything still stored, tracing back from `final_state` and
    /// leaving out the newest `skip` steps.
    pub fn flush(
        &mut self,
        final_state: ShiftRegister,
        skip: usize,
        output: &mut BitWriter<'_>,
    ) -> Result<()> {
        self.traceback(final_state, skip, output)
    }

    fn traceback(
        &mut self,
        mut state: ShiftRegister,
        skip: usize,
        output: &mut BitWriter<'_>,
    ) -> Result<()> {
        let mut index = self.head;
        let mut fetched = 0;

        for step in 0..self.len {
            index = if index == 0 { self.cap - 1 } else { index - 1 };
            if step >= skip {
                self.fetched[fetched] = (state & 1) as u8;
                fetched += 1;
            }
            let decision = self.history[index * self.num_states + state as usize];
            state = (state >> 1) | if decision != 0 { self.highbit } else { 0 };
        }

        output.write_bitlist_reversed(&self.fetched[..fetched])?;
        self.len -= fetched;
        self.tracebacks += 1;
        Ok(())
    }
}

/// State with the smallest metric, and that metric. Ties go to the lowest state.
pub fn best_path(errors: &[Distance]) -> (ShiftRegister, Distance) {
    errors
        .iter()
        .enumerate()
        .fold((0, Distance::MAX), |(best, min), (state, &e)| {
            if e < min {
                (state as ShiftRegister, e)
            } else {
                (best, min)
            }
        })
}

fn zeroed(len: usize) -> Result<Vec<u8>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| CodeError::Allocation { what: "history buffer" })?;
    v.resize(len, 0);
    Ok(v)
}
