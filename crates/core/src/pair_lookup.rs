//! Branch distance lookup for sibling trellis states.
//!
//! States `2i` and `2i + 1` share both predecessors, so the decoder handles
//! them together. Their two table rows form an output pair; codes have far
//! fewer distinct pairs than states, so the branch distances for a received
//! symbol are computed once per distinct pair and shared through `keys`.

use crate::convolutional::{MAX_RATE, MIN_RATE};
use crate::error::{CodeError, Result};
use crate::error_buffer::Distance;

const NO_KEY: u32 = u32::MAX;

/// Deduplicated output pairs with per-symbol packed distances.
#[derive(Debug, Clone)]
pub struct PairLookup {
    rate: usize,
    /// Pair index -> index into `outputs`
    keys: Vec<u32>,
    /// Distinct `table[2i] | table[2i + 1] << rate` values
    outputs: Vec<u32>,
    /// Per distinct pair: low 16 bits for `2i`, high 16 bits for `2i + 1`
    distances: Vec<u32>,
}

impl PairLookup {
    /// Index the output pairs of `table`.
    ///
    /// # Errors
    /// - `CodeError::InvalidRate` unless `MIN_RATE <= rate <= MAX_RATE`
    /// - `CodeError::TableEntry` if a row does not fit in `rate` bits
    /// - `CodeError::Allocation` if the lookup cannot be allocated
    pub fn new(rate: usize, table: &[u32]) -> Result<Self> {
        if !(MIN_RATE..=MAX_RATE).contains(&rate) {
            return Err(CodeError::InvalidRate {
                rate,
                min: MIN_RATE,
                max: MAX_RATE,
            }
            .into());
        }
        if let Some((index, &value)) = table.iter().enumerate().find(|&(_, &v)| v >> rate != 0) {
            return Err(CodeError::TableEntry { index, value, rate }.into());
        }
        let num_pairs = table.len() / 2;
        let mut inverse = try_vec(NO_KEY, 1 << (2 * rate))?;
        let mut keys = try_vec(0, num_pairs)?;
        let mut outputs = Vec::new();

        for (key, pair) in keys.iter_mut().zip(table.chunks_exact(2)) {
            let out = pair[0] | (pair[1] << rate);
            let slot = &mut inverse[out as usize];
            if *slot == NO_KEY {
                *slot = outputs.len() as u32;
                outputs.push(out);
            }
            *key = *slot;
        }

        let distances = try_vec(0, outputs.len())?;
        Ok(Self {
            rate,
            keys,
            outputs,
            distances,
        })
    }

    /// Number of distinct output pairs.
    pub fn unique_pairs(&self) -> usize {
        self.outputs.len()
    }

    /// Load branch distances for the current symbol.
    ///
    /// `distances[o]` is the distance between the received symbol and
    /// output `o`, for every `o < 2^rate`.
    pub fn fill_distances(&mut self, distances: &[Distance]) {
        let mask = (1u32 << self.rate) - 1;
        for (packed, &out) in self.distances.iter_mut().zip(&self.outputs) {
            let low = distances[(out & mask) as usize];
            let high = distances[(out >> self.rate) as usize];
            *packed = u32::from(low) | (u32::from(high) << 16);
        }
    }

    /// Branch distances into states `2 * pair` and `2 * pair + 1`.
    #[inline]
    pub fn pair_distances(&self, pair: usize) -> (Distance, Distance) {
        let packed = self.distances[self.keys[pair] as usize];
        ((packed & 0xFFFF) as Distance, (packed >> 16) as Distance)
    }
}

fn try_vec<T: Clone>(value: T, len: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| CodeError::Allocation { what: "pair lookup" })?;
    v.resize(len, value);
    Ok(v)
}
