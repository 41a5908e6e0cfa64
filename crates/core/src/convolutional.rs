//! Convolutional code engine: trellis table, encoder and hard-decision
//! Viterbi decoder.
//!
//! # Lifecycle
//! A `ConvolutionalCode` starts in `DecodePhase::EncodeOnly` and only holds
//! its trellis table. The first `decode` (or an explicit `init_decode`)
//! allocates the decode resources: the double-buffered path metrics, the
//! survivor history, the pair lookup and a distance scratch array. That
//! phase is never left; dropping the code releases whatever the current
//! phase owns, so decode resources that were never created are never freed.
//!
//! # Stream format
//! For each input bit the register shifts left, takes the bit at position 0,
//! and the `rate` bits of `table[register]` are written low bit first. Every
//! message byte is fed most significant bit first, and `order + 1` zero
//! bits follow the message so the register ends at state 0.
//!
//! # Example
//! ```
//! use convcode_core::convolutional::ConvolutionalCode;
//! use convcode_core::table::R12_K7;
//!
//! let mut code = ConvolutionalCode::new(2, 7, &R12_K7).unwrap();
//! let msg = b"hello";
//!
//! let mut encoded = vec![0u8; code.encode_len(msg.len()).div_ceil(8)];
//! let bits = code.encode(msg, &mut encoded).unwrap();
//! encoded[3] ^= 0b0001_0000; // one channel error
//!
//! let mut decoded = [0u8; 5];
//! let n = code.decode(&encoded, bits, &mut decoded).unwrap();
//! assert_eq!(&decoded[..n], msg);
//! ```

use crate::bitio::{BitReader, BitWriter};
use crate::error::{CodeError, Result};
use crate::error_buffer::{Distance, ErrorBuffer};
use crate::history::HistoryBuffer;
use crate::pair_lookup::PairLookup;
use crate::table::{fill_table, Polynomial, ShiftRegister};
use tracing::{debug, trace};

/// Smallest supported number of output bits per input bit.
pub const MIN_RATE: usize = 2;

/// Largest supported rate; one symbol must fit a single bit field read.
pub const MAX_RATE: usize = 8;

/// Largest supported order; `2^order` states must fit a `ShiftRegister`.
pub const MAX_ORDER: usize = ShiftRegister::BITS as usize - 1;

/// Resources that only exist once decoding has been requested.
#[derive(Debug)]
pub struct DecodeResources {
    errors: ErrorBuffer,
    history: HistoryBuffer,
    pair_lookup: PairLookup,
    /// Distance from the received symbol to every possible output
    distances: Vec<Distance>,
}

impl DecodeResources {
    fn new(rate: usize, order: usize, table: &[u32]) -> Result<Self> {
        let num_states = table.len();
        let mut distances = Vec::new();
        distances
            .try_reserve_exact(1 << rate)
            .map_err(|_| CodeError::Allocation { what: "distance table" })?;
        distances.resize(1 << rate, 0);

        Ok(Self {
            errors: ErrorBuffer::new(num_states)?,
            history: HistoryBuffer::new(
                5 * order,
                15 * order,
                (Distance::MAX / 2) as usize / rate,
                num_states,
                1 << (order - 1),
            )?,
            pair_lookup: PairLookup::new(rate, table)?,
            distances,
        })
    }

    pub fn error_buffer(&self) -> &ErrorBuffer {
        &self.errors
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn pair_lookup(&self) -> &PairLookup {
        &self.pair_lookup
    }

    pub fn distances(&self) -> &[Distance] {
        &self.distances
    }

    /// Run the trellis over `sets` received symbols and write the decoded
    /// bits. Returns the error count of the surviving path.
    fn run(
        &mut self,
        table: &[u32],
        rate: usize,
        order: usize,
        sets: usize,
        reader: &mut BitReader<'_>,
        writer: &mut BitWriter<'_>,
    ) -> Result<u64> {
        self.errors.reset();
        self.history.reset();

        // Starting from state 0, step t can only reach states below 2^(t+1),
        // each through the predecessor with a clear top bit
        let warmup = order.min(sets);
        for step in 0..warmup {
            let out = reader.read(rate)?;
            let reachable = 1usize << (step + 1);

            let (read, write) = self.errors.split();
            let decisions = self.history.slice_mut();
            decisions.fill(0);
            for (state, metric) in write[..reachable].iter_mut().enumerate() {
                *metric = read[state >> 1].saturating_add(metric_distance(table[state], out));
            }

            self.history.process(&mut write[..reachable], writer)?;
            self.errors.swap();
        }

        let highbit = 1usize << (order - 1);
        for _ in warmup..sets {
            let out = reader.read(rate)?;
            for (symbol, d) in self.distances.iter_mut().enumerate() {
                *d = metric_distance(symbol as u32, out);
            }
            self.pair_lookup.fill_distances(&self.distances);

            let (read, write) = self.errors.split();
            let decisions = self.history.slice_mut();

            // States 2i and 2i+1 share predecessors i and i | highbit
            for pair in 0..highbit {
                let low = read[pair];
                let high = read[pair | highbit];
                let (survivor, decision) = if high < low { (high, 1) } else { (low, 0) };
                let (d0, d1) = self.pair_lookup.pair_distances(pair);

                write[2 * pair] = survivor.saturating_add(d0);
                write[2 * pair + 1] = survivor.saturating_add(d1);
                decisions[2 * pair] = decision;
                decisions[2 * pair + 1] = decision;
            }

            self.history.process(write, writer)?;
            self.errors.swap();
        }

        // The zero tail leaves the encoder at state 0
        let path_error = self.errors.read_errors()[0];
        self.history.flush(0, order + 1, writer)?;
        Ok(u64::from(path_error) + self.history.renormalized_total())
    }
}

/// Whether decode resources have been allocated.
#[derive(Debug, Default)]
pub enum DecodePhase {
    #[default]
    EncodeOnly,
    EncodeAndDecode(Box<DecodeResources>),
}

/// A convolutional code with `rate` outputs per input bit over an
/// `order`-bit shift register.
#[derive(Debug)]
pub struct ConvolutionalCode {
    rate: usize,
    order: usize,
    num_states: usize,
    table: Vec<u32>,
    phase: DecodePhase,
    last_path_error: u64,
}

impl ConvolutionalCode {
    /// Build a code from generator polynomials.
    ///
    /// # Errors
    /// - `CodeError::InvalidOrder` unless `1 <= order <= MAX_ORDER`
    /// - `CodeError::InvalidRate` unless `MIN_RATE <= rate <= MAX_RATE`
    /// - any error of `fill_table`
    pub fn new(rate: usize, order: usize, polynomials: &[Polynomial]) -> Result<Self> {
        validate(rate, order)?;
        let table = fill_table(rate, order, polynomials)?;
        Ok(Self::from_parts(rate, order, table))
    }

    /// Build a code from a precomputed trellis table.
    pub fn with_table(rate: usize, order: usize, table: Vec<u32>) -> Result<Self> {
        validate(rate, order)?;
        let expected = 1usize << order;
        if table.len() != expected {
            return Err(CodeError::TableSize {
                expected,
                actual: table.len(),
            }
            .into());
        }
        if let Some((index, &value)) = table.iter().enumerate().find(|&(_, &v)| v >> rate != 0) {
            return Err(CodeError::TableEntry { index, value, rate }.into());
        }
        Ok(Self::from_parts(rate, order, table))
    }

    fn from_parts(rate: usize, order: usize, table: Vec<u32>) -> Self {
        Self {
            rate,
            order,
            num_states: table.len(),
            table,
            phase: DecodePhase::EncodeOnly,
            last_path_error: 0,
        }
    }

    pub fn rate(&self) -> usize {
        self.rate
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Trellis output row for every register state.
    pub fn table(&self) -> &[u32] {
        &self.table
    }

    pub fn phase(&self) -> &DecodePhase {
        &self.phase
    }

    pub fn is_decode_initialized(&self) -> bool {
        matches!(self.phase, DecodePhase::EncodeAndDecode(_))
    }

    /// Decode resources, if decoding has been initialized.
    pub fn decode_resources(&self) -> Option<&DecodeResources> {
        match &self.phase {
            DecodePhase::EncodeOnly => None,
            DecodePhase::EncodeAndDecode(resources) => Some(resources),
        }
    }

    /// Errors corrected on the surviving path of the last decode.
    pub fn last_path_error(&self) -> u64 {
        self.last_path_error
    }

    /// Number of encoded bits produced for a `msg_len`-byte message.
    pub fn encode_len(&self, msg_len: usize) -> usize {
        self.rate * (8 * msg_len + self.order + 1)
    }

    /// Encode bit-bytes from register state 0 without a tail.
    ///
    /// Returns the final register state. Nothing is flushed.
    pub fn encode_bits(&self, bits: &[u8], writer: &mut BitWriter<'_>) -> Result<ShiftRegister> {
        bits.iter()
            .try_fold(0, |register, &bit| self.step(register, bit, writer))
    }

    /// Encode `msg` into `encoded`, returning the number of encoded bits.
    ///
    /// # Errors
    /// `CodeError::OutputTooSmall` if `encoded` is shorter than
    /// `encode_len(msg.len())` bits, rounded up to bytes.
    pub fn encode(&self, msg: &[u8], encoded: &mut [u8]) -> Result<usize> {
        let bits = self.encode_len(msg.len());
        let required = bits.div_ceil(8);
        if encoded.len() < required {
            return Err(CodeError::OutputTooSmall {
                required,
                actual: encoded.len(),
            }
            .into());
        }

        let mut writer = BitWriter::new(&mut encoded[..required]);
        let mut register = 0;
        for &byte in msg {
            for j in (0..8).rev() {
                register = self.step(register, byte >> j, &mut writer)?;
            }
        }
        for _ in 0..=self.order {
            register = self.step(register, 0, &mut writer)?;
        }
        writer.flush_byte();

        trace!(msg_len = msg.len(), bits, "encoded message");
        Ok(bits)
    }

    #[inline]
    fn step(
        &self,
        register: ShiftRegister,
        bit: u8,
        writer: &mut BitWriter<'_>,
    ) -> Result<ShiftRegister> {
        let mask = (self.num_states - 1) as ShiftRegister;
        let register = ((register << 1) | ShiftRegister::from(bit & 1)) & mask;
        writer.write(self.table[register as usize] as u8, self.rate)?;
        Ok(register)
    }

    /// Allocate decode resources if they do not exist yet.
    pub fn init_decode(&mut self) -> Result<()> {
        if let DecodePhase::EncodeOnly = self.phase {
            self.phase = DecodePhase::EncodeAndDecode(self.create_decode_resources()?);
        }
        Ok(())
    }

    fn create_decode_resources(&self) -> Result<Box<DecodeResources>> {
        let resources = DecodeResources::new(self.rate, self.order, &self.table)?;
        debug!(
            rate = self.rate,
            order = self.order,
            num_states = self.num_states,
            history = resources.history.capacity(),
            unique_pairs = resources.pair_lookup.unique_pairs(),
            "decode resources initialized"
        );
        Ok(Box::new(resources))
    }

    /// Decode `num_encoded_bits` bits of `encoded` into `msg`.
    ///
    /// Returns the number of message bytes written.
    ///
    /// # Errors
    /// - `CodeError::UnalignedInput` if the bit count is not a multiple of `rate`
    /// - `CodeError::InputTooShort` if `encoded` holds fewer bits, or the
    ///   stream is shorter than the `order + 1` symbol tail
    /// - `CodeError::OutputTooSmall` if `msg` cannot hold the message
    pub fn decode(
        &mut self,
        encoded: &[u8],
        num_encoded_bits: usize,
        msg: &mut [u8],
    ) -> Result<usize> {
        if num_encoded_bits % self.rate != 0 {
            return Err(CodeError::UnalignedInput {
                bits: num_encoded_bits,
                rate: self.rate,
            }
            .into());
        }
        if encoded.len() * 8 < num_encoded_bits {
            return Err(CodeError::InputTooShort {
                required: num_encoded_bits,
                actual: encoded.len() * 8,
            }
            .into());
        }

        let sets = num_encoded_bits / self.rate;
        let tail = self.order + 1;
        if sets < tail {
            return Err(CodeError::InputTooShort {
                required: tail * self.rate,
                actual: num_encoded_bits,
            }
            .into());
        }

        let required = (sets - tail).div_ceil(8);
        if msg.len() < required {
            return Err(CodeError::OutputTooSmall {
                required,
                actual: msg.len(),
            }
            .into());
        }

        // Resources are moved out for the run and always put back
        let mut resources = match std::mem::take(&mut self.phase) {
            DecodePhase::EncodeAndDecode(resources) => resources,
            DecodePhase::EncodeOnly => self.create_decode_resources()?,
        };

        let mut reader = BitReader::new(&encoded[..num_encoded_bits.div_ceil(8)]);
        let mut writer = BitWriter::new(&mut msg[..required]);
        let result = resources.run(
            &self.table,
            self.rate,
            self.order,
            sets,
            &mut reader,
            &mut writer,
        );
        self.phase = DecodePhase::EncodeAndDecode(resources);

        self.last_path_error = result?;
        writer.flush_byte();

        trace!(
            sets,
            bytes = writer.length(),
            path_error = self.last_path_error,
            "decoded message"
        );
        Ok(writer.length())
    }
}

fn validate(rate: usize, order: usize) -> Result<()> {
    if order == 0 || order > MAX_ORDER {
        return Err(CodeError::InvalidOrder {
            order,
            max: MAX_ORDER,
        }
        .into());
    }
    if !(MIN_RATE..=MAX_RATE).contains(&rate) {
        return Err(CodeError::InvalidRate {
            rate,
            min: MIN_RATE,
            max: MAX_RATE,
        }
        .into());
    }
    Ok(())
}

/// Hamming distance between an expected output and a received symbol.
#[inline]
pub fn metric_distance(expected: u32, received: u8) -> Distance {
    (expected ^ u32::from(received)).count_ones() as Distance
}
