//! Bit-level I/O over caller-owned byte buffers.
//!
//! `BitWriter` packs bits MSB-first into a borrowed `&mut [u8]`, keeping a
//! partially filled trailing byte until it is completed or flushed.
//! `BitReader` pulls 1 to 8 bit fields back out MSB-first and hands each one
//! back bit-reversed within its own width. Trellis table rows are written
//! low bit first, so the reversal turns a field read from the stream back
//! into the row value it was written from.
//!
//! # Capacity
//! Every write is all-or-nothing: if the bits (plus whatever is pending in
//! the partial byte) do not fit in the rest of the buffer, the call returns
//! `BitIoError::CapacityExceeded` and the writer is left exactly as it was.
//! Reads past the end return `BitIoError::InsufficientBits`, again without
//! consuming anything.
//!
//! # Example
//! ```
//! use convcode_core::bitio::{BitReader, BitWriter};
//!
//! let mut buf = [0u8; 2];
//! let mut writer = BitWriter::new(&mut buf);
//! writer.write(0b011, 3).unwrap(); // low bit first: 1, 1, 0
//! writer.write_bitlist(&[1, 0, 1, 0, 1]).unwrap();
//! writer.flush_byte();
//! assert_eq!(writer.length(), 1);
//! assert_eq!(buf, [0b1101_0101, 0]);
//!
//! let mut reader = BitReader::new(&buf);
//! assert_eq!(reader.read(3).unwrap(), 0b011);
//! ```

use crate::error::{BitIoError, Result};

/// Reverse the bit order of a single byte.
pub const fn reverse_byte(b: u8) -> u8 {
    b.reverse_bits()
}

/// Build the 256-entry byte reversal table.
///
/// Pure; calling it again always yields the same table.
pub const fn build_reverse_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = reverse_byte(i as u8);
        i += 1;
    }
    table
}

/// Byte value -> bit-reversed byte value, computed at compile time.
pub static REVERSE_TABLE: [u8; 256] = build_reverse_table();

/// Writes bits MSB-first into a borrowed byte buffer.
///
/// # Invariants
/// - `byte_index <= buffer.len()`
/// - `current_byte_len < 8`
/// - pending bits always have a byte reserved for them:
///   `byte_index + (current_byte_len > 0) as usize <= buffer.len()`
#[derive(Debug)]
pub struct BitWriter<'a> {
    /// Destination bytes
    buffer: &'a mut [u8],
    /// Next unwritten byte
    byte_index: usize,
    /// Pending bits, first written bit most significant
    current_byte: u8,
    /// Number of pending bits (0-7)
    current_byte_len: u8,
}

impl<'a> BitWriter<'a> {
    /// Create a writer bound to `buffer`.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            byte_index: 0,
            current_byte: 0,
            current_byte_len: 0,
        }
    }

    /// Create an unbound writer. Every write fails until `reconfigure`.
    pub fn empty() -> Self {
        Self::new(Default::default())
    }

    /// Rebind to a new buffer and reset all counters.
    pub fn reconfigure(&mut self, buffer: &'a mut [u8]) {
        self.buffer = buffer;
        self.byte_index = 0;
        self.current_byte = 0;
        self.current_byte_len = 0;
    }

    /// Whether the writer has a non-empty destination.
    pub fn is_bound(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Write a single bit (only the low bit of `bit` is used).
    pub fn write_1(&mut self, bit: u8) -> Result<()> {
        self.ensure_capacity(1)?;
        self.accumulate(std::iter::once(bit));
        Ok(())
    }

    /// Write the low `n` bits of `val`, lowest bit first.
    ///
    /// # Errors
    /// - `BitIoError::InvalidBitCount` if `n > 8`
    /// - `BitIoError::CapacityExceeded` if the bits do not fit
    pub fn write(&mut self, val: u8, n: usize) -> Result<()> {
        if n > 8 {
            return Err(BitIoError::InvalidBitCount(n).into());
        }
        self.ensure_capacity(n)?;
        self.accumulate((0..n).map(|j| val >> j));
        Ok(())
    }

    /// Write a list of bit-bytes (one bit per element) in slice order.
    ///
    /// Complete groups of eight are packed straight into output bytes.
    pub fn write_bitlist(&mut self, bits: &[u8]) -> Result<()> {
        self.ensure_capacity(bits.len())?;

        let close_len = self.close_len(bits.len());
        let (head, rest) = bits.split_at(close_len);
        if !self.close_byte(head.iter().copied()) {
            return Ok(());
        }

        let mut groups = rest.chunks_exact(8);
        for group in &mut groups {
            self.emit(pack_forward(group));
        }
        self.accumulate(groups.remainder().iter().copied());
        Ok(())
    }

    /// Write a list of bit-bytes starting from its last element.
    ///
    /// Produces the same bytes as `write_bitlist` on the reversed list.
    pub fn write_bitlist_reversed(&mut self, bits: &[u8]) -> Result<()> {
        self.ensure_capacity(bits.len())?;

        let close_len = self.close_len(bits.len());
        let (rest, head) = bits.split_at(bits.len() - close_len);
        if !self.close_byte(head.iter().rev().copied()) {
            return Ok(());
        }

        let mut groups = rest.rchunks_exact(8);
        for group in &mut groups {
            self.emit(pack_reversed(group));
        }
        self.accumulate(groups.remainder().iter().rev().copied());
        Ok(())
    }

    /// Emit a pending partial byte, padded with trailing zeros.
    pub fn flush_byte(&mut self) {
        if self.current_byte_len != 0 {
            let byte = self.current_byte << (8 - self.current_byte_len);
            self.emit(byte);
            self.current_byte = 0;
            self.current_byte_len = 0;
        }
    }

    /// Number of complete bytes emitted so far.
    ///
    /// Pending bits are not counted; call `flush_byte` first.
    pub fn length(&self) -> usize {
        self.byte_index
    }

    /// Number of bits waiting in the partial byte.
    pub fn pending_bits(&self) -> usize {
        self.current_byte_len as usize
    }

    /// Number of bits that can still be written.
    pub fn remaining_bits(&self) -> usize {
        (self.buffer.len() - self.byte_index) * 8 - self.current_byte_len as usize
    }

    fn ensure_capacity(&self, bits: usize) -> Result<()> {
        let needed = (bits + self.current_byte_len as usize).div_ceil(8);
        let available = self.buffer.len() - self.byte_index;
        if needed > available {
            return Err(BitIoError::CapacityExceeded { needed, available }.into());
        }
        Ok(())
    }

    fn close_len(&self, len: usize) -> usize {
        (8 - self.current_byte_len as usize).min(len)
    }

    /// Feed bits into the partial byte; true if that completed a byte.
    fn close_byte(&mut self, bits: impl Iterator<Item = u8>) -> bool {
        let before = self.byte_index;
        self.accumulate(bits);
        self.byte_index > before
    }

    fn accumulate(&mut self, bits: impl Iterator<Item = u8>) {
        for bit in bits {
            self.current_byte = (self.current_byte << 1) | (bit & 1);
            self.current_byte_len += 1;
            if self.current_byte_len == 8 {
                self.emit(self.current_byte);
                self.current_byte = 0;
                self.current_byte_len = 0;
            }
        }
    }

    fn emit(&mut self, byte: u8) {
        self.buffer[self.byte_index] = byte;
        self.byte_index += 1;
    }
}

impl Default for BitWriter<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

#[inline]
fn pack_forward(g: &[u8]) -> u8 {
    ((g[0] & 1) << 7)
        | ((g[1] & 1) << 6)
        | ((g[2] & 1) << 5)
        | ((g[3] & 1) << 4)
        | ((g[4] & 1) << 3)
        | ((g[5] & 1) << 2)
        | ((g[6] & 1) << 1)
        | (g[7] & 1)
}

#[inline]
fn pack_reversed(g: &[u8]) -> u8 {
    ((g[7] & 1) << 7)
        | ((g[6] & 1) << 6)
        | ((g[5] & 1) << 5)
        | ((g[4] & 1) << 4)
        | ((g[3] & 1) << 3)
        | ((g[2] & 1) << 2)
        | ((g[1] & 1) << 1)
        | (g[0] & 1)
}

/// Reads bit fields MSB-first from a borrowed byte buffer.
///
/// Each field comes back reversed within its width, so a value written with
/// `BitWriter::write(v, n)` reads back as `v` with `read(n)`.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    /// Source data
    buffer: &'a [u8],
    /// Byte currently being consumed
    byte_index: usize,
    /// Copy of `buffer[byte_index]`
    current_byte: u8,
    /// Unread bits left in `current_byte` (0-8)
    current_byte_len: u8,
}

impl<'a> BitReader<'a> {
    /// Create a reader over `buffer`, loading its first byte.
    pub fn new(buffer: &'a [u8]) -> Self {
        let mut reader = Self {
            buffer: &[],
            byte_index: 0,
            current_byte: 0,
            current_byte_len: 0,
        };
        reader.reconfigure(buffer);
        reader
    }

    /// Rebind to a new buffer and rewind.
    pub fn reconfigure(&mut self, buffer: &'a [u8]) {
        self.buffer = buffer;
        self.byte_index = 0;
        match buffer.first() {
            Some(&first) => {
                self.current_byte = first;
                self.current_byte_len = 8;
            }
            None => {
                self.current_byte = 0;
                self.current_byte_len = 0;
            }
        }
    }

    /// Read the next `n` bits and return them reversed within `n` bits.
    ///
    /// # Errors
    /// - `BitIoError::InvalidBitCount` unless `1 <= n <= 8`
    /// - `BitIoError::InsufficientBits` if fewer than `n` bits remain
    pub fn read(&mut self, n: usize) -> Result<u8> {
        if n == 0 || n > 8 {
            return Err(BitIoError::InvalidBitCount(n).into());
        }
        let available = self.bits_remaining();
        if n > available {
            return Err(BitIoError::InsufficientBits {
                requested: n,
                available,
            }
            .into());
        }

        let mut read: u32 = 0;
        let mut left = n as u32;
        let mut byte_len = self.current_byte_len as u32;

        // Field straddles two bytes: take the tail of this one, then refill
        if byte_len < left {
            read = u32::from(self.current_byte) & ((1 << byte_len) - 1);
            self.byte_index += 1;
            self.current_byte = self.buffer[self.byte_index];
            left -= byte_len;
            byte_len = 8;
            read <<= left;
        }

        let mask = ((1u32 << left) - 1) << (byte_len - left);
        read |= (u32::from(self.current_byte) & mask) >> (byte_len - left);
        self.current_byte_len = (byte_len - left) as u8;

        Ok(REVERSE_TABLE[read as usize] >> (8 - n))
    }

    /// Return the number of bits left to read.
    pub fn bits_remaining(&self) -> usize {
        if self.buffer.is_empty() {
            return 0;
        }
        self.current_byte_len as usize + (self.buffer.len() - self.byte_index - 1) * 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_write_1_msb_first() {
        let mut buf = [0u8; 1];
        let mut writer = BitWriter::new(&mut buf);
        for &bit in &[1u8, 0, 1, 1, 0, 0, 1, 0] {
            writer.write_1(bit).unwrap();
        }
        assert_eq!(writer.length(), 1);
        assert_eq!(buf, [0b1011_0010]);
    }

    #[test]
    fn test_write_low_bits_ascending() {
        let mut buf = [0u8; 1];
        let mut writer = BitWriter::new(&mut buf);
        // 0b0110 low bit first -> 0, 1, 1, 0
        writer.write(0b0110, 4).unwrap();
        writer.write(0b1111, 4).unwrap();
        assert_eq!(buf, [0b0110_1111]);
    }

    #[test]
    fn test_flush_pads_with_zeros() {
        let mut buf = [0u8; 2];
        let mut writer = BitWriter::new(&mut buf);
        writer.write_1(1).unwrap();
        assert_eq!(writer.length(), 0);
        assert_eq!(writer.pending_bits(), 1);

        writer.flush_byte();
        assert_eq!(writer.length(), 1);
        assert_eq!(writer.pending_bits(), 0);

        // Nothing pending: flush is a no-op
        writer.flush_byte();
        assert_eq!(writer.length(), 1);
        assert_eq!(buf, [0b1000_0000, 0]);
    }

    #[test]
    fn test_bitlist_closes_pending_byte() {
        let mut buf = [0u8; 3];
        let mut writer = BitWriter::new(&mut buf);
        writer.write_bitlist(&[1, 1, 1]).unwrap();
        assert_eq!(writer.length(), 0);
        assert_eq!(writer.pending_bits(), 3);

        writer
            .write_bitlist(&[0, 0, 0, 0, 1, 1, 0, 1, 0, 1, 0, 1, 0])
            .unwrap();
        writer.flush_byte();
        assert_eq!(writer.length(), 2);
        assert_eq!(buf, [0b1110_0001, 0b1010_1010, 0]);
    }

    #[test]
    fn test_bitlist_matches_single_bits_at_every_alignment() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for align in 0..8 {
            for n in 0..=100 {
                let prefix: Vec<u8> = (0..align).map(|_| rng.gen_range(0..=1)).collect();
                let bits: Vec<u8> = (0..n).map(|_| rng.gen_range(0..=1)).collect();

                let mut single = [0u8; 16];
                let mut bulk = [0u8; 16];

                let mut w1 = BitWriter::new(&mut single);
                let mut w2 = BitWriter::new(&mut bulk);
                for &b in &prefix {
                    w1.write_1(b).unwrap();
                    w2.write_1(b).unwrap();
                }
                for &b in &bits {
                    w1.write_1(b).unwrap();
                }
                w2.write_bitlist(&bits).unwrap();

                assert_eq!(w1.pending_bits(), w2.pending_bits(), "align {align}, n {n}");
                w1.flush_byte();
                w2.flush_byte();
                assert_eq!(w1.length(), w2.length(), "align {align}, n {n}");
                assert_eq!(single, bulk, "align {align}, n {n}");
            }
        }
    }

    #[test]
    fn test_reversed_bitlist_law() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for align in 0..8 {
            for n in 0..=40 {
                let prefix: Vec<u8> = (0..align).map(|_| rng.gen_range(0..=1)).collect();
                let bits: Vec<u8> = (0..n).map(|_| rng.gen_range(0..=1)).collect();
                let reversed: Vec<u8> = bits.iter().rev().copied().collect();

                let mut a = [0u8; 8];
                let mut b = [0u8; 8];
                let mut wa = BitWriter::new(&mut a);
                let mut wb = BitWriter::new(&mut b);
                wa.write_bitlist(&prefix).unwrap();
                wb.write_bitlist(&prefix).unwrap();

                wa.write_bitlist_reversed(&bits).unwrap();
                wb.write_bitlist(&reversed).unwrap();
                wa.flush_byte();
                wb.flush_byte();

                assert_eq!(wa.length(), wb.length());
                assert_eq!(a, b, "align {align}, n {n}");
            }
        }
    }

    #[test]
    fn test_capacity_violation_leaves_state_unchanged() {
        let mut buf = [0u8; 2];
        let mut writer = BitWriter::new(&mut buf);
        writer.write_bitlist(&[1, 0, 1, 1, 0, 1, 1, 1, 0, 1]).unwrap();
        assert_eq!(writer.length(), 1);
        assert_eq!(writer.pending_bits(), 2);
        assert_eq!(writer.remaining_bits(), 6);

        // 2 pending + 7 new = 9 bits -> 2 bytes, only 1 left
        let err = writer.write_bitlist(&[1; 7]).unwrap_err();
        assert!(matches!(
            err,
            Error::BitIo(BitIoError::CapacityExceeded {
                needed: 2,
                available: 1
            })
        ));
        assert!(writer.write_bitlist_reversed(&[1; 7]).is_err());
        assert!(writer.write(0xFF, 7).is_err());
        assert_eq!(writer.length(), 1);
        assert_eq!(writer.pending_bits(), 2);

        // Exactly filling the last byte still works
        writer.write_bitlist(&[0, 0, 0, 0, 0, 1]).unwrap();
        assert_eq!(writer.length(), 2);
        assert!(writer.write_1(1).is_err());
        assert_eq!(buf, [0b1011_0111, 0b0100_0001]);
    }

    #[test]
    fn test_unbound_writer_rejects_writes() {
        let mut buf = [0u8; 1];
        let mut writer = BitWriter::empty();
        assert!(!writer.is_bound());
        assert!(writer.write_1(1).is_err());
        // An empty list needs no bytes
        writer.write_bitlist(&[]).unwrap();

        writer.reconfigure(&mut buf);
        assert!(writer.is_bound());
        writer.write(0b1, 1).unwrap();
        writer.flush_byte();
        assert_eq!(writer.length(), 1);
        assert_eq!(buf, [0b1000_0000]);
    }

    #[test]
    fn test_write_rejects_wide_field() {
        let mut buf = [0u8; 4];
        let mut writer = BitWriter::new(&mut buf);
        assert!(matches!(
            writer.write(0, 9),
            Err(Error::BitIo(BitIoError::InvalidBitCount(9)))
        ));
    }

    #[test]
    fn test_reverse_table() {
        assert_eq!(REVERSE_TABLE[0b0000_0001], 0b1000_0000);
        assert_eq!(REVERSE_TABLE[0b1100_1010], 0b0101_0011);
        assert_eq!(build_reverse_table(), build_reverse_table());
        assert_eq!(build_reverse_table(), REVERSE_TABLE);
        for b in 0..=255u8 {
            assert_eq!(reverse_byte(reverse_byte(b)), b);
        }
    }

    #[test]
    fn test_read_reverses_within_width() {
        let data = [0b1100_0000];
        let mut reader = BitReader::new(&data);
        // Stream bits 1, 1, 0 -> 0b110 reversed -> 0b011
        assert_eq!(reader.read(3).unwrap(), 0b011);
        assert_eq!(reader.bits_remaining(), 5);
    }

    #[test]
    fn test_read_spans_bytes() {
        let data = [0b0000_0101, 0b1000_0000];
        let mut reader = BitReader::new(&data);
        reader.read(5).unwrap();
        // Stream bits 1, 0, 1, 1 -> 0b1011 reversed -> 0b1101
        assert_eq!(reader.read(4).unwrap(), 0b1101);
        assert_eq!(reader.bits_remaining(), 7);
    }

    #[test]
    fn test_read_past_end() {
        let data = [0xAB];
        let mut reader = BitReader::new(&data);
        reader.read(6).unwrap();
        assert!(matches!(
            reader.read(3),
            Err(Error::BitIo(BitIoError::InsufficientBits {
                requested: 3,
                available: 2
            }))
        ));
        // Nothing was consumed by the failed read
        assert_eq!(reader.bits_remaining(), 2);
        assert!(reader.read(2).is_ok());
        assert_eq!(reader.bits_remaining(), 0);
    }

    #[test]
    fn test_empty_reader() {
        let data = [0xF0];
        let mut reader = BitReader::new(&[]);
        assert_eq!(reader.bits_remaining(), 0);
        assert!(reader.read(1).is_err());
        assert!(matches!(
            reader.read(0),
            Err(Error::BitIo(BitIoError::InvalidBitCount(0)))
        ));

        reader.reconfigure(&data);
        assert_eq!(reader.read(4).unwrap(), 0b1111);
    }

    #[test]
    fn test_round_trip_random_partitions() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..200 {
            let fields: Vec<(u8, usize)> = (0..rng.gen_range(0..40))
                .map(|_| {
                    let width = rng.gen_range(1..=8);
                    let value = rng.gen::<u8>() & (((1u16 << width) - 1) as u8);
                    (value, width)
                })
                .collect();
            let total: usize = fields.iter().map(|&(_, w)| w).sum();

            let mut buf = vec![0u8; total.div_ceil(8)];
            let mut writer = BitWriter::new(&mut buf);
            for &(value, width) in &fields {
                writer.write(value, width).unwrap();
            }
            writer.flush_byte();
            let written = writer.length();
            assert_eq!(written, buf.len());

            let mut reader = BitReader::new(&buf);
            for &(value, width) in &fields {
                assert_eq!(reader.read(width).unwrap(), value);
            }
        }
    }
}
