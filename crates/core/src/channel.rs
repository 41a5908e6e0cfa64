//! Binary symmetric channel simulator.
//!
//! Flips each transmitted bit independently with a fixed probability. All
//! randomness comes from a seeded ChaCha8 RNG, so a given seed and input
//! always produce the same corrupted output.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration for channel simulation.
#[derive(Debug, Clone, Copy)]
pub struct ChannelConfig {
    /// Probability that a single bit is flipped [0.0, 1.0]
    pub bit_error_rate: f64,

    /// Random seed for determinism
    pub seed: u64,
}

impl ChannelConfig {
    /// A channel that never corrupts anything.
    pub fn perfect(seed: u64) -> Self {
        Self {
            bit_error_rate: 0.0,
            seed,
        }
    }

    /// A channel with a moderate error rate, well within what a rate 1/2,
    /// order 7 code corrects.
    pub fn default_with_seed(seed: u64) -> Self {
        Self {
            bit_error_rate: 0.01,
            seed,
        }
    }
}

/// Binary symmetric channel.
///
/// # Thread Safety
/// Not thread-safe; use one instance per thread or synchronize externally.
pub struct BinarySymmetricChannel {
    config: ChannelConfig,
    rng: ChaCha8Rng,

    // Statistics
    bits_sent: u64,
    bits_flipped: u64,
}

impl BinarySymmetricChannel {
    /// Create a new channel with the given configuration.
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            bits_sent: 0,
            bits_flipped: 0,
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Pass the first `num_bits` bits of `data` through the channel in place.
    ///
    /// Bits are numbered MSB-first. Returns how many were flipped.
    pub fn transmit(&mut self, data: &mut [u8], num_bits: usize) -> usize {
        let num_bits = num_bits.min(data.len() * 8);
        self.bits_sent += num_bits as u64;

        if self.config.bit_error_rate <= 0.0 {
            return 0;
        }

        let mut flipped = 0;
        for bit in 0..num_bits {
            let roll: f64 = self.rng.gen();
            if roll < self.config.bit_error_rate {
                data[bit / 8] ^= 0x80 >> (bit % 8);
                flipped += 1;
            }
        }

        self.bits_flipped += flipped as u64;
        flipped
    }

    /// Get channel statistics: (bits_sent, bits_flipped).
    pub fn stats(&self) -> (u64, u64) {
        (self.bits_sent, self.bits_flipped)
    }
}
