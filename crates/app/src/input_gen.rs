//! Sample message generation.
//!
//! When no input file is given, a sample payload is generated. It mixes long
//! runs of one byte (which drive the encoder through the same few states),
//! text-like data and random bytes, so every part of the trellis gets used.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate sample message data.
///
/// The same `seed` and `size_bytes` always produce the same bytes.
pub fn generate_sample_data(seed: u64, size_bytes: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(size_bytes);

    while data.len() < size_bytes {
        let section = (size_bytes - data.len()).min(4096);

        match rng.gen_range(0..10u8) {
            // Runs of a single byte, often all-zero or all-one
            0..=2 => {
                let byte_value = match rng.gen_range(0..3u8) {
                    0 => 0x00,
                    1 => 0xFF,
                    _ => rng.gen(),
                };
                data.extend(std::iter::repeat(byte_value).take(section));
            }

            // Text-like
            3..=6 => {
                let alphabet = b"abcdefghijklmnopqrstuvwxyz .!,\n";
                data.extend((0..section).map(|_| alphabet[rng.gen_range(0..alphabet.len())]));
            }

            // Uniformly random
            _ => {
                data.extend((0..section).map(|_| rng.gen::<u8>()));
            }
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_sample_data() {
        let data = generate_sample_data(42, 1000);
        assert_eq!(data.len(), 1000);
    }

    #[test]
    fn test_determinism() {
        assert_eq!(generate_sample_data(12345, 5000), generate_sample_data(12345, 5000));
    }

    #[test]
    fn test_different_seeds() {
        assert_ne!(generate_sample_data(1, 1000), generate_sample_data(2, 1000));
    }

    #[test]
    fn test_various_sizes() {
        for size in [0, 1, 100, 4097, 100000] {
            assert_eq!(generate_sample_data(999, size).len(), size);
        }
    }
}
