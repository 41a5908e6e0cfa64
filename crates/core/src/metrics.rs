//! Metrics collection and reporting for encode/channel/decode runs.
//!
//! Tracks how much data went through the code, how much the channel
//! corrupted, how much the decoder reported correcting, and how much
//! survived uncorrected.
//!
//! # Thread Safety
//!
//! The `CodecMetrics` struct is NOT thread-safe. For multi-threaded use,
//! keep per-thread metrics and combine them with `merge` at the end.

use std::time::{Duration, Instant};

/// Counters for a simulation run.
#[derive(Debug, Clone)]
pub struct CodecMetrics {
    // === Timing ===
    /// When the run started
    pub start_time: Instant,

    /// When the run ended (set on completion)
    pub end_time: Option<Instant>,

    // === Encoding ===
    /// Message bytes fed to the encoder
    pub input_bytes: u64,

    /// Encoded bits produced
    pub encoded_bits: u64,

    /// Blocks encoded
    pub blocks_encoded: u64,

    // === Channel ===
    /// Bits flipped by the channel
    pub channel_bit_errors: u64,

    // === Decoding ===
    /// Blocks decoded
    pub blocks_decoded: u64,

    /// Message bytes produced by the decoder
    pub output_bytes: u64,

    /// Sum of surviving path errors reported by the decoder
    pub corrected_bits: u64,

    /// Message bits that differ from the input after decoding
    pub residual_bit_errors: u64,

    /// Blocks whose decoded payload failed the integrity check
    pub blocks_failed: u64,
}

impl CodecMetrics {
    /// Create new metrics with start time set to now.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            end_time: None,
            input_bytes: 0,
            encoded_bits: 0,
            blocks_encoded: 0,
            channel_bit_errors: 0,
            blocks_decoded: 0,
            output_bytes: 0,
            corrected_bits: 0,
            residual_bit_errors: 0,
            blocks_failed: 0,
        }
    }

    /// Mark the run as complete.
    pub fn complete(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Get total duration (or current elapsed if not complete).
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Message bits per encoded bit.
    ///
    /// Returns 0.0 if nothing was encoded.
    pub fn effective_rate(&self) -> f64 {
        if self.encoded_bits == 0 {
            0.0
        } else {
            (self.input_bytes * 8) as f64 / self.encoded_bits as f64
        }
    }

    /// Channel bit error rate (flipped / transmitted).
    pub fn channel_ber(&self) -> f64 {
        if self.encoded_bits == 0 {
            0.0
        } else {
            self.channel_bit_errors as f64 / self.encoded_bits as f64
        }
    }

    /// Bit error rate after decoding (residual / message bits).
    pub fn decoded_ber(&self) -> f64 {
        if self.output_bytes == 0 {
            0.0
        } else {
            self.residual_bit_errors as f64 / (self.output_bytes * 8) as f64
        }
    }

    /// Decoder throughput in message bytes per second.
    pub fn throughput_bps(&self) -> f64 {
        let duration_secs = self.duration().as_secs_f64();
        if duration_secs == 0.0 {
            0.0
        } else {
            self.output_bytes as f64 / duration_secs
        }
    }

    /// Fold another set of counters into this one.
    pub fn merge(&mut self, other: &CodecMetrics) {
        self.input_bytes += other.input_bytes;
        self.encoded_bits += other.encoded_bits;
        self.blocks_encoded += other.blocks_encoded;
        self.channel_bit_errors += other.channel_bit_errors;
        self.blocks_decoded += other.blocks_decoded;
        self.output_bytes += other.output_bytes;
        self.corrected_bits += other.corrected_bits;
        self.residual_bit_errors += other.residual_bit_errors;
        self.blocks_failed += other.blocks_failed;
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n=== Run Summary ===");
        println!("Duration: {} ms", self.duration().as_millis());
        println!();

        println!("=== Encoding ===");
        println!("Input: {} bytes in {} blocks", self.input_bytes, self.blocks_encoded);
        println!("Encoded: {} bits", self.encoded_bits);
        println!("Effective rate: {:.4}", self.effective_rate());
        println!();

        println!("=== Channel ===");
        println!(
            "Bit errors: {} ({:.4}%)",
            self.channel_bit_errors,
            self.channel_ber() * 100.0
        );
        println!();

        println!("=== Decoding ===");
        println!("Output: {} bytes in {} blocks", self.output_bytes, self.blocks_decoded);
        println!("Corrected bits: {}", self.corrected_bits);
        println!(
            "Residual bit errors: {} ({:.6}%)",
            self.residual_bit_errors,
            self.decoded_ber() * 100.0
        );
        println!("Failed blocks: {}", self.blocks_failed);
        println!();

        println!("=== Performance ===");
        println!("Throughput: {:.2} MB/s", self.throughput_bps() / 1_000_000.0);
        println!();
    }

    /// Print just the final result (pass/fail).
    pub fn print_result(&self) {
        if self.blocks_failed == 0 && self.input_bytes == self.output_bytes {
            println!("✓ All blocks decoded cleanly");
            println!(
                "  {} bytes, {} channel errors corrected in {} ms",
                self.output_bytes,
                self.channel_bit_errors,
                self.duration().as_millis()
            );
        } else if self.blocks_failed > 0 {
            println!(
                "✗ {} of {} blocks decoded with errors",
                self.blocks_failed, self.blocks_decoded
            );
        } else {
            println!(
                "✗ Size mismatch ({} != {})",
                self.input_bytes, self.output_bytes
            );
        }
    }

    /// Export metrics as a simple text format (for parsing/testing).
    pub fn export_text(&self) -> String {
        format!(
            "duration_ms={}\n\
             input_bytes={}\n\
             encoded_bits={}\n\
             effective_rate={:.4}\n\
             channel_bit_errors={}\n\
             channel_ber={:.6}\n\
             output_bytes={}\n\
             corrected_bits={}\n\
             residual_bit_errors={}\n\
             decoded_ber={:.6}\n\
             blocks_failed={}\n",
            self.duration().as_millis(),
            self.input_bytes,
            self.encoded_bits,
            self.effective_rate(),
            self.channel_bit_errors,
            self.channel_ber(),
            self.output_bytes,
            self.corrected_bits,
            self.residual_bit_errors,
            self.decoded_ber(),
            self.blocks_failed,
        )
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of differing bits between two equal-length byte slices.
///
/// Extra bytes in the longer slice count as fully wrong.
pub fn bit_errors(expected: &[u8], actual: &[u8]) -> u64 {
    let common: u64 = expected
        .iter()
        .zip(actual)
        .map(|(a, b)| u64::from((a ^ b).count_ones()))
        .sum();
    let extra = expected.len().abs_diff(actual.len()) as u64 * 8;
    common + extra
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = CodecMetrics::new();
        assert!(metrics.end_time.is_none());
        assert!(metrics.duration().as_millis() < 100);
    }

    #[test]
    fn test_effective_rate() {
        let mut metrics = CodecMetrics::new();
        metrics.input_bytes = 100;
        metrics.encoded_bits = 1600;
        assert_eq!(metrics.effective_rate(), 0.5);
    }

    #[test]
    fn test_error_rates() {
        let mut metrics = CodecMetrics::new();
        metrics.encoded_bits = 1000;
        metrics.channel_bit_errors = 10;
        metrics.output_bytes = 50;
        metrics.residual_bit_errors = 4;

        assert_eq!(metrics.channel_ber(), 0.01);
        assert_eq!(metrics.decoded_ber(), 0.01);
    }

    #[test]
    fn test_zero_division_guards() {
        let metrics = CodecMetrics::new();
        assert_eq!(metrics.effective_rate(), 0.0);
        assert_eq!(metrics.channel_ber(), 0.0);
        assert_eq!(metrics.decoded_ber(), 0.0);
    }

    #[test]
    fn test_merge() {
        let mut a = CodecMetrics::new();
        a.input_bytes = 10;
        a.blocks_failed = 1;
        let mut b = CodecMetrics::new();
        b.input_bytes = 5;
        b.corrected_bits = 3;

        a.merge(&b);
        assert_eq!(a.input_bytes, 15);
        assert_eq!(a.corrected_bits, 3);
        assert_eq!(a.blocks_failed, 1);
    }

    #[test]
    fn test_bit_errors() {
        assert_eq!(bit_errors(&[0xFF, 0x00], &[0xFF, 0x00]), 0);
        assert_eq!(bit_errors(&[0xFF, 0x00], &[0xFE, 0x03]), 3);
        assert_eq!(bit_errors(&[0xFF], &[0xFF, 0x12]), 8);
    }

    #[test]
    fn test_export_text() {
        let mut metrics = CodecMetrics::new();
        metrics.input_bytes = 1000;
        metrics.output_bytes = 1000;
        metrics.corrected_bits = 17;

        let text = metrics.export_text();
        assert!(text.contains("input_bytes=1000"));
        assert!(text.contains("output_bytes=1000"));
        assert!(text.contains("corrected_bits=17"));
    }
}
