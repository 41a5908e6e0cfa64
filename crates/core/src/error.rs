//! Error types for the convolutional code core.
//!
//! All operations return structured errors rather than panicking.
//! Capacity problems in the bit streams are reported, never silently
//! truncated, and leave the stream state untouched.

use thiserror::Error;

/// Top-level error type for all operations in the crate.
///
/// Each variant corresponds to a specific failure domain:
/// - Bit I/O: reading/writing bits from/to byte buffers
/// - Code: engine construction, table setup, encode/decode arguments
/// - Config: application configuration
/// - I/O: file system operations
#[derive(Debug, Error)]
pub enum Error {
    /// Bit I/O operation failed (e.g., writing past end of buffer)
    #[error("bit I/O error: {0}")]
    BitIo(#[from] BitIoError),

    /// Convolutional code error (e.g., invalid order, short input)
    #[error("convolutional code error: {0}")]
    Code(#[from] CodeError),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Bit-level I/O errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitIoError {
    /// The destination buffer cannot hold the bits of this write
    #[error("capacity exceeded: need {needed} bytes, {available} available")]
    CapacityExceeded { needed: usize, available: usize },

    /// Attempted to read more bits than remain in the source
    #[error("insufficient bits: requested {requested}, available {available}")]
    InsufficientBits { requested: usize, available: usize },

    /// Invalid bit count (a single field is 1 to 8 bits wide)
    #[error("invalid bit count: {0}")]
    InvalidBitCount(usize),
}

/// Convolutional code errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    /// Shift register order does not fit the state counter
    #[error("order {order} must be between 1 and {max}")]
    InvalidOrder { order: usize, max: usize },

    /// Rate outside the supported range
    #[error("rate {rate} must be between {min} and {max}")]
    InvalidRate { rate: usize, min: usize, max: usize },

    /// One generator polynomial is needed per output bit
    #[error("expected {expected} polynomials, got {actual}")]
    PolynomialCount { expected: usize, actual: usize },

    /// Polynomial has taps beyond the shift register
    #[error("polynomial {polynomial:#o} is wider than order {order}")]
    PolynomialTooWide { polynomial: u32, order: usize },

    /// Precomputed table has the wrong number of rows
    #[error("table has {actual} entries, expected {expected}")]
    TableSize { expected: usize, actual: usize },

    /// Precomputed table entry has more than `rate` bits
    #[error("table entry {index} ({value:#x}) exceeds {rate} output bits")]
    TableEntry { index: usize, value: u32, rate: usize },

    /// Fallible allocation failed
    #[error("failed to allocate {what}")]
    Allocation { what: &'static str },

    /// Encoded bit count is not a whole number of symbols
    #[error("{bits} encoded bits is not a multiple of rate {rate}")]
    UnalignedInput { bits: usize, rate: usize },

    /// Encoded input is shorter than required
    #[error("encoded input too short: need {required} bits, got {actual}")]
    InputTooShort { required: usize, actual: usize },

    /// Output buffer cannot hold the result
    #[error("output buffer too small: need {required} bytes, got {actual}")]
    OutputTooSmall { required: usize, actual: usize },
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
