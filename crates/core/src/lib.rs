//! convcode-core: convolutional codes with a hard-decision Viterbi decoder
//!
//! This library provides the pieces of a forward-error-correction pipeline:
//! - Packs and unpacks bit streams MSB-first over borrowed byte buffers
//! - Builds trellis tables from generator polynomials
//! - Encodes messages with a convolutional code and a zero tail
//! - Decodes received bits with windowed Viterbi traceback
//! - Simulates a binary symmetric channel with seeded randomness
//!
//! # Architecture
//!
//! - `bitio`: Bit stream writer, reader and the byte reversal table
//! - `table`: Trellis table construction and standard polynomials
//! - `error_buffer`: Double-buffered path metrics
//! - `history`: Survivor decisions and traceback
//! - `pair_lookup`: Shared branch distances for sibling states
//! - `convolutional`: The code engine (encode and decode)
//! - `channel`: Bit-flipping channel simulator
//! - `metrics`: Counters for encode/channel/decode runs
//!
//! # Design Principles
//!
//! - **No panics**: Bad parameters, short buffers and allocation failure are
//!   all reported as errors
//! - **Bounded memory**: Decode memory depends on the code, never on the
//!   message length
//! - **Deterministic**: Seeded randomness makes simulations reproducible

pub mod bitio;
pub mod channel;
pub mod convolutional;
pub mod error;
pub mod error_buffer;
pub mod history;
pub mod metrics;
pub mod pair_lookup;
pub mod table;

// Re-export commonly used types
pub use convolutional::ConvolutionalCode;
pub use error::{Error, Result};
