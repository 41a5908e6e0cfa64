//! convcode-sim: push data through a convolutional code and a noisy channel.
//!
//! The input is split into blocks. Each block is encoded, corrupted by a
//! binary symmetric channel and decoded again, and the decoded block is
//! checked against its input block with a CRC32.

mod config;
mod input_gen;

use config::Config;
use convcode_core::channel::BinarySymmetricChannel;
use convcode_core::metrics::{bit_errors, CodecMetrics};
use convcode_core::{ConvolutionalCode, Error, Result};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", Error::Config(e));
            eprintln!("run with --help for usage");
            return ExitCode::from(2);
        }
    };

    if config.print_config {
        config.print();
    }

    match run(&config) {
        Ok(metrics) => {
            if config.print_metrics {
                metrics.print_summary();
            }
            metrics.print_result();
            if metrics.blocks_failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("run failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise log at info.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn run(config: &Config) -> Result<CodecMetrics> {
    let input = match &config.input_file {
        Some(path) => std::fs::read(path)?,
        None => input_gen::generate_sample_data(config.channel.seed, config.sample_bytes),
    };
    info!(
        bytes = input.len(),
        code = %config.code,
        block_bytes = config.block_bytes,
        ber = config.channel.bit_error_rate,
        "starting run"
    );

    let mut code = ConvolutionalCode::new(
        config.code.rate(),
        config.code.order(),
        config.code.polynomials(),
    )?;
    let mut channel = BinarySymmetricChannel::new(config.channel);
    let mut metrics = CodecMetrics::new();

    let mut output = Vec::with_capacity(input.len());
    let mut encoded = vec![0u8; code.encode_len(config.block_bytes).div_ceil(8)];
    let mut decoded = vec![0u8; config.block_bytes];

    for (index, block) in input.chunks(config.block_bytes).enumerate() {
        let bits = code.encode(block, &mut encoded)?;
        metrics.blocks_encoded += 1;
        metrics.input_bytes += block.len() as u64;
        metrics.encoded_bits += bits as u64;

        let flipped = channel.transmit(&mut encoded, bits);
        metrics.channel_bit_errors += flipped as u64;

        let len = code.decode(&encoded, bits, &mut decoded)?;
        let received = &decoded[..len];
        metrics.blocks_decoded += 1;
        metrics.output_bytes += len as u64;
        metrics.corrected_bits += code.last_path_error();

        if crc32fast::hash(received) == crc32fast::hash(block) {
            debug!(block = index, flipped, "block decoded");
        } else {
            let residual = bit_errors(block, received);
            metrics.residual_bit_errors += residual;
            metrics.blocks_failed += 1;
            warn!(block = index, flipped, residual, "block decoded with errors");
        }

        output.extend_from_slice(received);
    }

    if let Some(path) = &config.output_file {
        std::fs::write(path, &output)?;
        info!(path = %path.display(), bytes = output.len(), "wrote decoded data");
    }

    metrics.complete();
    Ok(metrics)
}
