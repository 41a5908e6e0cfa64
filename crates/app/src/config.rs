//! Configuration for the convcode-sim application.
//!
//! Handles parsing command-line arguments and generating defaults, including
//! randomized defaults that are reproducible with a seed.
//!
//! The tool works with zero arguments. All resolved values can be printed
//! with `--print-config` so any run can be repeated.

use convcode_core::channel::ChannelConfig;
use convcode_core::table::{Polynomial, R12_K3, R12_K5, R12_K7, R13_K7};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// One of the built-in codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeChoice {
    /// Rate 1/2, order 3
    R12K3,
    /// Rate 1/2, order 5
    R12K5,
    /// Rate 1/2, order 7
    R12K7,
    /// Rate 1/3, order 7
    R13K7,
}

impl CodeChoice {
    pub fn rate(self) -> usize {
        match self {
            CodeChoice::R13K7 => 3,
            _ => 2,
        }
    }

    pub fn order(self) -> usize {
        match self {
            CodeChoice::R12K3 => 3,
            CodeChoice::R12K5 => 5,
            CodeChoice::R12K7 | CodeChoice::R13K7 => 7,
        }
    }

    pub fn polynomials(self) -> &'static [Polynomial] {
        match self {
            CodeChoice::R12K3 => &R12_K3,
            CodeChoice::R12K5 => &R12_K5,
            CodeChoice::R12K7 => &R12_K7,
            CodeChoice::R13K7 => &R13_K7,
        }
    }
}

impl FromStr for CodeChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "k3" | "r12k3" => Ok(CodeChoice::R12K3),
            "k5" | "r12k5" => Ok(CodeChoice::R12K5),
            "k7" | "r12k7" => Ok(CodeChoice::R12K7),
            "r13k7" => Ok(CodeChoice::R13K7),
            other => Err(format!("unknown code: {other} (expected k3, k5, k7 or r13k7)")),
        }
    }
}

impl fmt::Display for CodeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rate 1/{}, order {} (", self.rate(), self.order())?;
        for (i, p) in self.polynomials().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p:#o}")?;
        }
        write!(f, ")")
    }
}

/// Complete configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct Config {
    // === Files ===
    /// Input file path (None = generate sample)
    pub input_file: Option<PathBuf>,

    /// Where to write the decoded data (None = discard)
    pub output_file: Option<PathBuf>,

    /// Size of generated sample data
    pub sample_bytes: usize,

    // === Coding ===
    /// Code used for every block
    pub code: CodeChoice,

    /// Message bytes per encoded block
    pub block_bytes: usize,

    // === Channel ===
    /// Channel simulation config
    pub channel: ChannelConfig,

    // === Behavior ===
    /// Whether to print detailed config
    pub print_config: bool,

    /// Whether to print detailed metrics summary
    pub print_metrics: bool,
}

impl Config {
    /// Parse configuration from command-line arguments.
    ///
    /// Without `--seed` a time-based seed is used. With `--seed` every
    /// random choice is fully deterministic.
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        let mut input_file: Option<PathBuf> = None;
        let mut output_file: Option<PathBuf> = None;
        let mut seed: Option<u64> = None;
        let mut sample_bytes: Option<usize> = None;
        let mut block_bytes: Option<usize> = None;
        let mut code: Option<CodeChoice> = None;
        let mut bit_error_rate: Option<f64> = None;
        let mut print_config = false;
        let mut print_metrics = true;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--in" => {
                    input_file = Some(PathBuf::from(value(args, &mut i, "a path")?));
                }
                "--out" => {
                    output_file = Some(PathBuf::from(value(args, &mut i, "a path")?));
                }
                "--seed" => {
                    seed = Some(parse(args, &mut i, "seed")?);
                }
                "--bytes" => {
                    sample_bytes = Some(parse(args, &mut i, "bytes")?);
                }
                "--block-bytes" => {
                    let n: usize = parse(args, &mut i, "block-bytes")?;
                    if n == 0 {
                        return Err("--block-bytes must be at least 1".to_string());
                    }
                    block_bytes = Some(n);
                }
                "--code" => {
                    code = Some(value(args, &mut i, "a code name")?.parse()?);
                }
                "--ber" => {
                    let rate: f64 = parse(args, &mut i, "ber")?;
                    if !(0.0..=1.0).contains(&rate) {
                        return Err("--ber must be between 0.0 and 1.0".to_string());
                    }
                    bit_error_rate = Some(rate);
                }
                "--no-errors" => {
                    bit_error_rate = Some(0.0);
                }
                "--print-config" => {
                    print_config = true;
                }
                "--no-metrics" => {
                    print_metrics = false;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                _ => {
                    return Err(format!("unknown argument: {}", args[i]));
                }
            }
            i += 1;
        }

        // Determine seed (explicit or time-based)
        let seed = seed.unwrap_or_else(|| {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default()
        });

        // Generate defaults using seed
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        Ok(Config {
            input_file,
            output_file,
            sample_bytes: sample_bytes.unwrap_or(256 * 1024),
            code: code.unwrap_or(CodeChoice::R12K7),
            block_bytes: block_bytes.unwrap_or_else(|| 1 << rng.gen_range(6..=12)),
            channel: ChannelConfig {
                bit_error_rate: bit_error_rate.unwrap_or_else(|| {
                    // Bias toward small error rates
                    let r: f64 = rng.gen();
                    r * r * 0.02 // 0-2%, biased toward 0
                }),
                seed,
            },
            print_config,
            print_metrics,
        })
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        match &self.input_file {
            Some(path) => println!("Input file:  {}", path.display()),
            None => println!("Input file:  (generate {} bytes)", self.sample_bytes),
        }
        match &self.output_file {
            Some(path) => println!("Output file: {}", path.display()),
            None => println!("Output file: (none)"),
        }
        println!();
        println!("=== Coding ===");
        println!("Code: {}", self.code);
        println!("Block size: {} bytes", self.block_bytes);
        println!();
        println!("=== Channel Simulation ===");
        println!("Seed: {}", self.channel.seed);
        println!("Bit error rate: {:.4}%", self.channel.bit_error_rate * 100.0);
        println!();
    }
}

/// Advance to the value following a flag.
fn value<'a>(args: &'a [String], i: &mut usize, what: &str) -> Result<&'a str, String> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires {what}"))
}

fn parse<T: FromStr>(args: &[String], i: &mut usize, name: &str) -> Result<T, String> {
    value(args, i, "a number")?
        .parse()
        .map_err(|_| format!("invalid {name}"))
}

fn print_help() {
    println!("convcode-sim: encode data with a convolutional code, corrupt it, decode it");
    println!();
    println!("USAGE:");
    println!("    convcode-sim [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --in <PATH>             Input file (default: generate sample data)");
    println!("    --out <PATH>            Write decoded data to this file");
    println!("    --bytes <N>             Size of generated sample (default: 262144)");
    println!("    --seed <N>              Random seed for reproducibility");
    println!();
    println!("    --code <NAME>           k3, k5, k7 or r13k7 (default: k7)");
    println!("    --block-bytes <N>       Message bytes per block (default: random 64-4096)");
    println!();
    println!("    --ber <RATE>            Channel bit error rate 0.0-1.0 (default: random 0-0.02)");
    println!("    --no-errors             Perfect channel (same as --ber 0)");
    println!();
    println!("    --print-config          Print resolved configuration");
    println!("    --no-metrics            Don't print metrics summary");
    println!("    --help, -h              Print this help");
    println!();
    println!("EXAMPLES:");
    println!("    convcode-sim                         # Run with random defaults");
    println!("    convcode-sim --seed 42               # Deterministic run");
    println!("    convcode-sim --code k3 --ber 0.001   # Short code, light noise");
    println!();
}
