//! foldcrc CLI
//!
//! CRC-32 checksums of files using the fastest carry-less multiply backend
//! the processor offers.

mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::{SumOptions, cmd_check, cmd_probe, cmd_sum};
use foldcrc_core::Backend;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "foldcrc")]
#[command(author, version, about = "CRC-32 checksums with SIMD folding")]
#[command(long_about = "
foldcrc computes CRC-32 (ISO-HDLC, as used by zlib, gzip, PNG and Ethernet)
with PCLMULQDQ, AVX-512 VPCLMULQDQ or NEON PMULL folding when available.

The backend can be pinned with --backend or the FOLDCRC_FORCE environment
variable (auto, scalar, narrow, wide).

Examples:
  foldcrc sum file.bin
  foldcrc sum --json *.iso
  foldcrc sum --backend scalar --mmap large.img
  foldcrc check file.bin 0xcbf43926
  foldcrc probe
")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the CRC-32 of each file ("-" reads standard input)
    #[command(alias = "s")]
    Sum {
        /// Files to checksum
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Backend to use (scalar, pclmul, vpclmul, pmull)
        #[arg(short, long)]
        backend: Option<Backend>,

        /// Memory-map files instead of reading them
        #[arg(short, long)]
        mmap: bool,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Verify a file against an expected CRC-32
    #[command(alias = "c")]
    Check {
        /// File to verify
        file: PathBuf,

        /// Expected CRC-32 in hexadecimal, with or without 0x
        expected: String,

        /// Backend to use (scalar, pclmul, vpclmul, pmull)
        #[arg(short, long)]
        backend: Option<Backend>,
    },

    /// Show detected processor features and backends
    Probe {
        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Sum {
            files,
            json,
            backend,
            mmap,
            progress,
        } => cmd_sum(
            &files,
            &SumOptions {
                json,
                backend: backend.unwrap_or_else(Backend::active),
                mmap,
                progress,
            },
        ),
        Commands::Check {
            file,
            expected,
            backend,
        } => cmd_check(&file, &expected, backend.unwrap_or_else(Backend::active)),
        Commands::Probe { json } => cmd_probe(json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
