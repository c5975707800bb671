//! Latente CLI
//!
//! # Usage
//!
//! ```bash
//! # Train from config
//! latente train aae.yaml --epochs 20
//!
//! # Resume from a checkpoint
//! latente train aae.yaml --resume checkpoints/epoch4_aae.safetensors
//!
//! # Build the latent index with a trained encoder
//! latente index aae.yaml --checkpoint checkpoints/epoch20_aae.safetensors
//!
//! # Nearest images to a latent coordinate
//! latente search aae.yaml --coordinate 0.1,-0.3,0.8 -k 10
//!
//! # Decode a latent vector
//! latente generate aae.yaml --checkpoint checkpoints/epoch20_aae.safetensors --z 0,0,1
//! ```

use clap::Parser;
use latente::cli::{init_tracing, run_command, Cli, LogLevel};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogLevel::from_flags(cli.quiet, cli.verbose));

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
