mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use radiko_client::{FfmpegCapturer, RadikoConfig};
use std::process;
use tracing::{Level, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::cli::Args;
use crate::error::Result;

fn main() {
    if let Err(e) = bootstrap() {
        error!("Application error: {}", e);
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let capturer = FfmpegCapturer::default();
    commands::run(args, RadikoConfig::default(), &capturer).await
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
