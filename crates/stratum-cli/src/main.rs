//! Stratum CLI
//!
//! Loads configuration files, the environment and command-line overrides into
//! a registry, then answers questions about the result.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut registry = commands::load(&cli)?;
    match &cli.command {
        Commands::Get { keys, .. } => commands::run_get(&mut registry, keys),
        Commands::Dump { json, .. } => commands::run_dump(&mut registry, *json),
        Commands::Explain { key, json, .. } => commands::run_explain(&mut registry, key, *json),
        Commands::Interpolate { text, .. } => commands::run_interpolate(&mut registry, text),
    }
}

/// `-v` forces DEBUG; otherwise `RUST_LOG` decides, falling back to warnings only.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
    tracing::debug!("Verbose mode enabled");
}
