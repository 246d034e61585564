//! # buildsense
//!
//! **CLI Binary**
//!
//! Entry point for the `buildsense` command-line application. Each
//! subcommand wires one sensor to a telemetry client.
//!
//! ## Responsibilities
//! * Parse command line arguments
//! * Load `buildsense.toml` and layer flags over it
//! * Initialise logging
//! * Dispatch commands and render errors
//!
//! This crate should contain minimal business logic.

mod cli;
mod commands;
mod config;
mod error_hints;

use anyhow::{Context, Result};
use buildsense_settings::BuildsenseConfig;
use clap::Parser;
use tracing::debug;

use cli::Cli;

/// Run the CLI with the process arguments.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let config = BuildsenseConfig::load(cli.config.as_deref(), &cwd)
        .context("Failed to load configuration")?;
    commands::dispatch(cli, &config)
}

/// Render an error with its cause chain and any hints.
pub fn format_error(err: &anyhow::Error) -> String {
    error_hints::format(err)
}

/// Log to stderr: warn by default, info with `-v`, debug with `-vv`.
/// `RUST_LOG` takes precedence.
fn init_logging(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}
