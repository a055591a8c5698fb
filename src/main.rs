//! ormgen
//!
//! Generates ORM entity classes and reversible migrations from schema and
//! diff documents.

use clap::Parser;
use colored::Colorize;
use ormgen_cli::{Cli, invalid_input_code, run};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(status) => status.into(),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            invalid_input_code()
        }
    }
}
