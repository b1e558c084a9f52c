//! Claimlens: Insurance Claims Analysis CLI
//!
//! Runs the exploratory branch by default and the modeling branch with
//! `claimlens model`.

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use claimlens::cli::{run_eda, run_model, Cli, Commands};

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match &cli.command {
        Some(Commands::Model(args)) => run_model(args),
        None => run_eda(&cli),
    };

    if let Err(e) = &result {
        error!("An error occurred: {:#}", e);
    }
    result
}
