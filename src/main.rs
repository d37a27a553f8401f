//! Secret rotation CLI
//!
//! This is the main entry point for the CLI application.

use anyhow::Result;
use clap::Parser;
use db_secret_rotator::cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the rotation result
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    cli::execute(cli).await
}
