//! FOG CLI - Command-line interface
//!
//! Runs the media server and inspects storage and catalog consistency.

mod commands;

use anyhow::Context;
use clap::Parser;
use fog_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "fog")]
#[command(about = "Range-aware podcast media server")]
#[command(version)]
struct Cli {
    /// Console log level
    #[arg(long, global = true, value_enum, default_value_t)]
    log_level: CliLogLevel,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_tracing_level(), None)
        .context("Failed to initialize tracing")?;

    commands::handle_command(cli.command).await
}
