//! Cashflow CLI - Windowed aggregation of balance forecasts
//!
//! Usage:
//!   cashflow aggregate --observations obs.json --rules rules.json
//!   cashflow functions        List supported frequency/type pairs
//!   cashflow config           Show effective defaults

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Aggregate {
            observations,
            rules,
            format,
            group,
        } => commands::cmd_aggregate(
            &observations,
            &rules,
            &format,
            group.as_deref(),
            cli.config.as_deref(),
        ),
        Commands::Functions => commands::cmd_functions(),
        Commands::Config => commands::cmd_config(cli.config.as_deref()),
    }
}
