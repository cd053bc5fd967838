//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Cashflow - Windowed aggregation of balance forecasts
#[derive(Parser)]
#[command(name = "cashflow")]
#[command(about = "Summarize cash-balance forecast observations by window", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Aggregation defaults file (defaults to ~/.config/cashflow/aggregates.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run aggregate rules over a file of observations
    Aggregate {
        /// Observations file (.json array or .csv)
        #[arg(short, long)]
        observations: PathBuf,

        /// Aggregate rules file (JSON array)
        #[arg(short, long)]
        rules: PathBuf,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Only run rules in this group
        #[arg(short, long)]
        group: Option<String>,
    },

    /// List every frequency/type combination that has an aggregate function
    Functions,

    /// Show the effective aggregation defaults
    Config,
}
