//! Config command and the shared defaults loader

use std::path::Path;

use anyhow::{Context, Result};
use cashflow_core::config::default_config_path;
use cashflow_core::AggregationDefaults;

/// Load aggregation defaults from `--config`, or the standard location
pub fn load_defaults(config: Option<&Path>) -> Result<AggregationDefaults> {
    match config {
        Some(path) => AggregationDefaults::load_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => AggregationDefaults::load().context("Failed to load aggregation defaults"),
    }
}

pub fn cmd_config(config: Option<&Path>) -> Result<()> {
    let defaults = load_defaults(config)?;

    let source = match config.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) if path.exists() => path.display().to_string(),
        _ => "built-in defaults".to_string(),
    };

    println!();
    println!("⚙️  Aggregation Defaults");
    println!("   Source: {}", source);
    println!("   ─────────────────────────────────────");
    println!("   {:<18} {}", "selection_limit", defaults.selection_limit);
    println!("   {:<18} {}", "mode_max", defaults.mode_max);
    println!("   {:<18} {}", "x_percent_range", defaults.x_percent_range);
    println!("   {:<18} {}", "day_cycles", defaults.day_cycles);
    println!("   {:<18} {}", "weekday_start", defaults.weekday_start);
    println!();

    Ok(())
}
