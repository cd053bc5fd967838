//! Aggregate command implementation

use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use cashflow_core::{
    aggregate_all,
    import::{parse_csv, parse_json, parse_rules},
    AggregateRule, AggregateValues, Observation, RuleOutput,
};
use tracing::info;

use super::{load_defaults, truncate};

/// How aggregate results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {} (valid: text, json)", s)),
        }
    }
}

/// Read observations, choosing the parser from the file extension
pub fn load_observations(path: &Path) -> Result<Vec<Observation>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;

    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let observations = if is_csv {
        parse_csv(file)
    } else {
        parse_json(file)
    }
    .with_context(|| format!("Failed to parse observations: {}", path.display()))?;

    Ok(observations)
}

pub fn load_rules(path: &Path, group: Option<&str>) -> Result<Vec<AggregateRule>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let mut rules = parse_rules(file)
        .with_context(|| format!("Failed to parse rules: {}", path.display()))?;

    if let Some(group) = group {
        rules.retain(|rule| rule.group == group);
        if rules.is_empty() {
            anyhow::bail!("No rules in group '{}'", group);
        }
    }

    Ok(rules)
}

/// Load inputs and evaluate every selected rule
pub fn run_aggregation(
    observations_path: &Path,
    rules_path: &Path,
    group: Option<&str>,
    config: Option<&Path>,
) -> Result<(Vec<AggregateRule>, Vec<RuleOutput>)> {
    let defaults = load_defaults(config)?;
    let observations = load_observations(observations_path)?;
    let rules = load_rules(rules_path, group)?;

    info!(
        observations = observations.len(),
        rules = rules.len(),
        "Running aggregation"
    );

    let outputs = aggregate_all(&observations, &rules, &defaults)?;
    for output in &outputs {
        info!(
            group = %output.group,
            windows = output.aggregates.len(),
            "Evaluated aggregate rule"
        );
    }
    Ok((rules, outputs))
}

pub fn cmd_aggregate(
    observations: &Path,
    rules: &Path,
    format: &str,
    group: Option<&str>,
    config: Option<&Path>,
) -> Result<()> {
    let format: OutputFormat = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let (rules, outputs) = run_aggregation(observations, rules, group, config)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outputs)?),
        OutputFormat::Text => print_text(&rules, &outputs),
    }

    Ok(())
}

fn print_text(rules: &[AggregateRule], outputs: &[RuleOutput]) {
    for (rule, output) in rules.iter().zip(outputs) {
        println!();
        println!(
            "📊 {} ({} {} of {})",
            output.group, rule.frequency, rule.kind, rule.property_key
        );

        if output.aggregates.is_empty() {
            println!("   No windows with admitted observations.");
            continue;
        }

        println!(
            "   {:<10}   {:<10}   {:>6}   Values",
            "Start", "End", "Count"
        );
        println!("   ─────────────────────────────────────────────────────────────");
        for agg in &output.aggregates {
            println!(
                "   {}   {}   {:>6}   {}",
                agg.date_start,
                agg.date_end,
                agg.event_count,
                truncate(&describe_values(&agg.values), 40)
            );
        }
    }
    println!();
}

/// One-line summary of an aggregate's statistics
pub fn describe_values(values: &AggregateValues) -> String {
    match values {
        AggregateValues::SumsAndAverages { sum, average } => {
            format!("sum {:.2}, avg {:.2}", sum, average)
        }
        AggregateValues::MinimumsAndMaximums { minimum, maximum } => {
            format!("min {}, max {}", optional(*minimum), optional(*maximum))
        }
        AggregateValues::MediansAndModes { medians, modes } => {
            format!("medians [{}], modes [{}]", list(medians), list(modes))
        }
        AggregateValues::GreatestValues { greatest_values } => {
            format!("greatest [{}]", list(greatest_values))
        }
        AggregateValues::LeastValues { least_values } => {
            format!("least [{}]", list(least_values))
        }
    }
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

fn list(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.2}", v))
        .collect::<Vec<_>>()
        .join(", ")
}
