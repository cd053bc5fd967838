//! Functions command

use anyhow::Result;
use cashflow_core::{AggregateFunction, AggregateType, Frequency};

pub fn cmd_functions() -> Result<()> {
    let functions = AggregateFunction::all();

    println!();
    println!("🧮 Aggregate Functions ({})", functions.len());
    println!("   ─────────────────────────────────────────────────");

    for frequency in Frequency::all() {
        let kinds: Vec<&str> = AggregateType::all()
            .iter()
            .filter(|kind| AggregateFunction::select(*frequency, **kind).is_some())
            .map(AggregateType::as_str)
            .collect();

        if kinds.is_empty() {
            println!("   {:<12} (no windowing)", frequency);
        } else {
            println!("   {:<12} {}", frequency, kinds.join(", "));
        }
    }
    println!();

    Ok(())
}
