//! Cashflow Core Library
//!
//! Windowed aggregation of cash-balance forecast observations:
//! - Date-ordered traversal with calendar and caller-defined windows
//! - Reducers for sums, extremes, medians/modes and ranked selections
//! - Aggregate rules resolved against layered TOML defaults
//! - JSON and CSV observation import

pub mod aggregate;
pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod rules;

/// Observation builders for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregate::{AggregateFunction, DateCursor, FiscalYearStart, Granularity, WindowBoundary};
pub use config::AggregationDefaults;
pub use error::{Error, Result};
pub use models::{
    Aggregate, AggregateType, AggregateValues, DateSet, FlowDirection, Frequency, Observation,
    TimeZoneType, Tuning, WindowSpec,
};
pub use rules::{aggregate_all, AggregateRule, RuleOutput};
