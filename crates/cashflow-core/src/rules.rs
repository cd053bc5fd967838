//! Aggregate rules
//!
//! An aggregate rule is the user-facing description of one aggregation:
//! which property to read, how to window it, and which statistic to compute.
//! Rules are resolved against [`AggregationDefaults`] into an immutable
//! [`WindowSpec`] before any traversal runs, so every configuration error
//! surfaces up front.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{AggregateFunction, FiscalYearStart};
use crate::config::{parse_weekday, AggregationDefaults};
use crate::error::{Error, Result};
use crate::models::{
    Aggregate, AggregateType, DateSet, FlowDirection, Frequency, Observation, Tuning, WindowSpec,
};

/// One requested aggregation, as written in a rules file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRule {
    /// Label copied onto every aggregate this rule produces
    pub group: String,
    pub frequency: Frequency,
    #[serde(rename = "type")]
    pub kind: AggregateType,
    pub property_key: String,
    #[serde(default)]
    pub flow_direction: FlowDirection,
    /// `MM-DD` start of the fiscal year for ANNUALLY rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiscal_year_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_cycles: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_date_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub date_sets: Vec<DateSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_max: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_percent_range: Option<f64>,
    #[serde(default)]
    pub reverse: bool,
}

impl AggregateRule {
    pub fn new(
        group: impl Into<String>,
        frequency: Frequency,
        kind: AggregateType,
        property_key: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            frequency,
            kind,
            property_key: property_key.into(),
            flow_direction: FlowDirection::Both,
            fiscal_year_start: None,
            weekday_start: None,
            day_cycles: None,
            cycle_date_start: None,
            date_sets: Vec::new(),
            selection_limit: None,
            mode_max: None,
            x_percent_range: None,
            reverse: false,
        }
    }

    /// The composed aggregate function for this rule's frequency and type
    pub fn function(&self) -> Result<AggregateFunction> {
        AggregateFunction::select(self.frequency, self.kind).ok_or_else(|| {
            Error::Config(format!(
                "Rule '{}': no aggregate function for {} {}",
                self.group, self.frequency, self.kind
            ))
        })
    }

    /// Fill unset parameters from `defaults` and validate the result
    pub fn resolve(&self, defaults: &AggregationDefaults) -> Result<WindowSpec> {
        let invalid = |msg: String| Error::Config(format!("Rule '{}': {}", self.group, msg));

        if self.property_key.trim().is_empty() {
            return Err(invalid("propertyKey is required".to_string()));
        }

        let fiscal_year_start = self
            .fiscal_year_start
            .as_deref()
            .map(str::parse::<FiscalYearStart>)
            .transpose()?;

        let weekday_start = match &self.weekday_start {
            Some(name) => parse_weekday(name)?,
            None => defaults.weekday_start,
        };

        let day_cycles = self.day_cycles.unwrap_or(defaults.day_cycles);
        if day_cycles == 0 {
            return Err(invalid("dayCycles must be at least 1".to_string()));
        }

        if self.frequency == Frequency::DateSets && self.date_sets.is_empty() {
            return Err(invalid("DATE_SETS requires at least one date set".to_string()));
        }
        for set in &self.date_sets {
            if set.date_end < set.date_start {
                return Err(invalid(format!(
                    "date set ends before it starts: {} to {}",
                    set.date_start, set.date_end
                )));
            }
        }

        let tuning = Tuning {
            selection_limit: self.selection_limit.unwrap_or(defaults.selection_limit),
            mode_max: self.mode_max.unwrap_or(defaults.mode_max),
            x_percent_range: self.x_percent_range.unwrap_or(defaults.x_percent_range),
            reverse: self.reverse,
        };
        if tuning.selection_limit == 0 {
            return Err(invalid("selectionLimit must be at least 1".to_string()));
        }
        if tuning.mode_max == 0 {
            return Err(invalid("modeMax must be at least 1".to_string()));
        }
        if !tuning.x_percent_range.is_finite() || tuning.x_percent_range < 0.0 {
            return Err(invalid(format!(
                "xPercentRange must be a non-negative number, got {}",
                tuning.x_percent_range
            )));
        }

        Ok(WindowSpec {
            group: self.group.clone(),
            property_key: self.property_key.clone(),
            flow_direction: self.flow_direction,
            weekday_start,
            day_cycles,
            cycle_date_start: self.cycle_date_start,
            fiscal_year_start,
            date_sets: self.date_sets.clone(),
            tuning,
        })
    }

    /// Resolve and run this rule over `observations`
    pub fn evaluate(
        &self,
        observations: &[Observation],
        defaults: &AggregationDefaults,
    ) -> Result<Vec<Aggregate>> {
        let function = self.function()?;
        let spec = self.resolve(defaults)?;
        function.run(observations, &spec)
    }
}

/// Aggregates produced by one rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleOutput {
    pub group: String,
    pub aggregates: Vec<Aggregate>,
}

/// Evaluate rules in order, failing on the first error.
///
/// Every rule is resolved before any traversal runs.
pub fn aggregate_all(
    observations: &[Observation],
    rules: &[AggregateRule],
    defaults: &AggregationDefaults,
) -> Result<Vec<RuleOutput>> {
    let resolved = rules
        .iter()
        .map(|rule| Ok((rule, rule.function()?, rule.resolve(defaults)?)))
        .collect::<Result<Vec<_>>>()?;

    let mut outputs = Vec::with_capacity(resolved.len());
    for (rule, function, spec) in resolved {
        let aggregates = function.run(observations, &spec)?;
        debug!(
            group = %rule.group,
            function = %function,
            windows = aggregates.len(),
            "Evaluated aggregate rule"
        );
        outputs.push(RuleOutput {
            group: rule.group.clone(),
            aggregates,
        });
    }
    Ok(outputs)
}
