//! Data models for cashflow

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::AggregationDefaults;

// ========== Observation Models ==========

/// How an observation's `timeZone` should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeZoneType {
    Local,
    Utc,
}

impl TimeZoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::Utc => "UTC",
        }
    }
}

impl fmt::Display for TimeZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeZoneType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOCAL" => Ok(Self::Local),
            "UTC" => Ok(Self::Utc),
            _ => Err(format!("Unknown time zone type: {} (valid: LOCAL, UTC)", s)),
        }
    }
}

/// A single dated record produced by rule expansion.
///
/// Besides the date and timezone, an observation carries arbitrary named
/// fields (`balanceEnding`, `amount`, ...). A field that is absent, null or
/// non-numeric is treated as undefined for that observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub date_start: NaiveDate,
    pub time_zone: String,
    pub time_zone_type: TimeZoneType,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Observation {
    pub fn new(
        date_start: NaiveDate,
        time_zone: impl Into<String>,
        time_zone_type: TimeZoneType,
    ) -> Self {
        Self {
            date_start,
            time_zone: time_zone.into(),
            time_zone_type,
            fields: BTreeMap::new(),
        }
    }

    /// Set a numeric field
    pub fn with_value(mut self, key: impl Into<String>, value: f64) -> Self {
        self.fields.insert(key.into(), serde_json::Value::from(value));
        self
    }

    /// Numeric value of `key`, or None when the field is undefined
    pub fn value(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(serde_json::Value::as_f64)
    }
}

// ========== Window Selection Models ==========

/// Which observations a reducer admits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlowDirection {
    /// Values > 0, used as-is
    Positive,
    /// Values < 0, used as their absolute value
    Negative,
    /// Any non-zero value, signed
    #[default]
    Both,
}

impl FlowDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::Negative => "NEGATIVE",
            Self::Both => "BOTH",
        }
    }

    /// Apply the direction filter, returning the value to accumulate
    pub fn admit(&self, value: f64) -> Option<f64> {
        match self {
            Self::Positive if value > 0.0 => Some(value),
            Self::Negative if value < 0.0 => Some(value.abs()),
            Self::Both if value != 0.0 => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FlowDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "POSITIVE" => Ok(Self::Positive),
            "NEGATIVE" => Ok(Self::Negative),
            "BOTH" => Ok(Self::Both),
            _ => Err(format!(
                "Unknown flow direction: {} (valid: POSITIVE, NEGATIVE, BOTH)",
                s
            )),
        }
    }
}

/// Rule cadence. Only the windowing cadences have aggregate functions;
/// `Once` and `Daily` are accepted so that rule files parse, but the
/// selector resolves nothing for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Once,
    Daily,
    Weekly,
    Monthly,
    Annually,
    DayCycles,
    DateSets,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Once => "ONCE",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Annually => "ANNUALLY",
            Self::DayCycles => "DAY_CYCLES",
            Self::DateSets => "DATE_SETS",
        }
    }

    pub fn all() -> &'static [Frequency] {
        &[
            Self::Once,
            Self::Daily,
            Self::Weekly,
            Self::Monthly,
            Self::Annually,
            Self::DayCycles,
            Self::DateSets,
        ]
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "ONCE" => Ok(Self::Once),
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "ANNUALLY" | "YEARLY" => Ok(Self::Annually),
            "DAY_CYCLES" => Ok(Self::DayCycles),
            "DATE_SETS" => Ok(Self::DateSets),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

/// Statistic computed per window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregateType {
    SumsAndAverages,
    MinimumsAndMaximums,
    MediansAndModes,
    GreatestValues,
    LeastValues,
}

impl AggregateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SumsAndAverages => "sumsAndAverages",
            Self::MinimumsAndMaximums => "minimumsAndMaximums",
            Self::MediansAndModes => "mediansAndModes",
            Self::GreatestValues => "greatestValues",
            Self::LeastValues => "leastValues",
        }
    }

    pub fn all() -> &'static [AggregateType] {
        &[
            Self::SumsAndAverages,
            Self::MinimumsAndMaximums,
            Self::MediansAndModes,
            Self::GreatestValues,
            Self::LeastValues,
        ]
    }
}

impl fmt::Display for AggregateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AggregateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown aggregate type: {}", s))
    }
}

/// A caller-defined window for `DATE_SETS` aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateSet {
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
}

/// Reducer tuning knobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    /// How many values greatest/least selection keeps
    pub selection_limit: usize,
    /// Maximum number of modes reported
    pub mode_max: usize,
    /// Percentage tolerance for mode bucket matching
    pub x_percent_range: f64,
    /// Flip greatest/least selection
    pub reverse: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        AggregationDefaults::default().tuning()
    }
}

/// Fully resolved, immutable parameters for one aggregation call.
///
/// Built from an [`AggregateRule`](crate::rules::AggregateRule) plus
/// configuration defaults; see `AggregateRule::resolve`.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub group: String,
    pub property_key: String,
    pub flow_direction: FlowDirection,
    pub weekday_start: Weekday,
    pub day_cycles: u32,
    pub cycle_date_start: Option<NaiveDate>,
    pub fiscal_year_start: Option<crate::aggregate::FiscalYearStart>,
    pub date_sets: Vec<DateSet>,
    pub tuning: Tuning,
}

impl WindowSpec {
    /// Spec with default window parameters for a property
    pub fn new(group: impl Into<String>, property_key: impl Into<String>) -> Self {
        let defaults = AggregationDefaults::default();
        Self {
            group: group.into(),
            property_key: property_key.into(),
            flow_direction: FlowDirection::Both,
            weekday_start: defaults.weekday_start,
            day_cycles: defaults.day_cycles,
            cycle_date_start: None,
            fiscal_year_start: None,
            date_sets: Vec::new(),
            tuning: defaults.tuning(),
        }
    }

    pub fn with_flow_direction(mut self, flow_direction: FlowDirection) -> Self {
        self.flow_direction = flow_direction;
        self
    }

    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }
}

// ========== Aggregate Models ==========

/// Reducer-specific fields of an aggregate record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum AggregateValues {
    SumsAndAverages {
        sum: f64,
        average: f64,
    },
    MinimumsAndMaximums {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    MediansAndModes {
        medians: Vec<f64>,
        modes: Vec<f64>,
    },
    GreatestValues {
        greatest_values: Vec<f64>,
    },
    LeastValues {
        least_values: Vec<f64>,
    },
}

/// Summary statistics for one window of observations
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub group: String,
    #[serde(rename = "type")]
    pub kind: AggregateType,
    pub event_count: u64,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    #[serde(flatten)]
    pub values: AggregateValues,
}

impl Aggregate {
    /// Open a window starting (and, until sealed, ending) on `date_start`
    pub fn open(
        group: impl Into<String>,
        kind: AggregateType,
        date_start: NaiveDate,
        values: AggregateValues,
    ) -> Self {
        Self {
            group: group.into(),
            kind,
            event_count: 0,
            date_start,
            date_end: date_start,
            values,
        }
    }

    pub fn sum(&self) -> Option<f64> {
        match self.values {
            AggregateValues::SumsAndAverages { sum, .. } => Some(sum),
            _ => None,
        }
    }

    pub fn average(&self) -> Option<f64> {
        match self.values {
            AggregateValues::SumsAndAverages { average, .. } => Some(average),
            _ => None,
        }
    }
}
