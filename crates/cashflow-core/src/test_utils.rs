//! Observation builders for tests

use chrono::NaiveDate;

use crate::models::{Observation, TimeZoneType};

/// Parse a `YYYY-MM-DD` literal
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

/// One `balanceEnding` observation in the given timezone
pub fn balance(day: &str, value: f64, time_zone: &str, time_zone_type: TimeZoneType) -> Observation {
    Observation::new(date(day), time_zone, time_zone_type).with_value("balanceEnding", value)
}

/// UTC `balanceEnding` observations from (date, value) pairs
pub fn observations(rows: &[(&str, f64)]) -> Vec<Observation> {
    rows.iter()
        .map(|(day, value)| balance(day, *value, "UTC", TimeZoneType::Utc))
        .collect()
}
