//! Observation and rule import
//!
//! Observations arrive either as a JSON array of objects or as CSV with a
//! `dateStart,timeZone,timeZoneType` header followed by numeric columns.

use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Observation, TimeZoneType};
use crate::rules::AggregateRule;

const DATE_COLUMN: &str = "dateStart";
const TIME_ZONE_COLUMN: &str = "timeZone";
const TIME_ZONE_TYPE_COLUMN: &str = "timeZoneType";

/// Parse a JSON array of observations
pub fn parse_json<R: Read>(reader: R) -> Result<Vec<Observation>> {
    let observations: Vec<Observation> = serde_json::from_reader(reader)?;
    debug!("Parsed {} JSON observations", observations.len());
    Ok(observations)
}

/// Parse observations from CSV.
///
/// Every column besides the three fixed ones becomes a numeric field named
/// after its header. Empty cells leave the field undefined.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Observation>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let date_idx = column(&headers, DATE_COLUMN)?;
    let tz_idx = column(&headers, TIME_ZONE_COLUMN)?;
    let tz_type_idx = column(&headers, TIME_ZONE_TYPE_COLUMN)?;

    let mut observations = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = i + 2;

        let date = parse_date(field(&record, date_idx, DATE_COLUMN, line)?, line)?;
        let time_zone = field(&record, tz_idx, TIME_ZONE_COLUMN, line)?;
        let time_zone_type = field(&record, tz_type_idx, TIME_ZONE_TYPE_COLUMN, line)?
            .parse::<TimeZoneType>()
            .map_err(|e| Error::InvalidData(format!("line {}: {}", line, e)))?;

        let mut observation = Observation::new(date, time_zone, time_zone_type);

        for (idx, header) in headers.iter().enumerate() {
            if idx == date_idx || idx == tz_idx || idx == tz_type_idx {
                continue;
            }
            let raw = record.get(idx).unwrap_or("");
            if raw.is_empty() {
                continue;
            }
            let value = parse_number(raw).ok_or_else(|| {
                Error::InvalidData(format!(
                    "line {}: column '{}' is not a number: {}",
                    line, header, raw
                ))
            })?;
            observation = observation.with_value(header, value);
        }

        observations.push(observation);
    }

    debug!("Parsed {} CSV observations", observations.len());
    Ok(observations)
}

/// Parse a JSON array of aggregate rules
pub fn parse_rules<R: Read>(reader: R) -> Result<Vec<AggregateRule>> {
    let rules: Vec<AggregateRule> = serde_json::from_reader(reader)?;
    debug!("Parsed {} aggregate rules", rules.len());
    Ok(rules)
}

fn column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| Error::InvalidData(format!("CSV is missing the '{}' column", name)))
}

fn field<'r>(record: &'r StringRecord, idx: usize, name: &str, line: usize) -> Result<&'r str> {
    record
        .get(idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidData(format!("line {}: missing {}", line, name)))
}

fn parse_date(s: &str, line: usize) -> Result<NaiveDate> {
    // Accept full timestamps by keeping only the calendar date
    let day = s.split('T').next().unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| Error::InvalidData(format!("line {}: unable to parse date: {}", line, s)))
}

/// Parse a numeric cell, tolerating currency formatting like `$1,200.50`
/// and `(45.00)`
fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
