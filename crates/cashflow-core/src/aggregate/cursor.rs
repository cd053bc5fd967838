//! Steppable calendar pointer used by window traversal

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::TimeZoneType;

/// Canonical date format used for comparisons and error context
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Walks one calendar day at a time from a start date to an inclusive end date.
///
/// The cursor is bound to the observations' timezone but never converts
/// between zones: dates are plain calendar days, so a step is always exactly
/// one day regardless of DST transitions.
#[derive(Debug, Clone)]
pub struct DateCursor {
    current: NaiveDate,
    end: NaiveDate,
    time_zone: String,
    time_zone_type: TimeZoneType,
}

impl DateCursor {
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        time_zone: impl Into<String>,
        time_zone_type: TimeZoneType,
    ) -> Self {
        Self {
            current: start,
            end,
            time_zone: time_zone.into(),
            time_zone_type,
        }
    }

    pub fn current(&self) -> NaiveDate {
        self.current
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn time_zone(&self) -> &str {
        &self.time_zone
    }

    pub fn time_zone_type(&self) -> TimeZoneType {
        self.time_zone_type
    }

    /// Current date as `YYYY-MM-DD`
    pub fn date_string(&self) -> String {
        self.current.format(DATE_FORMAT).to_string()
    }

    /// Advance one day. Returns false once the new date is past the end date.
    pub fn step_forward(&mut self) -> Result<bool> {
        self.current = self.current.succ_opt().ok_or_else(|| {
            Error::DateOutOfRange(format!("no calendar day after {}", self.date_string()))
        })?;
        Ok(self.current <= self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_steps_through_inclusive_range() {
        let mut cursor = DateCursor::new(
            date(2020, 2, 27),
            date(2020, 3, 1),
            "UTC",
            TimeZoneType::Utc,
        );

        let mut seen = vec![cursor.date_string()];
        while cursor.step_forward().unwrap() {
            seen.push(cursor.date_string());
        }

        assert_eq!(
            seen,
            vec!["2020-02-27", "2020-02-28", "2020-02-29", "2020-03-01"]
        );
        // The failed step still moved the cursor
        assert_eq!(cursor.current(), date(2020, 3, 2));
    }

    #[test]
    fn test_single_day_range() {
        let mut cursor = DateCursor::new(
            date(2021, 12, 31),
            date(2021, 12, 31),
            "America/Chicago",
            TimeZoneType::Local,
        );
        assert_eq!(cursor.time_zone(), "America/Chicago");
        assert_eq!(cursor.time_zone_type(), TimeZoneType::Local);
        assert_eq!(cursor.end(), date(2021, 12, 31));
        assert!(!cursor.step_forward().unwrap());
        assert_eq!(cursor.date_string(), "2022-01-01");
    }

    #[test]
    fn test_step_past_max_date_errors() {
        let mut cursor =
            DateCursor::new(NaiveDate::MAX, NaiveDate::MAX, "UTC", TimeZoneType::Utc);
        assert!(matches!(
            cursor.step_forward(),
            Err(Error::DateOutOfRange(_))
        ));
    }
}
