//! Window boundary strategies
//!
//! A strategy answers two questions: where does the first window start
//! (the anchor, derived from the first observation's date), and on which
//! date does a window that starts on a given day close (its term date).
//! The next window always starts the day after the previous term date.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

use crate::error::{Error, Result};
use crate::models::DateSet;

/// First day of a fiscal year, written `MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiscalYearStart {
    month: u32,
    day: u32,
}

impl FiscalYearStart {
    pub fn new(month: u32, day: u32) -> Result<Self> {
        // 2000 is a leap year, so 02-29 is accepted here and clamped per year
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            return Err(Error::Config(format!(
                "Invalid fiscal year start: {:02}-{:02}",
                month, day
            )));
        }
        Ok(Self { month, day })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// The fiscal boundary falling in `year`, clamped to the month's last day
    pub fn in_year(&self, year: i32) -> Result<NaiveDate> {
        let day = self.day.min(days_in_month(year, self.month)?);
        NaiveDate::from_ymd_opt(year, self.month, day).ok_or_else(|| {
            Error::DateOutOfRange(format!("fiscal year start {} in year {}", self, year))
        })
    }
}

impl fmt::Display for FiscalYearStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

impl FromStr for FiscalYearStart {
    type Err = Error;

    /// Accepts `MM-DD`, or a full `YYYY-MM-DD` date whose year is ignored
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Config(format!("Invalid fiscal year start: {} (use MM-DD)", s));
        let parts: Vec<&str> = s.trim().split('-').collect();
        let (month, day) = match parts.as_slice() {
            [m, d] | [_, m, d] => (m, d),
            _ => return Err(invalid()),
        };
        let month = month.parse().map_err(|_| invalid())?;
        let day = day.parse().map_err(|_| invalid())?;
        Self::new(month, day)
    }
}

/// Strategies that tile the calendar with back-to-back windows
#[derive(Debug, Clone, PartialEq)]
pub enum PeriodicWindow {
    /// Calendar or fiscal years
    Annual {
        fiscal_year_start: Option<FiscalYearStart>,
    },
    /// Calendar months
    Monthly,
    /// Seven-day weeks beginning on `weekday_start`
    Weekly { weekday_start: Weekday },
    /// Fixed-length cycles, optionally aligned to `cycle_date_start`
    DayCycle {
        day_cycles: u32,
        cycle_date_start: Option<NaiveDate>,
    },
}

impl PeriodicWindow {
    /// Start of the first window, given the first observation's date
    pub fn anchor(&self, first: NaiveDate) -> Result<NaiveDate> {
        match self {
            Self::Annual {
                fiscal_year_start: None,
            } => year_start(first.year()),
            Self::Annual {
                fiscal_year_start: Some(fiscal),
            } => {
                let boundary = fiscal.in_year(first.year())?;
                if boundary > first {
                    fiscal.in_year(first.year() - 1)
                } else {
                    Ok(boundary)
                }
            }
            Self::Monthly => first.with_day(1).ok_or_else(|| out_of_range(first)),
            Self::Weekly { weekday_start } => {
                let back = (first.weekday().num_days_from_monday() + 7
                    - weekday_start.num_days_from_monday())
                    % 7;
                sub_days(first, back as u64)
            }
            Self::DayCycle {
                day_cycles,
                cycle_date_start,
            } => {
                let cycle = u64::from(*day_cycles);
                if cycle == 0 {
                    return Err(Error::Config("dayCycles must be at least 1".to_string()));
                }
                match cycle_date_start {
                    Some(start) if *start > first => {
                        // Whole cycles needed to step back to or before `first`
                        let gap = (*start - first).num_days() as u64;
                        let steps = gap.div_ceil(cycle);
                        sub_days(*start, steps * cycle)
                    }
                    Some(start) => Ok(*start),
                    None => Ok(first),
                }
            }
        }
    }

    /// Closing date of the window that starts on `start`
    pub fn term_date(&self, start: NaiveDate) -> Result<NaiveDate> {
        match self {
            Self::Annual {
                fiscal_year_start: None,
            } => pred(year_start(start.year() + 1)?),
            Self::Annual {
                fiscal_year_start: Some(fiscal),
            } => {
                let next = start
                    .checked_add_months(Months::new(12))
                    .ok_or_else(|| out_of_range(start))?;
                pred(fiscal.in_year(next.year())?)
            }
            Self::Monthly => {
                let first = start.with_day(1).ok_or_else(|| out_of_range(start))?;
                let next = first
                    .checked_add_months(Months::new(1))
                    .ok_or_else(|| out_of_range(start))?;
                pred(next)
            }
            Self::Weekly { .. } => add_days(start, 6),
            Self::DayCycle { day_cycles, .. } => {
                add_days(start, u64::from(day_cycles.saturating_sub(1)))
            }
        }
    }

    /// Term date of the window following the one that closed on `term`
    pub fn next_term_date(&self, term: NaiveDate) -> Result<NaiveDate> {
        self.term_date(add_days(term, 1)?)
    }
}

/// How observations are partitioned into windows
#[derive(Debug, Clone, PartialEq)]
pub enum WindowBoundary {
    Periodic(PeriodicWindow),
    /// Caller-supplied windows, processed in order
    DateSets(Vec<DateSet>),
}

impl WindowBoundary {
    pub fn annual(fiscal_year_start: Option<FiscalYearStart>) -> Self {
        Self::Periodic(PeriodicWindow::Annual { fiscal_year_start })
    }

    pub fn monthly() -> Self {
        Self::Periodic(PeriodicWindow::Monthly)
    }

    pub fn weekly(weekday_start: Weekday) -> Self {
        Self::Periodic(PeriodicWindow::Weekly { weekday_start })
    }

    pub fn day_cycle(day_cycles: u32, cycle_date_start: Option<NaiveDate>) -> Self {
        Self::Periodic(PeriodicWindow::DayCycle {
            day_cycles,
            cycle_date_start,
        })
    }

    /// Check parameters that can be validated without observations
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Periodic(PeriodicWindow::DayCycle { day_cycles: 0, .. }) => {
                Err(Error::Config("dayCycles must be at least 1".to_string()))
            }
            Self::DateSets(sets) if sets.is_empty() => Err(Error::Config(
                "DATE_SETS aggregation requires at least one date set".to_string(),
            )),
            Self::DateSets(sets) => {
                for set in sets {
                    if set.date_end < set.date_start {
                        return Err(Error::Config(format!(
                            "Date set ends before it starts: {} to {}",
                            set.date_start, set.date_end
                        )));
                    }
                }
                Ok(())
            }
            Self::Periodic(_) => Ok(()),
        }
    }
}

fn year_start(year: i32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| Error::DateOutOfRange(format!("January 1 of year {}", year)))
}

fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::DateOutOfRange(format!("{}-{:02}", year, month)))?;
    let next = first
        .checked_add_months(Months::new(1))
        .ok_or_else(|| out_of_range(first))?;
    Ok((next - first).num_days() as u32)
}

fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| out_of_range(date))
}

fn sub_days(date: NaiveDate, days: u64) -> Result<NaiveDate> {
    date.checked_sub_days(Days::new(days))
        .ok_or_else(|| out_of_range(date))
}

fn pred(date: NaiveDate) -> Result<NaiveDate> {
    date.pred_opt().ok_or_else(|| out_of_range(date))
}

fn out_of_range(date: NaiveDate) -> Error {
    Error::DateOutOfRange(format!("window arithmetic overflowed near {}", date))
}
