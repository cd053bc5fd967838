//! Pluggable per-window statistics
//!
//! Every reducer follows the same three-step protocol:
//! - `init` resets the aggregate's fields and the transient accumulator when a window opens
//! - `event_process` applies the flow-direction filter and folds in one admitted value
//! - `list_process` finalizes the statistic when the window closes
//!
//! The transient accumulator is private to one open window and replaced on
//! the next `init`; callers only ever see the sealed [`Aggregate`].

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::models::{Aggregate, AggregateType, AggregateValues, FlowDirection, Tuning};

/// Accumulate/finalize pair implementing one statistic
pub trait Reducer {
    /// Window-scoped scratch state
    type Transient: Default;

    fn kind(&self) -> AggregateType;

    /// Reducer fields of a freshly opened aggregate
    fn empty_values(&self) -> AggregateValues;

    /// Reset state for a newly opened window
    fn init(&self, aggregate: &mut Aggregate, transient: &mut Self::Transient, _tuning: &Tuning) {
        aggregate.values = self.empty_values();
        *transient = Self::Transient::default();
    }

    /// Feed one observation value. Values rejected by `flow` are ignored
    /// and do not count as events.
    fn event_process(
        &self,
        aggregate: &mut Aggregate,
        value: f64,
        transient: &mut Self::Transient,
        flow: FlowDirection,
    ) -> Result<()> {
        match flow.admit(value) {
            Some(admitted) => {
                aggregate.event_count += 1;
                self.accumulate(aggregate, admitted, transient)
            }
            None => Ok(()),
        }
    }

    /// Fold an admitted value into the window
    fn accumulate(
        &self,
        aggregate: &mut Aggregate,
        value: f64,
        transient: &mut Self::Transient,
    ) -> Result<()>;

    /// Finalize the window's statistics before it is sealed
    fn list_process(
        &self,
        aggregate: &mut Aggregate,
        transient: &mut Self::Transient,
        tuning: &Tuning,
    ) -> Result<()>;
}

fn mismatch(expected: AggregateType, actual: AggregateType) -> Error {
    Error::Computation(format!(
        "{} reducer applied to a {} aggregate",
        expected, actual
    ))
}

fn kind_of(values: &AggregateValues) -> AggregateType {
    match values {
        AggregateValues::SumsAndAverages { .. } => AggregateType::SumsAndAverages,
        AggregateValues::MinimumsAndMaximums { .. } => AggregateType::MinimumsAndMaximums,
        AggregateValues::MediansAndModes { .. } => AggregateType::MediansAndModes,
        AggregateValues::GreatestValues { .. } => AggregateType::GreatestValues,
        AggregateValues::LeastValues { .. } => AggregateType::LeastValues,
    }
}

// ========== Sums and Averages ==========

#[derive(Debug, Clone, Copy, Default)]
pub struct SumsAndAverages;

impl Reducer for SumsAndAverages {
    type Transient = ();

    fn kind(&self) -> AggregateType {
        AggregateType::SumsAndAverages
    }

    fn empty_values(&self) -> AggregateValues {
        AggregateValues::SumsAndAverages {
            sum: 0.0,
            average: 0.0,
        }
    }

    fn accumulate(&self, aggregate: &mut Aggregate, value: f64, _: &mut ()) -> Result<()> {
        match &mut aggregate.values {
            AggregateValues::SumsAndAverages { sum, .. } => {
                *sum += value;
                Ok(())
            }
            other => Err(mismatch(self.kind(), kind_of(other))),
        }
    }

    fn list_process(&self, aggregate: &mut Aggregate, _: &mut (), _: &Tuning) -> Result<()> {
        let count = aggregate.event_count;
        match &mut aggregate.values {
            AggregateValues::SumsAndAverages { sum, average } => {
                if !sum.is_finite() {
                    return Err(Error::Computation(format!(
                        "sum is not finite after {} events",
                        count
                    )));
                }
                *average = *sum / count as f64;
                Ok(())
            }
            other => Err(mismatch(self.kind(), kind_of(other))),
        }
    }
}

// ========== Minimums and Maximums ==========

#[derive(Debug, Clone, Copy, Default)]
pub struct MinimumsAndMaximums;

impl Reducer for MinimumsAndMaximums {
    type Transient = ();

    fn kind(&self) -> AggregateType {
        AggregateType::MinimumsAndMaximums
    }

    fn empty_values(&self) -> AggregateValues {
        AggregateValues::MinimumsAndMaximums {
            minimum: None,
            maximum: None,
        }
    }

    fn accumulate(&self, aggregate: &mut Aggregate, value: f64, _: &mut ()) -> Result<()> {
        match &mut aggregate.values {
            AggregateValues::MinimumsAndMaximums { minimum, maximum } => {
                *minimum = Some(minimum.map_or(value, |m| m.min(value)));
                *maximum = Some(maximum.map_or(value, |m| m.max(value)));
                Ok(())
            }
            other => Err(mismatch(self.kind(), kind_of(other))),
        }
    }

    fn list_process(&self, _: &mut Aggregate, _: &mut (), _: &Tuning) -> Result<()> {
        Ok(())
    }
}

// ========== Medians and Modes ==========

/// A mode candidate and how many values landed in it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeBucket {
    pub value: f64,
    pub frequency: u32,
}

#[derive(Debug, Default)]
pub struct MedianModeTransient {
    x_percent_range: f64,
    values: Vec<f64>,
    buckets: Vec<ModeBucket>,
}

impl MedianModeTransient {
    /// Record a value in the median list and the mode buckets.
    ///
    /// An exact match bumps the existing bucket. A match within
    /// `x_percent_range` percent of a bucket bumps that bucket and also
    /// counts toward the new value's own bucket.
    fn push(&mut self, value: f64) {
        self.values.push(value);

        let tolerance = self.x_percent_range / 100.0;
        let mut exact = false;
        let mut own_frequency = 1;
        for bucket in &mut self.buckets {
            if bucket.value == value {
                bucket.frequency += 1;
                exact = true;
            } else if tolerance > 0.0 && (bucket.value - value).abs() <= bucket.value.abs() * tolerance
            {
                bucket.frequency += 1;
                own_frequency += 1;
            }
        }

        if !exact {
            self.buckets.push(ModeBucket {
                value,
                frequency: own_frequency,
            });
        }
    }

    pub fn buckets(&self) -> &[ModeBucket] {
        &self.buckets
    }
}

/// Positional median of the window's values.
///
/// Indices into the ascending list are zero-based: an odd count `n` picks
/// index `ceil(n/2)`, an even count picks `n/2` and `n/2 + 1`, so the pick
/// sits just above the midpoint. Fewer than three values yield no median.
pub fn medians(values: &[f64]) -> Vec<f64> {
    let len = values.len();
    if len <= 2 {
        return Vec::new();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut picked = if len % 2 == 1 {
        vec![sorted[len.div_ceil(2)]]
    } else {
        vec![sorted[len / 2], sorted[len / 2 + 1]]
    };
    picked.sort_by(f64::total_cmp);
    picked
}

/// Most frequent bucket values, at most `mode_max` of them.
///
/// Needs at least three buckets, and a flat distribution (every bucket tied)
/// has no mode. Ties at the top frequency keep insertion order.
pub fn modes(buckets: &[ModeBucket], mode_max: usize) -> Vec<f64> {
    if buckets.len() < 3 {
        return Vec::new();
    }

    let mut ranked = buckets.to_vec();
    ranked.sort_by(|a, b| b.frequency.cmp(&a.frequency));

    let top = ranked[0].frequency;
    if ranked.iter().all(|b| b.frequency == top) {
        return Vec::new();
    }

    ranked
        .iter()
        .take_while(|b| b.frequency == top)
        .take(mode_max)
        .map(|b| b.value)
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MediansAndModes;

impl Reducer for MediansAndModes {
    type Transient = MedianModeTransient;

    fn kind(&self) -> AggregateType {
        AggregateType::MediansAndModes
    }

    fn empty_values(&self) -> AggregateValues {
        AggregateValues::MediansAndModes {
            medians: Vec::new(),
            modes: Vec::new(),
        }
    }

    fn init(&self, aggregate: &mut Aggregate, transient: &mut MedianModeTransient, tuning: &Tuning) {
        aggregate.values = self.empty_values();
        *transient = MedianModeTransient {
            x_percent_range: tuning.x_percent_range,
            ..Default::default()
        };
    }

    fn accumulate(
        &self,
        _: &mut Aggregate,
        value: f64,
        transient: &mut MedianModeTransient,
    ) -> Result<()> {
        transient.push(value);
        Ok(())
    }

    fn list_process(
        &self,
        aggregate: &mut Aggregate,
        transient: &mut MedianModeTransient,
        tuning: &Tuning,
    ) -> Result<()> {
        match &mut aggregate.values {
            AggregateValues::MediansAndModes {
                medians: median_values,
                modes: mode_values,
            } => {
                *median_values = medians(&transient.values);
                *mode_values = modes(&transient.buckets, tuning.mode_max);
                Ok(())
            }
            other => Err(mismatch(self.kind(), kind_of(other))),
        }
    }
}

// ========== Greatest and Least Values ==========

/// Distinct admitted values of the open window
#[derive(Debug, Default)]
pub struct DistinctValues {
    values: Vec<f64>,
}

impl DistinctValues {
    fn insert(&mut self, value: f64) {
        if !self.values.contains(&value) {
            self.values.push(value);
        }
    }
}

/// Top `limit` distinct values, or the bottom `limit` when `least` is set.
///
/// Ranking compares signed values, not absolute values: under BOTH a
/// large outflow such as -500 ranks below 10 for greatest. NEGATIVE flow
/// admits absolute values, so there the ranking is by outflow size.
pub fn select_values(values: &[f64], limit: usize, least: bool) -> Vec<f64> {
    let mut ranked = values.to_vec();
    let order: fn(&f64, &f64) -> Ordering = if least {
        f64::total_cmp
    } else {
        |a, b| b.total_cmp(a)
    };
    ranked.sort_by(order);
    ranked.truncate(limit);
    ranked
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GreatestValues;

impl Reducer for GreatestValues {
    type Transient = DistinctValues;

    fn kind(&self) -> AggregateType {
        AggregateType::GreatestValues
    }

    fn empty_values(&self) -> AggregateValues {
        AggregateValues::GreatestValues {
            greatest_values: Vec::new(),
        }
    }

    fn accumulate(&self, _: &mut Aggregate, value: f64, transient: &mut DistinctValues) -> Result<()> {
        transient.insert(value);
        Ok(())
    }

    fn list_process(
        &self,
        aggregate: &mut Aggregate,
        transient: &mut DistinctValues,
        tuning: &Tuning,
    ) -> Result<()> {
        match &mut aggregate.values {
            AggregateValues::GreatestValues { greatest_values } => {
                *greatest_values =
                    select_values(&transient.values, tuning.selection_limit, tuning.reverse);
                Ok(())
            }
            other => Err(mismatch(self.kind(), kind_of(other))),
        }
    }
}

/// Greatest-values selection with the comparator inverted
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastValues;

impl Reducer for LeastValues {
    type Transient = DistinctValues;

    fn kind(&self) -> AggregateType {
        AggregateType::LeastValues
    }

    fn empty_values(&self) -> AggregateValues {
        AggregateValues::LeastValues {
            least_values: Vec::new(),
        }
    }

    fn accumulate(&self, _: &mut Aggregate, value: f64, transient: &mut DistinctValues) -> Result<()> {
        transient.insert(value);
        Ok(())
    }

    fn list_process(
        &self,
        aggregate: &mut Aggregate,
        transient: &mut DistinctValues,
        tuning: &Tuning,
    ) -> Result<()> {
        match &mut aggregate.values {
            AggregateValues::LeastValues { least_values } => {
                *least_values =
                    select_values(&transient.values, tuning.selection_limit, !tuning.reverse);
                Ok(())
            }
            other => Err(mismatch(self.kind(), kind_of(other))),
        }
    }
}
