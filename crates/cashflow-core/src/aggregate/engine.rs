//! Window traversal
//!
//! Walks a [`DateCursor`] one day at a time across the observation range,
//! feeding same-dated observations to a [`Reducer`] and sealing an
//! [`Aggregate`] whenever the open window reaches its term date (or the
//! observations run out). Exactly one aggregate is live at a time.

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::boundary::{PeriodicWindow, WindowBoundary};
use super::cursor::{DateCursor, DATE_FORMAT};
use super::reducers::Reducer;
use crate::error::{Error, Result};
use crate::models::{Aggregate, DateSet, Observation, WindowSpec};

/// Check the input contract before any traversal starts: a non-empty,
/// date-sorted sequence sharing one timezone.
pub fn validate_observations(observations: &[Observation]) -> Result<()> {
    let first = observations
        .first()
        .ok_or_else(|| Error::InvalidData("observation sequence is empty".to_string()))?;

    for (index, obs) in observations.iter().enumerate() {
        if obs.time_zone != first.time_zone || obs.time_zone_type != first.time_zone_type {
            return Err(Error::InvalidData(format!(
                "observation {} is in {} ({}), expected {} ({})",
                index, obs.time_zone, obs.time_zone_type, first.time_zone, first.time_zone_type
            )));
        }
    }

    if let Some(index) = observations
        .windows(2)
        .position(|pair| pair[1].date_start < pair[0].date_start)
    {
        return Err(Error::InvalidData(format!(
            "observations are not sorted by date: {} follows {} at index {}",
            observations[index + 1].date_start,
            observations[index].date_start,
            index + 1
        )));
    }

    Ok(())
}

/// Partition `observations` into windows and reduce each one.
///
/// Validates the observation sequence and window parameters first, so
/// configuration and data errors surface before traversal begins. Errors
/// raised during traversal are wrapped in [`Error::Traversal`].
pub fn aggregate<R: Reducer>(
    observations: &[Observation],
    spec: &WindowSpec,
    boundary: &WindowBoundary,
    reducer: &R,
) -> Result<Vec<Aggregate>> {
    boundary.validate()?;
    validate_observations(observations)?;

    let mut state = WindowState::new(observations, spec, reducer);
    match boundary {
        WindowBoundary::Periodic(window) => state.run_periodic(window)?,
        WindowBoundary::DateSets(sets) => state.run_date_sets(sets)?,
    }

    if let Some(stalled) = observations.get(state.next) {
        warn!(
            group = %spec.group,
            property = %spec.property_key,
            date = %stalled.date_start,
            remaining = observations.len() - state.next,
            "Traversal ended with unconsumed observations"
        );
    }

    debug!(
        group = %spec.group,
        kind = %reducer.kind(),
        windows = state.sealed.len(),
        consumed = state.next,
        "Aggregation complete"
    );

    Ok(state.sealed)
}

/// Mutable traversal state: the observation pointer, the live aggregate
/// and its transient accumulator, and everything sealed so far.
struct WindowState<'a, R: Reducer> {
    observations: &'a [Observation],
    spec: &'a WindowSpec,
    reducer: &'a R,
    next: usize,
    aggregate: Aggregate,
    transient: R::Transient,
    sealed: Vec<Aggregate>,
}

impl<'a, R: Reducer> WindowState<'a, R> {
    fn new(observations: &'a [Observation], spec: &'a WindowSpec, reducer: &'a R) -> Self {
        let start = observations
            .first()
            .map(|obs| obs.date_start)
            .unwrap_or_default();
        Self {
            observations,
            spec,
            reducer,
            next: 0,
            aggregate: Aggregate::open(
                spec.group.clone(),
                reducer.kind(),
                start,
                reducer.empty_values(),
            ),
            transient: R::Transient::default(),
            sealed: Vec::new(),
        }
    }

    fn cursor(&self, start: NaiveDate, end: NaiveDate) -> DateCursor {
        let first = &self.observations[0];
        let cursor = DateCursor::new(start, end, first.time_zone.clone(), first.time_zone_type);
        debug!(
            group = %self.spec.group,
            start = %cursor.date_string(),
            end = %cursor.end(),
            time_zone = cursor.time_zone(),
            time_zone_type = %cursor.time_zone_type(),
            "Opened date cursor"
        );
        cursor
    }

    fn exhausted(&self) -> bool {
        self.next >= self.observations.len()
    }

    fn event_count(&self) -> u64 {
        self.aggregate.event_count
    }

    /// Replace the live aggregate with a fresh one starting on `start`
    fn open(&mut self, start: NaiveDate) {
        self.aggregate = Aggregate::open(
            self.spec.group.clone(),
            self.reducer.kind(),
            start,
            self.reducer.empty_values(),
        );
        self.reducer
            .init(&mut self.aggregate, &mut self.transient, &self.spec.tuning);
    }

    /// Feed every unconsumed observation dated `date`.
    ///
    /// Stops at the first observation without the property: the pointer
    /// does not move past it, so later observations stay unconsumed.
    fn feed(&mut self, date: NaiveDate) -> Result<()> {
        while let Some(obs) = self.observations.get(self.next) {
            if obs.date_start != date {
                break;
            }
            let Some(value) = obs.value(&self.spec.property_key) else {
                break;
            };
            self.reducer.event_process(
                &mut self.aggregate,
                value,
                &mut self.transient,
                self.spec.flow_direction,
            )?;
            self.next += 1;
        }
        Ok(())
    }

    /// Finalize the live aggregate, ending it on `date`, and append it
    fn seal(&mut self, date: NaiveDate) -> Result<()> {
        self.reducer
            .list_process(&mut self.aggregate, &mut self.transient, &self.spec.tuning)?;
        self.aggregate.date_end = date;
        self.sealed.push(self.aggregate.clone());
        Ok(())
    }

    fn context(&self, date: NaiveDate, source: Error) -> Error {
        match source {
            Error::Traversal { .. } => source,
            source => Error::Traversal {
                group: self.spec.group.clone(),
                date: date.format(DATE_FORMAT).to_string(),
                index: self.next,
                source: Box::new(source),
            },
        }
    }

    /// Back-to-back windows from the anchor to the last observation's date
    fn run_periodic(&mut self, window: &PeriodicWindow) -> Result<()> {
        let first = self.observations[0].date_start;
        let last = self.observations[self.observations.len() - 1].date_start;

        let start = window
            .anchor(first)
            .map_err(|e| self.context(first, e))?;
        let mut term = window
            .term_date(start)
            .map_err(|e| self.context(start, e))?;

        let mut cursor = self.cursor(start, last);
        self.open(start);

        loop {
            let date = cursor.current();
            self.step_periodic(window, date, &mut term)
                .map_err(|e| self.context(date, e))?;
            if !cursor.step_forward().map_err(|e| self.context(date, e))? {
                break;
            }
        }
        Ok(())
    }

    fn step_periodic(
        &mut self,
        window: &PeriodicWindow,
        date: NaiveDate,
        term: &mut NaiveDate,
    ) -> Result<()> {
        self.feed(date)?;

        if date == *term && self.event_count() == 0 {
            // Nothing landed in this window: roll it forward instead of emitting it
            let start = next_day(*term)?;
            *term = window.next_term_date(*term)?;
            self.aggregate.date_start = start;
            self.aggregate.date_end = start;
        } else if self.event_count() > 0 && (date >= *term || self.exhausted()) {
            self.seal(date)?;
            if !self.exhausted() {
                let start = next_day(*term)?;
                *term = window.next_term_date(*term)?;
                self.open(start);
            }
        }
        Ok(())
    }

    /// Caller-defined windows, in order, sharing one observation pointer
    fn run_date_sets(&mut self, sets: &[DateSet]) -> Result<()> {
        for set in sets {
            // Observations dated before this window belong to no window
            while self
                .observations
                .get(self.next)
                .is_some_and(|obs| obs.date_start < set.date_start)
            {
                self.next += 1;
            }
            if self.exhausted() {
                break;
            }

            let mut cursor = self.cursor(set.date_start, set.date_end);
            self.open(set.date_start);

            loop {
                let date = cursor.current();
                self.feed(date).map_err(|e| self.context(date, e))?;
                if self.event_count() > 0 && (date >= set.date_end || self.exhausted()) {
                    self.seal(date).map_err(|e| self.context(date, e))?;
                    break;
                }
                if !cursor.step_forward().map_err(|e| self.context(date, e))? {
                    break;
                }
            }
        }
        Ok(())
    }
}

fn next_day(date: NaiveDate) -> Result<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| Error::DateOutOfRange(format!("no calendar day after {}", date)))
}
