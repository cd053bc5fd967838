//! Maps a (frequency, type) pair to a window strategy and reducer

use std::fmt;

use tracing::debug;

use super::boundary::{PeriodicWindow, WindowBoundary};
use super::engine;
use super::reducers::{
    GreatestValues, LeastValues, MediansAndModes, MinimumsAndMaximums, SumsAndAverages,
};
use crate::error::Result;
use crate::models::{Aggregate, AggregateType, Frequency, Observation, WindowSpec};

/// Window granularity a frequency resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Annual,
    Monthly,
    Weekly,
    DayCycle,
    DateSet,
}

impl Granularity {
    /// Granularity for a rule frequency. `ONCE` and `DAILY` have none.
    pub fn for_frequency(frequency: Frequency) -> Option<Self> {
        match frequency {
            Frequency::Annually => Some(Self::Annual),
            Frequency::Monthly => Some(Self::Monthly),
            Frequency::Weekly => Some(Self::Weekly),
            Frequency::DayCycles => Some(Self::DayCycle),
            Frequency::DateSets => Some(Self::DateSet),
            Frequency::Once | Frequency::Daily => None,
        }
    }

    /// Build the concrete boundary strategy from the window parameters
    pub fn boundary(&self, spec: &WindowSpec) -> WindowBoundary {
        match self {
            Self::Annual => WindowBoundary::Periodic(PeriodicWindow::Annual {
                fiscal_year_start: spec.fiscal_year_start,
            }),
            Self::Monthly => WindowBoundary::Periodic(PeriodicWindow::Monthly),
            Self::Weekly => WindowBoundary::Periodic(PeriodicWindow::Weekly {
                weekday_start: spec.weekday_start,
            }),
            Self::DayCycle => WindowBoundary::Periodic(PeriodicWindow::DayCycle {
                day_cycles: spec.day_cycles,
                cycle_date_start: spec.cycle_date_start,
            }),
            Self::DateSet => WindowBoundary::DateSets(spec.date_sets.clone()),
        }
    }
}

/// A composed aggregation: one boundary strategy plus one reducer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateFunction {
    frequency: Frequency,
    granularity: Granularity,
    kind: AggregateType,
}

impl AggregateFunction {
    /// Resolve a (frequency, type) pair. Returns None when the frequency
    /// has no windowing strategy; callers should treat that as a
    /// configuration error.
    pub fn select(frequency: Frequency, kind: AggregateType) -> Option<Self> {
        let granularity = Granularity::for_frequency(frequency)?;
        debug!(%frequency, %kind, ?granularity, "Selected aggregate function");
        Some(Self {
            frequency,
            granularity,
            kind,
        })
    }

    /// Resolve by name, e.g. `("MONTHLY", "sumsAndAverages")`
    pub fn select_by_name(frequency: &str, kind: &str) -> Option<Self> {
        Self::select(frequency.parse().ok()?, kind.parse().ok()?)
    }

    /// Every pair the selector resolves
    pub fn all() -> Vec<Self> {
        Frequency::all()
            .iter()
            .flat_map(|f| AggregateType::all().iter().map(move |k| (*f, *k)))
            .filter_map(|(f, k)| Self::select(f, k))
            .collect()
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn kind(&self) -> AggregateType {
        self.kind
    }

    /// Run the traversal over `observations` with this function's strategy
    /// and reducer
    pub fn run(&self, observations: &[Observation], spec: &WindowSpec) -> Result<Vec<Aggregate>> {
        let boundary = self.granularity.boundary(spec);
        match self.kind {
            AggregateType::SumsAndAverages => {
                engine::aggregate(observations, spec, &boundary, &SumsAndAverages)
            }
            AggregateType::MinimumsAndMaximums => {
                engine::aggregate(observations, spec, &boundary, &MinimumsAndMaximums)
            }
            AggregateType::MediansAndModes => {
                engine::aggregate(observations, spec, &boundary, &MediansAndModes)
            }
            AggregateType::GreatestValues => {
                engine::aggregate(observations, spec, &boundary, &GreatestValues)
            }
            AggregateType::LeastValues => {
                engine::aggregate(observations, spec, &boundary, &LeastValues)
            }
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.frequency, self.kind)
    }
}
