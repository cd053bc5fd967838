//! Windowed Aggregation Engine
//!
//! Partitions a date-sorted sequence of observations into windows and
//! reduces each window to one [`Aggregate`](crate::models::Aggregate).
//!
//! ## Components
//!
//! - **Date Cursor** - one-day-at-a-time calendar pointer
//! - **Boundaries** - annual (calendar or fiscal), monthly, weekly, day-cycle
//!   and caller-supplied date-set windows
//! - **Reducers** - sums/averages, minimums/maximums, medians/modes,
//!   greatest values, least values
//! - **Engine** - the shared traversal loop
//! - **Selector** - resolves a (frequency, type) pair to a strategy + reducer
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cashflow_core::aggregate::AggregateFunction;
//! use cashflow_core::models::{AggregateType, Frequency, WindowSpec};
//!
//! let spec = WindowSpec::new("spending", "amount");
//! let function = AggregateFunction::select(Frequency::Monthly, AggregateType::SumsAndAverages)
//!     .expect("monthly sums are supported");
//! let aggregates = function.run(&observations, &spec)?;
//! ```

pub mod boundary;
pub mod cursor;
pub mod engine;
pub mod reducers;
pub mod selector;

pub use boundary::{FiscalYearStart, PeriodicWindow, WindowBoundary};
pub use cursor::DateCursor;
pub use engine::{aggregate, validate_observations};
pub use reducers::{
    GreatestValues, LeastValues, MediansAndModes, MinimumsAndMaximums, Reducer, SumsAndAverages,
};
pub use selector::{AggregateFunction, Granularity};
