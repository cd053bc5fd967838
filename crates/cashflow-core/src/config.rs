//! Aggregation defaults
//!
//! Reducer tuning and window parameters that rules may leave unset.
//!
//! ## Configuration Resolution
//!
//! Defaults are loaded with a two-layer resolution:
//! 1. Embedded defaults (compiled into binary from `config/aggregates.toml`)
//! 2. Override file, if present (~/.config/cashflow/aggregates.toml or an
//!    explicit path). Keys it leaves out keep the embedded values.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Tuning;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/aggregates.toml");

/// Defaults applied when a rule leaves a parameter unset
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationDefaults {
    pub selection_limit: usize,
    pub mode_max: usize,
    pub x_percent_range: f64,
    pub day_cycles: u32,
    pub weekday_start: Weekday,
}

/// Mirrors `config/aggregates.toml`; `Tuning::default` and `WindowSpec::new`
/// both read from here
impl Default for AggregationDefaults {
    fn default() -> Self {
        Self {
            selection_limit: 5,
            mode_max: 5,
            x_percent_range: 0.0,
            day_cycles: 30,
            weekday_start: Weekday::Mon,
        }
    }
}

impl AggregationDefaults {
    /// Reducer tuning with `reverse` off
    pub fn tuning(&self) -> Tuning {
        Tuning {
            selection_limit: self.selection_limit,
            mode_max: self.mode_max,
            x_percent_range: self.x_percent_range,
            reverse: false,
        }
    }

    /// Load defaults from the standard override location, falling back to
    /// the embedded config
    pub fn load() -> Result<Self> {
        load_config(default_config_path().as_deref())
    }

    /// Load defaults with an explicit override file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        load_config(Some(path))
    }

    /// Embedded defaults only
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG, Self::default())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cashflow").join("aggregates.toml"))
}

/// Load configuration (embedded first, then override on top)
fn load_config(override_path: Option<&Path>) -> Result<AggregationDefaults> {
    let embedded = AggregationDefaults::embedded()?;

    match override_path {
        Some(path) if path.exists() => {
            debug!(path = %path.display(), "Loading aggregation defaults override");
            let content = fs::read_to_string(path)?;
            parse_config(&content, embedded)
        }
        _ => Ok(embedded),
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    reducers: Option<RawReducers>,
    windows: Option<RawWindows>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReducers {
    selection_limit: Option<usize>,
    mode_max: Option<usize>,
    x_percent_range: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWindows {
    day_cycles: Option<u32>,
    weekday_start: Option<String>,
}

/// Parse config from TOML content, layered over `base`
fn parse_config(content: &str, base: AggregationDefaults) -> Result<AggregationDefaults> {
    let raw: RawConfig = toml::from_str(content)?;
    let mut config = base;

    if let Some(reducers) = raw.reducers {
        if let Some(limit) = reducers.selection_limit {
            config.selection_limit = limit;
        }
        if let Some(mode_max) = reducers.mode_max {
            config.mode_max = mode_max;
        }
        if let Some(range) = reducers.x_percent_range {
            config.x_percent_range = range;
        }
    }

    if let Some(windows) = raw.windows {
        if let Some(cycles) = windows.day_cycles {
            config.day_cycles = cycles;
        }
        if let Some(weekday) = windows.weekday_start {
            config.weekday_start = parse_weekday(&weekday)?;
        }
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &AggregationDefaults) -> Result<()> {
    if config.selection_limit == 0 {
        return Err(Error::Config("selection_limit must be at least 1".to_string()));
    }
    if config.mode_max == 0 {
        return Err(Error::Config("mode_max must be at least 1".to_string()));
    }
    if !config.x_percent_range.is_finite() || config.x_percent_range < 0.0 {
        return Err(Error::Config(format!(
            "x_percent_range must be a non-negative number, got {}",
            config.x_percent_range
        )));
    }
    if config.day_cycles == 0 {
        return Err(Error::Config("day_cycles must be at least 1".to_string()));
    }
    Ok(())
}

/// Parse a weekday name such as `monday` or `Tue`
pub fn parse_weekday(s: &str) -> Result<Weekday> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| Error::Config(format!("Unknown weekday: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_config() {
        let config = AggregationDefaults::embedded().unwrap();
        assert_eq!(config, AggregationDefaults::default());
    }

    #[test]
    fn test_tuning_carries_reducer_defaults() {
        let config = parse_config("[reducers]\nmode_max = 2", AggregationDefaults::default())
            .unwrap();
        let tuning = config.tuning();
        assert_eq!(tuning.mode_max, 2);
        assert_eq!(tuning.selection_limit, 5);
        assert!(!tuning.reverse);
    }

    #[test]
    fn test_override_keeps_unset_keys() {
        let base = AggregationDefaults::embedded().unwrap();
        let config = parse_config(
            r#"
            [reducers]
            selection_limit = 3

            [windows]
            weekday_start = "sunday"
            "#,
            base,
        )
        .unwrap();

        assert_eq!(config.selection_limit, 3);
        assert_eq!(config.weekday_start, Weekday::Sun);
        assert_eq!(config.mode_max, 5);
        assert_eq!(config.day_cycles, 30);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let base = AggregationDefaults::default();
        assert!(parse_config("[windows]\nday_cycles = 0", base.clone()).is_err());
        assert!(parse_config("[windows]\nweekday_start = \"someday\"", base.clone()).is_err());
        assert!(parse_config("[reducers]\nx_percent_range = -1.0", base.clone()).is_err());
        assert!(matches!(
            parse_config("[reducers]\nlimit = 2", base),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("Monday").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("fri").unwrap(), Weekday::Fri);
        assert!(parse_weekday("funday").is_err());
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let err = AggregationDefaults::load_from(Path::new("/nonexistent/aggregates.toml"))
            .unwrap_err();
        assert!(err.is_config());
    }
}
