//! Strategy trait definitions.

use crate::error::StrategyError;
use crate::types::{BarSeries, EntryPlan};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration trait for strategies.
pub trait StrategyConfig: Send + Sync + Clone + 'static {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), StrategyError>;
}

/// What a rule set sees on the latest bar.
///
/// Entry plans carry the stop and target the rule set would use; the
/// evaluator decides whether any of them is acted on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    pub long: Option<EntryPlan>,
    pub short: Option<EntryPlan>,
    pub exit_long: bool,
    pub exit_short: bool,
    /// Indicator values at the latest bar, for logging and reports
    pub indicators: BTreeMap<String, f64>,
}

impl Conditions {
    pub fn with_indicator(mut self, name: &str, value: f64) -> Self {
        self.indicators.insert(name.to_string(), value);
        self
    }
}

/// Evaluator counters for monitoring and reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyState {
    /// Strategy name
    pub name: String,
    /// Bars evaluated (including warm-up)
    pub bars_evaluated: u64,
    /// Bars evaluated while indicators were still warming up
    pub warmup_bars: u64,
    pub entries: u64,
    pub exits: u64,
    /// Entry conditions seen while a position was already open
    pub rejected_entries: u64,
    /// Entry plans dropped for failing the level ordering check
    pub discarded_entries: u64,
    /// Bars where long and short entry conditions held together
    pub ambiguous_bars: u64,
    /// Bars skipped for an unusable close
    pub invalid_bars: u64,
}

/// A rule set.
///
/// Implementations are pure: the same series always yields the same
/// conditions, and no state is carried between calls.
pub trait Strategy: Send + Sync {
    /// Get the unique name of this strategy.
    fn name(&self) -> &str;

    /// Evaluate the rule set on the latest bar of `series`.
    ///
    /// Returns `None` while any required indicator is undefined.
    fn conditions(&self, series: &BarSeries) -> Option<Conditions>;

    /// Number of bars needed before `conditions` can return `Some`.
    fn warmup_period(&self) -> usize;

    /// Current parameters, for reports.
    fn params(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Check if the strategy is warmed up (has enough data).
    fn is_warmed_up(&self, bars_available: usize) -> bool {
        bars_available >= self.warmup_period()
    }

    /// Get a description of the strategy.
    fn description(&self) -> &str {
        ""
    }
}
