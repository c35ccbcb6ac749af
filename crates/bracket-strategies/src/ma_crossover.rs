//! Moving Average Crossover Strategy.
//!
//! Goes long when the fast MA moves above the slow MA and exits when it
//! falls back below. With `allow_short` the mirror image opens shorts.

use bracket_core::error::StrategyError;
use bracket_core::traits::{Conditions, Indicator, Strategy, StrategyConfig};
use bracket_core::types::{BarSeries, Direction, EntryPlan, IndicatorSeries};
use bracket_indicators::{Ema, Sma};
use bracket_risk::BracketLevels;
use serde::{Deserialize, Serialize};

/// Configuration for the MA Crossover strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MACrossoverConfig {
    /// Fast moving average period
    pub fast_period: usize,
    /// Slow moving average period
    pub slow_period: usize,
    /// Use EMA instead of SMA
    pub use_ema: bool,
    /// Target distance in multiples of the stop distance
    pub risk_multiplier: f64,
    /// Minimum stop distance from entry, in percent
    pub min_stop_pct: f64,
    /// Open shorts when the fast MA moves below the slow MA
    pub allow_short: bool,
}

impl Default for MACrossoverConfig {
    fn default() -> Self {
        Self {
            fast_period: 10,
            slow_period: 20,
            use_ema: false,
            risk_multiplier: 2.0,
            min_stop_pct: 1.0,
            allow_short: false,
        }
    }
}

impl StrategyConfig for MACrossoverConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.fast_period == 0 {
            return Err(StrategyError::InvalidConfig(
                "Fast period must be greater than 0".into(),
            ));
        }
        if self.fast_period >= self.slow_period {
            return Err(StrategyError::InvalidConfig(
                "Fast period must be less than slow period".into(),
            ));
        }
        if !(self.risk_multiplier > 0.0) {
            return Err(StrategyError::InvalidConfig(
                "Risk multiplier must be positive".into(),
            ));
        }
        if !(self.min_stop_pct > 0.0 && self.min_stop_pct < 100.0) {
            return Err(StrategyError::InvalidConfig(
                "Minimum stop distance must be between 0 and 100 percent".into(),
            ));
        }
        Ok(())
    }
}

/// Moving Average Crossover Strategy.
pub struct MACrossoverStrategy {
    config: MACrossoverConfig,
}

impl MACrossoverStrategy {
    /// Create a new MA Crossover strategy.
    pub fn new(config: MACrossoverConfig) -> Self {
        Self { config }
    }

    fn calculate_ma(&self, closes: &[f64], period: usize) -> IndicatorSeries {
        if self.config.use_ema {
            Ema::new(period).calculate(closes)
        } else {
            Sma::new(period).calculate(closes)
        }
    }

    fn plan(&self, direction: Direction, close: f64, slow: f64) -> EntryPlan {
        BracketLevels::from_reference(
            direction,
            close,
            slow,
            self.config.min_stop_pct,
            self.config.risk_multiplier,
        )
        .plan(direction, close)
    }
}

impl Strategy for MACrossoverStrategy {
    fn name(&self) -> &str {
        "MA Crossover"
    }

    fn description(&self) -> &str {
        "Generates signals based on fast/slow moving average crossovers"
    }

    fn conditions(&self, series: &BarSeries) -> Option<Conditions> {
        if !self.is_warmed_up(series.len()) {
            return None;
        }

        let closes = series.closes();
        let fast = self.calculate_ma(&closes, self.config.fast_period);
        let slow = self.calculate_ma(&closes, self.config.slow_period);

        let current_fast = fast.last()?;
        let current_slow = slow.last()?;
        let close = *closes.last()?;

        // An undefined previous value counts as "not above" and "not below"
        let previous = fast.previous().zip(slow.previous());
        let was_above = previous.is_some_and(|(f, s)| f > s);
        let was_below = previous.is_some_and(|(f, s)| f < s);
        let is_above = current_fast > current_slow;
        let is_below = current_fast < current_slow;

        let long = (is_above && !was_above).then(|| self.plan(Direction::Long, close, current_slow));
        let short = (self.config.allow_short && is_below && !was_below)
            .then(|| self.plan(Direction::Short, close, current_slow));

        Some(
            Conditions {
                long,
                short,
                exit_long: is_below,
                exit_short: is_above,
                ..Default::default()
            }
            .with_indicator("fast_ma", current_fast)
            .with_indicator("slow_ma", current_slow),
        )
    }

    fn warmup_period(&self) -> usize {
        self.config.slow_period.max(self.config.fast_period)
    }

    fn params(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::series_from_closes;

    fn config(allow_short: bool) -> MACrossoverConfig {
        MACrossoverConfig {
            fast_period: 3,
            slow_period: 5,
            allow_short,
            ..Default::default()
        }
    }

    #[test]
    fn test_config_validation() {
        let mut config = MACrossoverConfig::default();
        assert!(config.validate().is_ok());

        config.fast_period = 30;
        config.slow_period = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bullish_crossover() {
        let strategy = MACrossoverStrategy::new(config(false));
        let prices = [
            100.0, 99.0, 98.0, 97.0, 96.0, // Downtrend
            97.0, 99.0, 102.0, 105.0, 108.0, // Uptrend starts
        ];

        let mut longs = Vec::new();
        for end in strategy.warmup_period()..=prices.len() {
            let conditions = strategy
                .conditions(&series_from_closes(&prices[..end]))
                .unwrap();
            assert!(conditions.short.is_none(), "shorts are disabled");
            if let Some(plan) = conditions.long {
                longs.push((end - 1, plan));
            }
        }

        // Only the bar where fast first moves above slow
        assert_eq!(longs.len(), 1);
        let (index, plan) = longs[0];
        assert_eq!(index, 7);
        assert!(plan.is_well_ordered());
    }

    #[test]
    fn test_first_defined_bar_counts_as_crossing() {
        let strategy = MACrossoverStrategy::new(config(false));
        let conditions = strategy
            .conditions(&series_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]))
            .unwrap();
        assert!(conditions.long.is_some());
    }

    #[test]
    fn test_bearish_crossover_with_shorts() {
        let strategy = MACrossoverStrategy::new(config(true));
        let prices = [100.0, 101.0, 102.0, 103.0, 104.0, 103.0, 101.0, 98.0];

        let conditions = strategy.conditions(&series_from_closes(&prices)).unwrap();
        assert!(conditions.exit_long);

        let shorts: Vec<_> = (strategy.warmup_period()..=prices.len())
            .filter_map(|end| strategy.conditions(&series_from_closes(&prices[..end]))?.short)
            .collect();
        assert_eq!(shorts.len(), 1);
        assert!(shorts[0].is_well_ordered());
        assert_eq!(shorts[0].direction, Direction::Short);
    }
}
