//! LSMA trend filter with RSI momentum.
//!
//! Goes long on a green candle closing above the least-squares moving average
//! while RSI is rising, short on the mirror image. The stop sits at the LSMA
//! (at least `min_stop_pct` away) and the target at `risk_multiplier` stop
//! distances. Positions close when price crosses back through the LSMA.

use bracket_core::error::StrategyError;
use bracket_core::traits::{Conditions, Indicator, Strategy, StrategyConfig};
use bracket_core::types::{BarSeries, Direction};
use bracket_indicators::{Lsma, Rsi};
use bracket_risk::BracketLevels;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LsmaRsiConfig {
    pub lsma_period: usize,
    pub rsi_period: usize,
    /// Target distance in multiples of the stop distance
    pub risk_multiplier: f64,
    /// Minimum stop distance from entry, in percent
    pub min_stop_pct: f64,
}

impl Default for LsmaRsiConfig {
    fn default() -> Self {
        Self {
            lsma_period: 55,
            rsi_period: 14,
            risk_multiplier: 2.0,
            min_stop_pct: 1.0,
        }
    }
}

impl StrategyConfig for LsmaRsiConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.lsma_period < 2 {
            return Err(StrategyError::InvalidConfig(
                "LSMA period must be at least 2".into(),
            ));
        }
        if self.rsi_period == 0 {
            return Err(StrategyError::InvalidConfig(
                "RSI period must be greater than 0".into(),
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

pub struct LsmaRsiStrategy {
    config: LsmaRsiConfig,
    lsma: Lsma,
    rsi: Rsi,
}

impl LsmaRsiStrategy {
    pub fn new(config: LsmaRsiConfig) -> Self {
        Self {
            lsma: Lsma::new(config.lsma_period),
            rsi: Rsi::new(config.rsi_period),
            config,
        }
    }
}

impl Strategy for LsmaRsiStrategy {
    fn name(&self) -> &str {
        "LSMA RSI"
    }

    fn description(&self) -> &str {
        "Trend entries above/below the least-squares MA confirmed by RSI direction"
    }

    fn conditions(&self, series: &BarSeries) -> Option<Conditions> {
        if !self.is_warmed_up(series.len()) {
            return None;
        }

        let closes = series.closes();
        let lsma = self.lsma.calculate(&closes).last()?;
        let rsi_values = self.rsi.calculate(&closes);
        let rsi = rsi_values.last()?;
        let prev_rsi = rsi_values.previous()?;

        let bar = series.last()?;
        let close = bar.close;
        let rsi_rising = rsi > prev_rsi;

        let long = (bar.is_bullish() && close > lsma && rsi_rising).then(|| {
            BracketLevels::from_reference(
                Direction::Long,
                close,
                lsma,
                self.config.min_stop_pct,
                self.config.risk_multiplier,
            )
            .plan(Direction::Long, close)
        });
        let short = (bar.is_bearish() && close < lsma && !rsi_rising).then(|| {
            BracketLevels::from_reference(
                Direction::Short,
                close,
                lsma,
                self.config.min_stop_pct,
                self.config.risk_multiplier,
            )
            .plan(Direction::Short, close)
        });

        Some(
            Conditions {
                long,
                short,
                exit_long: close < lsma,
                exit_short: close > lsma,
                ..Default::default()
            }
            .with_indicator("lsma", lsma)
            .with_indicator("rsi", rsi)
            .with_indicator("rsi_prev", prev_rsi),
        )
    }

    fn warmup_period(&self) -> usize {
        // One extra RSI value to tell its direction
        self.config.lsma_period.max(self.config.rsi_period + 2)
    }

    fn params(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::series_from_closes;

    fn strategy() -> LsmaRsiStrategy {
        LsmaRsiStrategy::new(LsmaRsiConfig {
            lsma_period: 5,
            rsi_period: 3,
            ..Default::default()
        })
    }

    #[test]
    fn test_config_validation() {
        assert!(LsmaRsiConfig::default().validate().is_ok());

        let config = LsmaRsiConfig {
            risk_multiplier: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = LsmaRsiConfig {
            lsma_period: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_warmup() {
        let strategy = strategy();
        assert_eq!(strategy.warmup_period(), 5);
        let series = series_from_closes(&[10.0, 11.0, 12.0, 13.0]);
        assert!(strategy.conditions(&series).is_none());
    }

    #[test]
    fn test_long_on_accelerating_rise() {
        // Pullback then a strong green bar: RSI turns up, close above LSMA
        let series = series_from_closes(&[10.0, 10.5, 11.0, 10.8, 10.6, 11.5]);
        let conditions = strategy().conditions(&series).unwrap();

        let plan = conditions.long.unwrap();
        assert!(conditions.short.is_none());
        assert!(!conditions.exit_long);
        assert!(plan.is_well_ordered());
        assert_eq!(plan.entry, 11.5);
        // Stop at least 1% below entry, target two stop distances above
        assert!(plan.stop <= 11.5 * 0.99 + 1e-12);
        assert!(((plan.target - plan.entry) - 2.0 * (plan.entry - plan.stop)).abs() < 1e-9);
    }

    #[test]
    fn test_short_on_accelerating_drop() {
        let series = series_from_closes(&[11.5, 11.0, 10.5, 10.7, 10.9, 10.0]);
        let conditions = strategy().conditions(&series).unwrap();

        let plan = conditions.short.unwrap();
        assert!(conditions.long.is_none());
        assert!(conditions.exit_long);
        assert!(plan.is_well_ordered());
        assert!(plan.stop >= 10.0 * 1.01 - 1e-12);
    }
}
