//! RSI oversold/overbought reversion.
//!
//! Long only: buys when RSI drops below the oversold level and closes the
//! position once RSI climbs above the overbought level.

use bracket_core::error::StrategyError;
use bracket_core::traits::{Conditions, Indicator, Strategy, StrategyConfig};
use bracket_core::types::{BarSeries, Direction};
use bracket_indicators::Rsi;
use bracket_risk::BracketLevels;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiReversionConfig {
    pub rsi_period: usize,
    pub oversold: f64,
    pub overbought: f64,
    /// Stop distance below entry, in percent
    pub stop_pct: f64,
    /// Target distance in multiples of the stop distance
    pub risk_multiplier: f64,
}

impl Default for RsiReversionConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            oversold: 30.0,
            overbought: 70.0,
            stop_pct: 5.0,
            risk_multiplier: 2.0,
        }
    }
}

impl StrategyConfig for RsiReversionConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.rsi_period == 0 {
            return Err(StrategyError::InvalidConfig(
                "RSI period must be greater than 0".into(),
            ));
        }
        if !(0.0 < self.oversold && self.oversold < self.overbought && self.overbought < 100.0) {
            return Err(StrategyError::InvalidConfig(format!(
                "Need 0 < oversold ({}) < overbought ({}) < 100",
                self.oversold, self.overbought
            )));
        }
        if !(self.stop_pct > 0.0 && self.stop_pct < 100.0) {
            return Err(StrategyError::InvalidConfig(
                "Stop percentage must be between 0 and 100".into(),
            ));
        }
        if !(self.risk_multiplier > 0.0) {
            return Err(StrategyError::InvalidConfig(
                "Risk multiplier must be positive".into(),
            ));
        }
        Ok(())
    }
}

pub struct RsiReversionStrategy {
    config: RsiReversionConfig,
    rsi: Rsi,
}

impl RsiReversionStrategy {
    pub fn new(config: RsiReversionConfig) -> Self {
        Self {
            rsi: Rsi::new(config.rsi_period),
            config,
        }
    }
}

impl Strategy for RsiReversionStrategy {
    fn name(&self) -> &str {
        "RSI Reversion"
    }

    fn description(&self) -> &str {
        "Buys RSI oversold readings and exits on overbought"
    }

    fn conditions(&self, series: &BarSeries) -> Option<Conditions> {
        if !self.is_warmed_up(series.len()) {
            return None;
        }

        let closes = series.closes();
        let rsi = self.rsi.calculate(&closes).last()?;
        let close = *closes.last()?;

        let long = (rsi < self.config.oversold).then(|| {
            BracketLevels::from_percentages(
                Direction::Long,
                close,
                self.config.stop_pct,
                self.config.stop_pct * self.config.risk_multiplier,
            )
            .plan(Direction::Long, close)
        });

        Some(
            Conditions {
                long,
                exit_long: rsi > self.config.overbought,
                ..Default::default()
            }
            .with_indicator("rsi", rsi),
        )
    }

    fn warmup_period(&self) -> usize {
        self.rsi.warmup()
    }

    fn params(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::series_from_closes;

    fn strategy() -> RsiReversionStrategy {
        RsiReversionStrategy::new(RsiReversionConfig {
            rsi_period: 5,
            ..Default::default()
        })
    }

    #[test]
    fn test_config_validation() {
        assert!(RsiReversionConfig::default().validate().is_ok());
        assert!(RsiReversionConfig {
            oversold: 80.0,
            ..Default::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_oversold_entry() {
        let series = series_from_closes(&[100.0, 99.0, 98.0, 97.0, 96.0, 95.0, 94.0]);
        let conditions = strategy().conditions(&series).unwrap();

        let plan = conditions.long.unwrap();
        assert!((plan.stop - 94.0 * 0.95).abs() < 1e-9);
        assert!((plan.target - 94.0 * 1.10).abs() < 1e-9);
        assert!(!conditions.exit_long);
        assert!(conditions.short.is_none());
    }

    #[test]
    fn test_overbought_exit() {
        let series = series_from_closes(&[94.0, 95.0, 96.0, 97.0, 98.0, 99.0, 100.0]);
        let conditions = strategy().conditions(&series).unwrap();

        assert!(conditions.long.is_none());
        assert!(conditions.exit_long);
        assert_eq!(conditions.indicators["rsi"], 100.0);
    }

    #[test]
    fn test_warmup() {
        let series = series_from_closes(&[100.0, 99.0, 98.0, 97.0, 96.0]);
        assert!(strategy().conditions(&series).is_none());
    }
}
