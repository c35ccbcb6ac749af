//! Stochastic RSI crossover above the lower Bollinger band.
//!
//! Long only. Enters when %K crosses above %D while price holds above the
//! lower band, with a fixed-percentage stop and target. Exits when price
//! breaks down through the lower band.

use bracket_core::error::StrategyError;
use bracket_core::traits::{Conditions, MultiOutputIndicator, Strategy, StrategyConfig};
use bracket_core::types::{BarSeries, Direction};
use bracket_indicators::{BollingerBands, StochRsi};
use bracket_risk::BracketLevels;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StochRsiBandsConfig {
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub rsi_period: usize,
    pub stoch_period: usize,
    pub k_smoothing: usize,
    pub d_smoothing: usize,
    /// Stop distance below entry, in percent
    pub stop_pct: f64,
    /// Target distance above entry, in percent
    pub target_pct: f64,
}

impl Default for StochRsiBandsConfig {
    fn default() -> Self {
        Self {
            bb_period: 20,
            bb_std_dev: 2.0,
            rsi_period: 14,
            stoch_period: 14,
            k_smoothing: 3,
            d_smoothing: 3,
            stop_pct: 15.0,
            target_pct: 40.0,
        }
    }
}

impl StrategyConfig for StochRsiBandsConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        BollingerBands::try_with_params(self.bb_period, self.bb_std_dev)
            .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
        StochRsi::try_with_params(
            self.rsi_period,
            self.stoch_period,
            self.k_smoothing,
            self.d_smoothing,
        )
        .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
        if !(self.stop_pct > 0.0 && self.stop_pct < 100.0) {
            return Err(StrategyError::InvalidConfig(
                "Stop percentage must be between 0 and 100".into(),
            ));
        }
        if !(self.target_pct > 0.0) {
            return Err(StrategyError::InvalidConfig(
                "Target percentage must be positive".into(),
            ));
        }
        Ok(())
    }
}

pub struct StochRsiBandsStrategy {
    config: StochRsiBandsConfig,
    bands: BollingerBands,
    stoch: StochRsi,
}

impl StochRsiBandsStrategy {
    pub fn new(config: StochRsiBandsConfig) -> Self {
        Self {
            bands: BollingerBands::with_params(config.bb_period, config.bb_std_dev),
            stoch: StochRsi::with_params(
                config.rsi_period,
                config.stoch_period,
                config.k_smoothing,
                config.d_smoothing,
            ),
            config,
        }
    }
}

impl Strategy for StochRsiBandsStrategy {
    fn name(&self) -> &str {
        "StochRSI Bands"
    }

    fn description(&self) -> &str {
        "Long on a Stochastic RSI %K/%D cross while price holds above the lower Bollinger band"
    }

    fn conditions(&self, series: &BarSeries) -> Option<Conditions> {
        if !self.is_warmed_up(series.len()) {
            return None;
        }

        let closes = series.closes();
        let bands = self.bands.calculate(&closes);
        let stoch = self.stoch.calculate(&closes);

        let band = bands.last()?;
        let prev_band = bands.previous()?;
        let now = stoch.last()?;
        let prev = stoch.previous()?;

        let close = *closes.last()?;
        let prev_close = closes[closes.len() - 2];

        let crossed_up = prev.k <= prev.d && now.k > now.d;
        let long = (close > band.lower && crossed_up).then(|| {
            BracketLevels::from_percentages(
                Direction::Long,
                close,
                self.config.stop_pct,
                self.config.target_pct,
            )
            .plan(Direction::Long, close)
        });
        let broke_lower = prev_close >= prev_band.lower && close < band.lower;

        Some(
            Conditions {
                long,
                exit_long: broke_lower,
                ..Default::default()
            }
            .with_indicator("bb_lower", band.lower)
            .with_indicator("bb_middle", band.middle)
            .with_indicator("bb_upper", band.upper)
            .with_indicator("stoch_k", now.k)
            .with_indicator("stoch_d", now.d),
        )
    }

    fn warmup_period(&self) -> usize {
        // Crossings compare against the previous bar
        self.bands.warmup().max(self.stoch.warmup()) + 1
    }

    fn params(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}
