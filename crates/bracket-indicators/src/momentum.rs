//! Momentum indicators.

use bracket_core::error::IndicatorError;
use bracket_core::traits::{Indicator, MultiOutputIndicator};
use bracket_core::types::IndicatorSeries;
use serde::{Deserialize, Serialize};

use crate::moving_average::Sma;
use crate::{chain, check_period};

/// Relative Strength Index (RSI).
///
/// Measures the speed and magnitude of recent price changes
/// to evaluate overbought or oversold conditions.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    /// Create a new RSI indicator.
    ///
    /// Common periods are 14 (default) or 9.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    pub fn try_new(period: usize) -> Result<Self, IndicatorError> {
        check_period("RSI", period)?;
        Ok(Self { period })
    }

    /// Wilder's smoothing: the first value is a simple mean, then
    /// `avg = (prev_avg * (period-1) + value) / period`.
    fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
        if values.len() < period {
            return vec![];
        }

        let mut result = Vec::with_capacity(values.len() - period + 1);
        let period_f64 = period as f64;

        let mut avg: f64 = values[..period].iter().sum::<f64>() / period_f64;
        result.push(avg);

        for &value in &values[period..] {
            avg = (avg * (period_f64 - 1.0) + value) / period_f64;
            result.push(avg);
        }

        result
    }
}

impl Indicator for Rsi {
    fn calculate(&self, data: &[f64]) -> IndicatorSeries {
        if data.len() <= self.period {
            return IndicatorSeries::undefined(data.len());
        }

        let (gains, losses): (Vec<f64>, Vec<f64>) = data
            .windows(2)
            .map(|pair| {
                let change = pair[1] - pair[0];
                if change > 0.0 {
                    (change, 0.0)
                } else {
                    (0.0, -change)
                }
            })
            .unzip();

        let avg_gains = Self::wilder_smooth(&gains, self.period);
        let avg_losses = Self::wilder_smooth(&losses, self.period);

        let tail = avg_gains
            .iter()
            .zip(avg_losses.iter())
            .map(|(&gain, &loss)| {
                if loss == 0.0 && gain == 0.0 {
                    50.0 // No movement at all
                } else if loss == 0.0 {
                    100.0
                } else {
                    100.0 - (100.0 / (1.0 + gain / loss))
                }
            })
            .collect();

        IndicatorSeries::from_tail(data.len(), tail)
    }

    fn warmup(&self) -> usize {
        self.period + 1 // Need period+1 data points
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

/// Stochastic RSI output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochRsiOutput {
    /// %K (smoothed stochastic of RSI)
    pub k: f64,
    /// %D (signal line, SMA of %K)
    pub d: f64,
}

/// Stochastic oscillator applied to RSI values.
#[derive(Debug, Clone)]
pub struct StochRsi {
    rsi_period: usize,
    stoch_period: usize,
    k_smoothing: usize,
    d_smoothing: usize,
}

impl StochRsi {
    /// Create with the usual parameters (14, 14, 3, 3).
    pub fn new() -> Self {
        Self::with_params(14, 14, 3, 3)
    }

    pub fn with_params(
        rsi_period: usize,
        stoch_period: usize,
        k_smoothing: usize,
        d_smoothing: usize,
    ) -> Self {
        assert!(rsi_period > 0 && stoch_period > 0 && k_smoothing > 0 && d_smoothing > 0);
        Self {
            rsi_period,
            stoch_period,
            k_smoothing,
            d_smoothing,
        }
    }

    pub fn try_with_params(
        rsi_period: usize,
        stoch_period: usize,
        k_smoothing: usize,
        d_smoothing: usize,
    ) -> Result<Self, IndicatorError> {
        check_period("StochRSI rsi", rsi_period)?;
        check_period("StochRSI stochastic", stoch_period)?;
        check_period("StochRSI %K", k_smoothing)?;
        check_period("StochRSI %D", d_smoothing)?;
        Ok(Self {
            rsi_period,
            stoch_period,
            k_smoothing,
            d_smoothing,
        })
    }

    fn stochastic(values: &[f64], period: usize) -> IndicatorSeries {
        let tail = values
            .windows(period)
            .map(|window| {
                let lowest = window.iter().cloned().fold(f64::INFINITY, f64::min);
                let highest = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let range = highest - lowest;
                if range == 0.0 {
                    50.0 // Undefined, use midpoint
                } else {
                    (window[window.len() - 1] - lowest) / range * 100.0
                }
            })
            .collect();
        IndicatorSeries::from_tail(values.len(), tail)
    }
}

impl Default for StochRsi {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiOutputIndicator for StochRsi {
    type Outputs = StochRsiOutput;

    fn calculate(&self, data: &[f64]) -> IndicatorSeries<StochRsiOutput> {
        let rsi = Rsi::new(self.rsi_period).calculate(data);
        let stoch = chain(&rsi, |values| Self::stochastic(values, self.stoch_period));
        let k = chain(&stoch, |values| Sma::new(self.k_smoothing).calculate(values));
        let d = chain(&k, |values| Sma::new(self.d_smoothing).calculate(values));

        IndicatorSeries::new(
            k.iter()
                .zip(d.iter())
                .map(|pair| match pair {
                    (Some(k), Some(d)) => Some(StochRsiOutput { k, d }),
                    _ => None,
                })
                .collect(),
        )
    }

    fn warmup(&self) -> usize {
        self.rsi_period + self.stoch_period + self.k_smoothing + self.d_smoothing - 2
    }

    fn name(&self) -> &str {
        "StochRSI"
    }
}
