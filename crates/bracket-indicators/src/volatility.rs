//! Volatility indicators.

use bracket_core::error::IndicatorError;
use bracket_core::traits::{Indicator, MultiOutputIndicator};
use bracket_core::types::IndicatorSeries;
use serde::{Deserialize, Serialize};

use crate::check_period;

/// Mean and population standard deviation of a window.
fn mean_and_std(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Rolling population standard deviation.
#[derive(Debug, Clone)]
pub struct StdDev {
    period: usize,
}

impl StdDev {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    pub fn try_new(period: usize) -> Result<Self, IndicatorError> {
        check_period("StdDev", period)?;
        Ok(Self { period })
    }
}

impl Indicator for StdDev {
    fn calculate(&self, data: &[f64]) -> IndicatorSeries {
        let tail = data
            .windows(self.period)
            .map(|window| mean_and_std(window).1)
            .collect();
        IndicatorSeries::from_tail(data.len(), tail)
    }

    fn warmup(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "StdDev"
    }
}

/// Bollinger Bands output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerOutput {
    pub upper: f64,
    /// Middle band (SMA)
    pub middle: f64,
    pub lower: f64,
    /// (upper - lower) / middle
    pub bandwidth: f64,
    /// (price - lower) / (upper - lower)
    pub percent_b: f64,
}

impl BollingerOutput {
    /// Check if price is above upper band.
    pub fn is_overbought(&self, price: f64) -> bool {
        price > self.upper
    }

    /// Check if price is below lower band.
    pub fn is_oversold(&self, price: f64) -> bool {
        price < self.lower
    }
}

/// Bollinger Bands.
///
/// A middle SMA with bands a fixed number of population standard
/// deviations above and below.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    /// Create new Bollinger Bands with default parameters (20, 2.0).
    pub fn new() -> Self {
        Self::with_params(20, 2.0)
    }

    pub fn with_params(period: usize, std_dev_multiplier: f64) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        assert!(
            std_dev_multiplier > 0.0,
            "Std dev multiplier must be positive"
        );
        Self {
            period,
            std_dev_multiplier,
        }
    }

    pub fn try_with_params(period: usize, std_dev_multiplier: f64) -> Result<Self, IndicatorError> {
        if period < 2 {
            return Err(IndicatorError::InvalidParameter(
                "Bollinger period must be at least 2".to_string(),
            ));
        }
        if !(std_dev_multiplier.is_finite() && std_dev_multiplier > 0.0) {
            return Err(IndicatorError::InvalidParameter(format!(
                "Bollinger multiplier must be positive, got {std_dev_multiplier}"
            )));
        }
        Ok(Self {
            period,
            std_dev_multiplier,
        })
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiOutputIndicator for BollingerBands {
    type Outputs = BollingerOutput;

    fn calculate(&self, data: &[f64]) -> IndicatorSeries<BollingerOutput> {
        let tail = data
            .windows(self.period)
            .map(|window| {
                let (mean, std_dev) = mean_and_std(window);
                let upper = mean + self.std_dev_multiplier * std_dev;
                let lower = mean - self.std_dev_multiplier * std_dev;

                let bandwidth = if mean != 0.0 {
                    (upper - lower) / mean
                } else {
                    0.0
                };

                let price = window[window.len() - 1];
                let percent_b = if upper != lower {
                    (price - lower) / (upper - lower)
                } else {
                    0.5
                };

                BollingerOutput {
                    upper,
                    middle: mean,
                    lower,
                    bandwidth,
                    percent_b,
                }
            })
            .collect();

        IndicatorSeries::from_tail(data.len(), tail)
    }

    fn warmup(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "Bollinger Bands"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_dev_population() {
        // 2, 4, 4, 4, 5, 5, 7, 9 has population std 2
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let result = StdDev::new(8).calculate(&data);
        assert_eq!(result.first_defined(), Some(7));
        assert!((result.last().unwrap() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_bollinger_bands() {
        let bb = BollingerBands::with_params(20, 2.0);
        let data: Vec<f64> = (0..30)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0)
            .collect();
        let result = bb.calculate(&data);

        assert_eq!(result.len(), 30);
        assert_eq!(result.first_defined(), Some(19));
        for output in result.defined() {
            assert!(output.upper > output.middle);
            assert!(output.middle > output.lower);
        }
    }

    #[test]
    fn test_bollinger_constant_prices() {
        let result = BollingerBands::with_params(3, 2.0).calculate(&[10.0; 4]);
        let last = result.last().unwrap();
        assert_eq!(last.upper, last.lower);
        assert_eq!(last.percent_b, 0.5);
        assert!(!last.is_oversold(10.0));
    }

    #[test]
    fn test_bollinger_rejects_bad_params() {
        assert!(BollingerBands::try_with_params(1, 2.0).is_err());
        assert!(BollingerBands::try_with_params(20, 0.0).is_err());
        assert!(BollingerBands::try_with_params(20, f64::NAN).is_err());
    }
}
