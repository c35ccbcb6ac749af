//! Moving average indicators.

use bracket_core::error::IndicatorError;
use bracket_core::traits::Indicator;
use bracket_core::types::IndicatorSeries;

use crate::check_period;

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    pub fn try_new(period: usize) -> Result<Self, IndicatorError> {
        check_period("SMA", period)?;
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn calculate(&self, data: &[f64]) -> IndicatorSeries {
        if data.len() < self.period {
            return IndicatorSeries::undefined(data.len());
        }

        let mut tail = Vec::with_capacity(data.len() - self.period + 1);
        let period_f64 = self.period as f64;

        let mut sum: f64 = data[..self.period].iter().sum();
        tail.push(sum / period_f64);

        // Sliding window
        for i in self.period..data.len() {
            sum = sum - data[i - self.period] + data[i];
            tail.push(sum / period_f64);
        }

        IndicatorSeries::from_tail(data.len(), tail)
    }

    fn warmup(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Exponential Moving Average (EMA).
///
/// Seeded with the SMA of the first N values, then smoothed with `2/(N+1)`.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
}

impl Ema {
    /// Create a new EMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self::build(period)
    }

    pub fn try_new(period: usize) -> Result<Self, IndicatorError> {
        check_period("EMA", period)?;
        Ok(Self::build(period))
    }

    fn build(period: usize) -> Self {
        let multiplier = 2.0 / (period as f64 + 1.0);
        Self { period, multiplier }
    }
}

impl Indicator for Ema {
    fn calculate(&self, data: &[f64]) -> IndicatorSeries {
        if data.len() < self.period {
            return IndicatorSeries::undefined(data.len());
        }

        let mut tail = Vec::with_capacity(data.len() - self.period + 1);
        let mut ema: f64 = data[..self.period].iter().sum::<f64>() / self.period as f64;
        tail.push(ema);

        let one_minus_mult = 1.0 - self.multiplier;
        for &price in &data[self.period..] {
            ema = price * self.multiplier + ema * one_minus_mult;
            tail.push(ema);
        }

        IndicatorSeries::from_tail(data.len(), tail)
    }

    fn warmup(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "EMA"
    }
}

/// Least-squares fit `y = slope * x + intercept` over `x = 0..n`.
fn least_squares(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    if window.len() < 2 {
        return (0.0, window.first().copied().unwrap_or(0.0));
    }

    // Σx and Σx² over 0..n have closed forms
    let sum_x = n * (n - 1.0) / 2.0;
    let sum_x2 = (n - 1.0) * n * (2.0 * n - 1.0) / 6.0;
    let (sum_y, sum_xy) = window
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sy, sxy), (i, &y)| (sy + y, sxy + i as f64 * y));

    let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_x2 - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n;
    (slope, intercept)
}

/// Least Squares Moving Average (LSMA).
///
/// Endpoint of the linear regression line fitted over the last N values.
#[derive(Debug, Clone)]
pub struct Lsma {
    period: usize,
}

impl Lsma {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    pub fn try_new(period: usize) -> Result<Self, IndicatorError> {
        check_period("LSMA", period)?;
        Ok(Self { period })
    }
}

impl Indicator for Lsma {
    fn calculate(&self, data: &[f64]) -> IndicatorSeries {
        let last_x = (self.period - 1) as f64;
        let tail = data
            .windows(self.period)
            .map(|window| {
                let (slope, intercept) = least_squares(window);
                slope * last_x + intercept
            })
            .collect();
        IndicatorSeries::from_tail(data.len(), tail)
    }

    fn warmup(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "LSMA"
    }
}

/// Slope of the linear regression line over the last N values.
#[derive(Debug, Clone)]
pub struct LinRegSlope {
    period: usize,
}

impl LinRegSlope {
    pub fn new(period: usize) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        Self { period }
    }

    pub fn try_new(period: usize) -> Result<Self, IndicatorError> {
        if period < 2 {
            return Err(IndicatorError::InvalidParameter(
                "regression slope needs a period of at least 2".to_string(),
            ));
        }
        Ok(Self { period })
    }
}

impl Indicator for LinRegSlope {
    fn calculate(&self, data: &[f64]) -> IndicatorSeries {
        let tail = data
            .windows(self.period)
            .map(|window| least_squares(window).0)
            .collect();
        IndicatorSeries::from_tail(data.len(), tail)
    }

    fn warmup(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "LinRegSlope"
    }
}
