//! Indicator trait definitions.

use crate::error::IndicatorError;
use crate::types::IndicatorSeries;

/// Trait for technical indicators.
///
/// The output is aligned with the input: `calculate(data).len() == data.len()`
/// and element `i` depends only on `data[..=i]`.
pub trait Indicator: Send + Sync {
    /// Calculate indicator values for the given data.
    fn calculate(&self, data: &[f64]) -> IndicatorSeries;

    /// Number of inputs needed before the first defined value.
    fn warmup(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Validate that there's enough data for at least one value.
    fn validate_data(&self, data: &[f64]) -> Result<(), IndicatorError> {
        if data.len() < self.warmup() {
            return Err(IndicatorError::InsufficientData {
                required: self.warmup(),
                available: data.len(),
            });
        }
        Ok(())
    }
}

/// Multi-output indicator (e.g., Bollinger Bands, Stochastic RSI).
pub trait MultiOutputIndicator: Send + Sync {
    /// The output type containing multiple values.
    type Outputs: Copy;

    /// Calculate indicator values for the given data.
    fn calculate(&self, data: &[f64]) -> IndicatorSeries<Self::Outputs>;

    /// Number of inputs needed before the first defined value.
    fn warmup(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    fn validate_data(&self, data: &[f64]) -> Result<(), IndicatorError> {
        if data.len() < self.warmup() {
            return Err(IndicatorError::InsufficientData {
                required: self.warmup(),
                available: data.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WindowSum {
        period: usize,
    }

    impl Indicator for WindowSum {
        fn calculate(&self, data: &[f64]) -> IndicatorSeries {
            let tail = data
                .windows(self.period)
                .map(|w| w.iter().sum())
                .collect();
            IndicatorSeries::from_tail(data.len(), tail)
        }

        fn warmup(&self) -> usize {
            self.period
        }

        fn name(&self) -> &str {
            "sum"
        }
    }

    #[test]
    fn test_indicator_validation() {
        let indicator = WindowSum { period: 5 };

        assert!(indicator.validate_data(&[1.0, 2.0, 3.0]).is_err());
        assert!(indicator.validate_data(&[1.0, 2.0, 3.0, 4.0, 5.0]).is_ok());
    }

    #[test]
    fn test_output_is_aligned() {
        let indicator = WindowSum { period: 3 };
        let result = indicator.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(result.len(), 5);
        assert_eq!(result.first_defined(), Some(indicator.warmup() - 1));
        assert!((result.get(2).unwrap() - 6.0).abs() < 0.001);
        assert!((result.get(4).unwrap() - 12.0).abs() < 0.001);
    }
}
