//! Technical indicators aligned with their input.
//!
//! Every indicator returns an [`IndicatorSeries`] of the same length as the
//! input, with `None` until its lookback window is full:
//! - Moving averages (SMA, EMA, least-squares MA, regression slope)
//! - Momentum (RSI, Stochastic RSI)
//! - Volatility (Standard Deviation, Bollinger Bands)

pub mod momentum;
pub mod moving_average;
pub mod volatility;

pub use momentum::{Rsi, StochRsi, StochRsiOutput};
pub use moving_average::{Ema, LinRegSlope, Lsma, Sma};
pub use volatility::{BollingerBands, BollingerOutput, StdDev};

use bracket_core::error::IndicatorError;
use bracket_core::types::IndicatorSeries;

/// Run a calculation over the defined tail of `series` and realign the
/// result with the full length. Undefined values only ever form a prefix.
pub(crate) fn chain(
    series: &IndicatorSeries,
    f: impl FnOnce(&[f64]) -> IndicatorSeries,
) -> IndicatorSeries {
    let tail: Vec<f64> = series.defined().collect();
    IndicatorSeries::from_tail(series.len(), f(&tail).defined().collect())
}

pub(crate) fn check_period(name: &str, period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(format!(
            "{name} period must be greater than 0"
        )));
    }
    Ok(())
}
