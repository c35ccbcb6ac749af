//! Rule sets and the signal evaluator.
//!
//! A rule set reports entry and exit conditions on the latest bar; the
//! [`SignalEvaluator`] turns them into at most one decision per bar based on
//! the current position:
//! - LSMA trend with RSI momentum
//! - Stochastic RSI crossover above the lower Bollinger band
//! - Moving Average Crossover
//! - RSI oversold/overbought reversion

mod evaluator;
mod lsma_rsi;
mod ma_crossover;
mod registry;
mod rsi_reversion;
mod stoch_rsi_bands;

pub use evaluator::SignalEvaluator;
pub use lsma_rsi::{LsmaRsiConfig, LsmaRsiStrategy};
pub use ma_crossover::{MACrossoverConfig, MACrossoverStrategy};
pub use registry::{StrategyInfo, StrategyRegistry};
pub use rsi_reversion::{RsiReversionConfig, RsiReversionStrategy};
pub use stoch_rsi_bands::{StochRsiBandsConfig, StochRsiBandsStrategy};

#[cfg(test)]
pub(crate) mod test_support {
    use bracket_core::types::{Bar, BarSeries, Timeframe};

    /// Daily bars with the given closes; each bar opens at the previous close.
    pub fn series_from_closes(closes: &[f64]) -> BarSeries {
        let mut series = BarSeries::new("TEST", Timeframe::Daily);
        let mut open = closes.first().copied().unwrap_or_default();
        for (i, &close) in closes.iter().enumerate() {
            series.push(Bar::new(
                i as i64 * 86_400_000,
                open,
                open.max(close) + 0.5,
                open.min(close) - 0.5,
                close,
                1000.0,
            ));
            open = close;
        }
        series
    }
}
