//! Backtesting engine.
//!
//! Replays bars through a [`SignalEvaluator`](bracket_strategies::SignalEvaluator)
//! and a single-position ledger, filling protective stops and targets
//! intrabar.

mod engine;
mod report;
mod statistics;

pub use engine::{BacktestConfig, BacktestEngine};
pub use report::BacktestReport;
pub use statistics::{BacktestStats, ExitReason, TradeRecord};
