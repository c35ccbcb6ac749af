//! Backtesting engine.

use bracket_core::error::LedgerError;
use bracket_core::types::{Bar, BarSeries, Decision, Direction, Position, Timeframe};
use bracket_risk::{ClosedTrade, Ledger};
use bracket_strategies::SignalEvaluator;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::report::BacktestReport;
use crate::statistics::{BacktestStats, ExitReason, TradeRecord};

/// Backtest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub initial_capital: Decimal,
    /// Fee per fill, in percent of the filled value
    pub commission_pct: Decimal,
    /// Bars kept for indicator computation (0 = whole history)
    pub window: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            symbol: "UNKNOWN".to_string(),
            timeframe: Timeframe::Daily,
            initial_capital: dec!(10000),
            commission_pct: Decimal::ZERO,
            window: 0,
        }
    }
}

/// Open trade bookkeeping the ledger does not keep.
struct OpenTrade {
    entry_time: i64,
    strategy_reason: String,
}

/// Backtesting engine.
pub struct BacktestEngine {
    config: BacktestConfig,
    /// Starting book, cloned for each run
    ledger: Ledger,
}

impl BacktestEngine {
    /// Fails when the commission cannot be charged.
    pub fn new(config: BacktestConfig) -> Result<Self, LedgerError> {
        let ledger = Ledger::new(config.initial_capital).with_commission(config.commission_pct)?;
        Ok(Self { config, ledger })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Replay `bars` in order.
    ///
    /// On each bar an open position is first checked against its stop and
    /// then its target (the stop wins when the bar touches both), then the
    /// evaluator decides at the close. A position still open after the last
    /// bar is closed at the final close.
    pub fn run(&self, evaluator: &SignalEvaluator, bars: &[Bar]) -> BacktestReport {
        let mut ledger = self.ledger.clone();
        let mut stats = BacktestStats::new(self.config.initial_capital);
        let mut series = if self.config.window > 0 {
            BarSeries::with_capacity(&self.config.symbol, self.config.timeframe, self.config.window)
        } else {
            BarSeries::new(&self.config.symbol, self.config.timeframe)
        };
        let mut open: Option<OpenTrade> = None;

        info!(
            symbol = %self.config.symbol,
            strategy = evaluator.strategy().name(),
            bars = bars.len(),
            "Starting backtest"
        );

        for bar in bars {
            series.push(*bar);

            if let Some((price, reason)) = protective_fill(ledger.position(), bar) {
                if let Some(trade) = close(&mut ledger, &mut open, price, bar.timestamp, reason) {
                    stats.add_trade(trade);
                }
            }

            match evaluator.evaluate(&series, ledger.position()) {
                Decision::Hold => {}
                Decision::Enter(signal) => {
                    let plan = signal.plan;
                    match (to_price(plan.entry), to_price(plan.stop), to_price(plan.target)) {
                        (Some(entry), Some(stop), Some(target)) => {
                            match ledger.enter(plan.direction, entry, stop, target) {
                                Ok(_) => {
                                    open = Some(OpenTrade {
                                        entry_time: bar.timestamp,
                                        strategy_reason: signal.reason,
                                    });
                                }
                                Err(e) => warn!(error = %e, "Ledger refused entry"),
                            }
                        }
                        _ => warn!(?plan, "Entry plan not representable, skipping"),
                    }
                }
                Decision::Exit(signal) => match to_price(signal.price) {
                    Some(price) => {
                        if let Some(trade) =
                            close(&mut ledger, &mut open, price, bar.timestamp, ExitReason::Signal)
                        {
                            stats.add_trade(trade);
                        }
                    }
                    None => warn!(price = signal.price, "Exit price not representable"),
                },
            }

            let mark = to_price(bar.close).unwrap_or(ledger.position().entry_price);
            stats.record_equity(bar.timestamp, ledger.value(mark));
        }

        if let Some(last) = bars.last() {
            if !ledger.is_flat() {
                if let Some(price) = to_price(last.close) {
                    debug!(%price, "Closing open position at end of data");
                    if let Some(trade) =
                        close(&mut ledger, &mut open, price, last.timestamp, ExitReason::EndOfData)
                    {
                        stats.add_trade(trade);
                    }
                }
            }
        }

        let final_equity = match bars.last().and_then(|b| to_price(b.close)) {
            Some(mark) => ledger.value(mark),
            None => ledger.cash(),
        };
        stats.finalize(final_equity, self.config.timeframe.periods_per_year());

        info!(
            trades = stats.total_trades,
            return_pct = %stats.total_return_pct.round_dp(2),
            "Backtest complete"
        );

        BacktestReport {
            config: self.config.clone(),
            strategy: evaluator.strategy().name().to_string(),
            params: evaluator.strategy().params(),
            evaluator: evaluator.state(),
            stats,
        }
    }
}

/// Price at which the bar trips the open position's stop or target.
fn protective_fill(position: &Position, bar: &Bar) -> Option<(Decimal, ExitReason)> {
    let direction = position.direction()?;
    let high = to_price(bar.high)?;
    let low = to_price(bar.low)?;
    let (stop_hit, target_hit) = match direction {
        Direction::Long => (low <= position.stop_price, high >= position.target_price),
        Direction::Short => (high >= position.stop_price, low <= position.target_price),
    };
    if stop_hit {
        Some((position.stop_price, ExitReason::StopLoss))
    } else if target_hit {
        Some((position.target_price, ExitReason::TakeProfit))
    } else {
        None
    }
}

fn close(
    ledger: &mut Ledger,
    open: &mut Option<OpenTrade>,
    price: Decimal,
    timestamp: i64,
    reason: ExitReason,
) -> Option<TradeRecord> {
    match ledger.exit(price) {
        Ok(closed) => {
            let opened = open.take();
            Some(record(closed, opened, timestamp, reason))
        }
        Err(e) => {
            warn!(error = %e, ?reason, "Ledger refused exit");
            None
        }
    }
}

fn record(closed: ClosedTrade, opened: Option<OpenTrade>, exit_time: i64, reason: ExitReason) -> TradeRecord {
    let (entry_time, entry_reason) = opened
        .map(|o| (o.entry_time, o.strategy_reason))
        .unwrap_or((exit_time, String::new()));
    TradeRecord {
        direction: closed.direction,
        entry_time,
        exit_time,
        entry_price: closed.entry_price,
        exit_price: closed.exit_price,
        size: closed.size,
        pnl: closed.pnl,
        fees: closed.fees,
        return_pct: closed.return_pct(),
        entry_reason,
        exit_reason: reason,
    }
}

fn to_price(value: f64) -> Option<Decimal> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    Decimal::from_f64_retain(value).map(|d| d.round_dp(8))
}
