//! Backtest statistics.

use bracket_core::types::Direction;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// The evaluator asked to exit at the close
    Signal,
    StopLoss,
    TakeProfit,
    /// Still open after the last bar
    EndOfData,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExitReason::Signal => "signal",
            ExitReason::StopLoss => "stop",
            ExitReason::TakeProfit => "target",
            ExitReason::EndOfData => "end",
        };
        f.write_str(s)
    }
}

/// Record of a completed round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub direction: Direction,
    /// Unix ms of the entry bar
    pub entry_time: i64,
    pub exit_time: i64,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub size: Decimal,
    /// Profit/loss after fees
    pub pnl: Decimal,
    pub fees: Decimal,
    pub return_pct: Decimal,
    pub entry_reason: String,
    pub exit_reason: ExitReason,
}

/// Backtest statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestStats {
    pub initial_capital: Decimal,
    pub final_equity: Decimal,
    pub total_return_pct: Decimal,
    pub annualized_return_pct: Decimal,
    /// Largest peak-to-trough fall of the equity curve, in percent
    pub max_drawdown_pct: Decimal,
    /// Sharpe ratio (assuming risk-free rate of 0)
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate_pct: Decimal,
    /// Average profit per winning trade
    pub avg_win: Decimal,
    /// Average loss per losing trade (positive)
    pub avg_loss: Decimal,
    /// Gross profit over gross loss, zero when nothing was lost
    pub profit_factor: Decimal,
    pub total_fees: Decimal,
    pub bars_processed: usize,
    pub equity_curve: Vec<(i64, Decimal)>,
    pub trades: Vec<TradeRecord>,
    #[serde(skip)]
    peak_equity: Decimal,
    #[serde(skip)]
    period_returns: Vec<f64>,
}

impl BacktestStats {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            final_equity: initial_capital,
            total_return_pct: Decimal::ZERO,
            annualized_return_pct: Decimal::ZERO,
            max_drawdown_pct: Decimal::ZERO,
            sharpe_ratio: 0.0,
            sortino_ratio: 0.0,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate_pct: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            profit_factor: Decimal::ZERO,
            total_fees: Decimal::ZERO,
            bars_processed: 0,
            equity_curve: Vec::new(),
            trades: Vec::new(),
            peak_equity: initial_capital,
            period_returns: Vec::new(),
        }
    }

    /// Record equity at the close of a bar.
    pub fn record_equity(&mut self, timestamp: i64, equity: Decimal) {
        if let Some((_, prev)) = self.equity_curve.last() {
            if *prev > Decimal::ZERO {
                let ret = ((equity - *prev) / *prev).to_f64().unwrap_or(0.0);
                self.period_returns.push(ret);
            }
        }

        self.equity_curve.push((timestamp, equity));

        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        if self.peak_equity > Decimal::ZERO {
            let drawdown = (self.peak_equity - equity) / self.peak_equity * Decimal::ONE_HUNDRED;
            if drawdown > self.max_drawdown_pct {
                self.max_drawdown_pct = drawdown;
            }
        }

        self.bars_processed += 1;
    }

    pub fn add_trade(&mut self, trade: TradeRecord) {
        self.trades.push(trade);
        self.total_trades += 1;
    }

    /// Compute the summary figures. `periods_per_year` annualizes returns
    /// and ratios for the bar timeframe.
    pub fn finalize(&mut self, final_equity: Decimal, periods_per_year: f64) {
        self.final_equity = final_equity;

        if self.initial_capital > Decimal::ZERO {
            self.total_return_pct =
                (self.final_equity - self.initial_capital) / self.initial_capital * Decimal::ONE_HUNDRED;
        }

        if !self.equity_curve.is_empty() {
            let periods = self.equity_curve.len() as f64;
            let total_return = self.total_return_pct.to_f64().unwrap_or(0.0) / 100.0;
            let annualized = ((1.0 + total_return).powf(periods_per_year / periods) - 1.0) * 100.0;
            self.annualized_return_pct = Decimal::from_f64_retain(annualized)
                .map(|d| d.round_dp(4))
                .unwrap_or(Decimal::ZERO);
        }

        self.winning_trades = 0;
        self.losing_trades = 0;
        let mut gross_profit = Decimal::ZERO;
        let mut gross_loss = Decimal::ZERO;
        self.total_fees = Decimal::ZERO;
        for trade in &self.trades {
            self.total_fees += trade.fees;
            if trade.pnl > Decimal::ZERO {
                self.winning_trades += 1;
                gross_profit += trade.pnl;
            } else if trade.pnl < Decimal::ZERO {
                self.losing_trades += 1;
                gross_loss += trade.pnl.abs();
            }
        }

        if self.total_trades > 0 {
            self.win_rate_pct =
                Decimal::from(self.winning_trades * 100) / Decimal::from(self.total_trades);
        }
        if self.winning_trades > 0 {
            self.avg_win = gross_profit / Decimal::from(self.winning_trades);
        }
        if self.losing_trades > 0 {
            self.avg_loss = gross_loss / Decimal::from(self.losing_trades);
        }
        if gross_loss > Decimal::ZERO {
            self.profit_factor = gross_profit / gross_loss;
        }

        if self.period_returns.is_empty() {
            return;
        }
        let n = self.period_returns.len() as f64;
        let mean = self.period_returns.iter().sum::<f64>() / n;
        let variance = self.period_returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        let scale = periods_per_year.sqrt();
        if std_dev > 0.0 {
            self.sharpe_ratio = mean * scale / std_dev;
        }

        let downside: Vec<f64> = self.period_returns.iter().copied().filter(|r| *r < 0.0).collect();
        if !downside.is_empty() {
            let downside_dev =
                (downside.iter().map(|r| r.powi(2)).sum::<f64>() / downside.len() as f64).sqrt();
            if downside_dev > 0.0 {
                self.sortino_ratio = mean * scale / downside_dev;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn trade(pnl: Decimal) -> TradeRecord {
        TradeRecord {
            direction: Direction::Long,
            entry_time: 0,
            exit_time: 1,
            entry_price: dec!(100),
            exit_price: dec!(100),
            size: dec!(1),
            pnl,
            fees: dec!(0.5),
            return_pct: pnl,
            entry_reason: String::new(),
            exit_reason: ExitReason::Signal,
        }
    }

    #[test]
    fn test_drawdown_tracks_peak() {
        let mut stats = BacktestStats::new(dec!(100));
        stats.record_equity(0, dec!(100));
        stats.record_equity(1, dec!(120));
        stats.record_equity(2, dec!(90));
        stats.record_equity(3, dec!(130));
        assert_eq!(stats.max_drawdown_pct, dec!(25));
        assert_eq!(stats.bars_processed, 4);
    }

    #[test]
    fn test_trade_statistics() {
        let mut stats = BacktestStats::new(dec!(1000));
        stats.add_trade(trade(dec!(30)));
        stats.add_trade(trade(dec!(10)));
        stats.add_trade(trade(dec!(-20)));
        stats.record_equity(0, dec!(1000));
        stats.record_equity(1, dec!(1020));
        stats.finalize(dec!(1020), 252.0);

        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.losing_trades, 1);
        assert_eq!(stats.avg_win, dec!(20));
        assert_eq!(stats.avg_loss, dec!(20));
        assert_eq!(stats.profit_factor, dec!(2));
        assert_eq!(stats.total_return_pct, dec!(2));
        assert_eq!(stats.total_fees, dec!(1.5));
    }

    #[test]
    fn test_flat_curve_has_no_ratios() {
        let mut stats = BacktestStats::new(dec!(1000));
        for i in 0..5 {
            stats.record_equity(i, dec!(1000));
        }
        stats.finalize(dec!(1000), 252.0);
        assert_eq!(stats.sharpe_ratio, 0.0);
        assert_eq!(stats.max_drawdown_pct, Decimal::ZERO);
        assert_eq!(stats.win_rate_pct, Decimal::ZERO);
    }
}
