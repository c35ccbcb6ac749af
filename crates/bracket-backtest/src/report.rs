//! Backtest report generation.

use std::fmt::Write;

use bracket_core::traits::StrategyState;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::{BacktestConfig, BacktestStats};

/// Complete backtest report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub config: BacktestConfig,
    pub strategy: String,
    pub params: serde_json::Value,
    /// Evaluator counters at the end of the run
    pub evaluator: StrategyState,
    pub stats: BacktestStats,
}

const RULE: &str = "───────────────────────────────────────────────────────────\n";
const DOUBLE_RULE: &str = "═══════════════════════════════════════════════════════════\n";

fn date(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}

impl BacktestReport {
    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let stats = &self.stats;
        let mut s = String::new();

        s.push_str(DOUBLE_RULE);
        s.push_str("                     BACKTEST REPORT                        \n");
        s.push_str(DOUBLE_RULE);
        let _ = writeln!(s, "  Symbol:              {} ({})", self.config.symbol, self.config.timeframe);
        let _ = writeln!(s, "  Strategy:            {}", self.strategy);
        s.push('\n');

        s.push_str("PERFORMANCE\n");
        s.push_str(RULE);
        let _ = writeln!(s, "  Initial Capital:     ${:.2}", stats.initial_capital);
        let _ = writeln!(s, "  Final Equity:        ${:.2}", stats.final_equity);
        let _ = writeln!(s, "  Total Return:        {:.2}%", stats.total_return_pct);
        let _ = writeln!(s, "  Annualized Return:   {:.2}%", stats.annualized_return_pct);
        let _ = writeln!(s, "  Max Drawdown:        {:.2}%", stats.max_drawdown_pct);
        s.push('\n');

        s.push_str("RISK METRICS\n");
        s.push_str(RULE);
        let _ = writeln!(s, "  Sharpe Ratio:        {:.2}", stats.sharpe_ratio);
        let _ = writeln!(s, "  Sortino Ratio:       {:.2}", stats.sortino_ratio);
        let _ = writeln!(s, "  Profit Factor:       {:.2}", stats.profit_factor);
        s.push('\n');

        s.push_str("TRADE STATISTICS\n");
        s.push_str(RULE);
        let _ = writeln!(s, "  Total Trades:        {}", stats.total_trades);
        let _ = writeln!(s, "  Winning Trades:      {}", stats.winning_trades);
        let _ = writeln!(s, "  Losing Trades:       {}", stats.losing_trades);
        let _ = writeln!(s, "  Win Rate:            {:.2}%", stats.win_rate_pct);
        let _ = writeln!(s, "  Avg Win:             ${:.2}", stats.avg_win);
        let _ = writeln!(s, "  Avg Loss:            ${:.2}", stats.avg_loss);
        let _ = writeln!(s, "  Fees Paid:           ${:.2}", stats.total_fees);
        s.push('\n');

        s.push_str("EVALUATOR\n");
        s.push_str(RULE);
        let _ = writeln!(s, "  Bars Processed:      {}", stats.bars_processed);
        let _ = writeln!(s, "  Warm-up Bars:        {}", self.evaluator.warmup_bars);
        let _ = writeln!(s, "  Rejected Entries:    {}", self.evaluator.rejected_entries);
        let _ = writeln!(s, "  Discarded Entries:   {}", self.evaluator.discarded_entries);
        let _ = writeln!(s, "  Ambiguous Bars:      {}", self.evaluator.ambiguous_bars);
        s.push('\n');

        if !stats.trades.is_empty() {
            s.push_str("TRADES\n");
            s.push_str(RULE);
            for trade in &stats.trades {
                let _ = writeln!(
                    s,
                    "  {} {:<5} {:>10.4} -> {:>10.4}  {:>10.2}  {}",
                    date(trade.entry_time),
                    trade.direction,
                    trade.entry_price,
                    trade.exit_price,
                    trade.pnl,
                    trade.exit_reason
                );
            }
            s.push('\n');
        }

        s.push_str(DOUBLE_RULE);
        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export the equity curve as CSV.
    pub fn equity_to_csv(&self) -> String {
        let mut csv = String::from("timestamp,equity\n");
        for (ts, equity) in &self.stats.equity_curve {
            let _ = writeln!(csv, "{ts},{equity}");
        }
        csv
    }
}
