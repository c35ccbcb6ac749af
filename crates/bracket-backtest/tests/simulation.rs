//! End-to-end runs over generated price paths.

use bracket_backtest::{BacktestConfig, BacktestEngine, ExitReason};
use bracket_core::types::Bar;
use bracket_strategies::{SignalEvaluator, StrategyRegistry};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let mut open = closes.first().copied().unwrap_or(1.0);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let bar = Bar::new(
                i as i64 * 86_400_000,
                open,
                open.max(close) * 1.002,
                open.min(close) * 0.998,
                close,
                1000.0,
            );
            open = close;
            bar
        })
        .collect()
}

fn evaluator(name: &str, params: serde_json::Value) -> SignalEvaluator {
    let strategy = StrategyRegistry::new().create(name, params).unwrap();
    SignalEvaluator::new(strategy)
}

#[test]
fn rise_then_fall_takes_profit_once() {
    let evaluator = evaluator(
        "ma_crossover",
        serde_json::json!({ "fast_period": 3, "slow_period": 8 }),
    );
    let mut closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    closes.extend((1..=30).map(|i| 129.0 - i as f64));

    let engine = BacktestEngine::new(BacktestConfig {
        symbol: "RISE".into(),
        initial_capital: dec!(10000),
        ..Default::default()
    })
    .unwrap();
    let report = engine.run(&evaluator, &bars_from_closes(&closes));

    assert_eq!(report.stats.total_trades, 1);
    let trade = &report.stats.trades[0];
    assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
    assert!(trade.pnl > Decimal::ZERO);
    assert_eq!(report.stats.bars_processed, closes.len());
    assert_eq!(report.evaluator.entries, 1);
}

#[test]
fn commission_reduces_result() {
    let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.4).sin() * 8.0).collect();
    let bars = bars_from_closes(&closes);
    let params = serde_json::json!({ "fast_period": 3, "slow_period": 6, "allow_short": true });

    let free = BacktestEngine::new(BacktestConfig::default())
        .unwrap()
        .run(&evaluator("ma_crossover", params.clone()), &bars);
    let charged = BacktestEngine::new(BacktestConfig {
        commission_pct: dec!(0.5),
        ..Default::default()
    })
    .unwrap()
    .run(&evaluator("ma_crossover", params), &bars);

    assert!(free.stats.total_trades > 0);
    assert_eq!(free.stats.total_trades, charged.stats.total_trades);
    assert!(charged.stats.final_equity < free.stats.final_equity);
    assert!(charged.stats.total_fees > Decimal::ZERO);
}

fn random_walk() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.04f64..0.04, 1..120).prop_map(|steps| {
        let mut price = 50.0;
        steps
            .into_iter()
            .map(|step| {
                price *= 1.0 + step;
                price
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn final_equity_is_capital_plus_realized(closes in random_walk(), fee in 0u32..3) {
        let evaluator = evaluator(
            "ma_crossover",
            serde_json::json!({ "fast_period": 3, "slow_period": 7, "allow_short": true }),
        );
        let engine = BacktestEngine::new(BacktestConfig {
            initial_capital: dec!(5000),
            commission_pct: Decimal::from(fee) / dec!(10),
            ..Default::default()
        })
        .unwrap();
        let report = engine.run(&evaluator, &bars_from_closes(&closes));
        let stats = &report.stats;

        prop_assert_eq!(stats.equity_curve.len(), closes.len());
        for trade in &stats.trades {
            prop_assert!(trade.entry_time <= trade.exit_time);
        }
        let realized: Decimal = stats.trades.iter().map(|t| t.pnl).sum();
        let drift = (stats.final_equity - (stats.initial_capital + realized)).abs();
        prop_assert!(drift < dec!(0.0001), "drift {}", drift);
    }
}
