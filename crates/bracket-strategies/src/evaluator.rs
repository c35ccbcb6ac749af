//! Position-aware decision making on top of a rule set.

use std::sync::atomic::{AtomicU64, Ordering};

use bracket_core::traits::{Conditions, Strategy, StrategyState};
use bracket_core::types::{
    Bar, BarSeries, Decision, EntryPlan, EntrySignal, ExitSignal, Position, PositionSide,
};
use bracket_risk::validate_levels;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct Counters {
    bars_evaluated: AtomicU64,
    warmup_bars: AtomicU64,
    entries: AtomicU64,
    exits: AtomicU64,
    rejected_entries: AtomicU64,
    discarded_entries: AtomicU64,
    ambiguous_bars: AtomicU64,
    invalid_bars: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Flat/Long/Short state machine over a rule set.
///
/// `evaluate` reads the position instead of owning it, so the same evaluator
/// serves a backtest, a live loop and one-off checks. The counters are
/// diagnostics only and never influence a decision.
pub struct SignalEvaluator {
    strategy: Box<dyn Strategy>,
    counters: Counters,
}

impl SignalEvaluator {
    pub fn new(strategy: Box<dyn Strategy>) -> Self {
        Self {
            strategy,
            counters: Counters::default(),
        }
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    /// Decide what to do on the latest bar of `series`.
    pub fn evaluate(&self, series: &BarSeries, position: &Position) -> Decision {
        bump(&self.counters.bars_evaluated);

        let Some(bar) = series.last() else {
            bump(&self.counters.warmup_bars);
            return Decision::Hold;
        };
        if !bar.has_valid_close() {
            bump(&self.counters.invalid_bars);
            warn!(
                symbol = %series.symbol,
                timestamp = bar.timestamp,
                close = bar.close,
                "Unusable close, holding"
            );
            return Decision::Hold;
        }

        // Unusable closes are left out of the indicator history too.
        let history = series.without_invalid_closes();
        let Some(conditions) = self.strategy.conditions(&history) else {
            bump(&self.counters.warmup_bars);
            return Decision::Hold;
        };

        match position.side {
            PositionSide::Flat => self.evaluate_flat(series, bar, conditions),
            PositionSide::Long => self.evaluate_open(series, bar, &conditions, conditions.exit_long),
            PositionSide::Short => {
                self.evaluate_open(series, bar, &conditions, conditions.exit_short)
            }
        }
    }

    fn evaluate_flat(&self, series: &BarSeries, bar: &Bar, conditions: Conditions) -> Decision {
        if conditions.long.is_some() && conditions.short.is_some() {
            bump(&self.counters.ambiguous_bars);
            debug!(
                symbol = %series.symbol,
                timestamp = bar.timestamp,
                "Long and short conditions both hold, taking long"
            );
        }

        let Some(plan) = conditions.long.or(conditions.short) else {
            return Decision::Hold;
        };

        if let Err(e) = validate_levels(plan.direction, plan.entry, plan.stop, plan.target) {
            bump(&self.counters.discarded_entries);
            warn!(
                symbol = %series.symbol,
                timestamp = bar.timestamp,
                error = %e,
                "Discarding entry"
            );
            return Decision::Hold;
        }

        bump(&self.counters.entries);
        info!(
            symbol = %series.symbol,
            direction = %plan.direction,
            entry = plan.entry,
            stop = plan.stop,
            target = plan.target,
            "Entry signal"
        );

        Decision::Enter(EntrySignal {
            symbol: series.symbol.clone(),
            timestamp: bar.timestamp,
            reason: self.entry_reason(&plan),
            plan,
            strategy: self.strategy.name().to_string(),
            indicators: conditions.indicators,
        })
    }

    fn evaluate_open(
        &self,
        series: &BarSeries,
        bar: &Bar,
        conditions: &Conditions,
        exit: bool,
    ) -> Decision {
        if exit {
            bump(&self.counters.exits);
            info!(symbol = %series.symbol, price = bar.close, "Exit signal");
            return Decision::Exit(ExitSignal {
                symbol: series.symbol.clone(),
                timestamp: bar.timestamp,
                price: bar.close,
                reason: format!("{} exit condition", self.strategy.name()),
            });
        }

        if conditions.long.is_some() || conditions.short.is_some() {
            bump(&self.counters.rejected_entries);
            debug!(
                symbol = %series.symbol,
                timestamp = bar.timestamp,
                "Entry condition while in a position, ignored"
            );
        }
        Decision::Hold
    }

    fn entry_reason(&self, plan: &EntryPlan) -> String {
        format!(
            "{} {} entry, risk/reward {:.2}",
            self.strategy.name(),
            plan.direction,
            plan.risk_reward()
        )
    }

    /// Counters accumulated since construction or the last reset.
    pub fn state(&self) -> StrategyState {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        StrategyState {
            name: self.strategy.name().to_string(),
            bars_evaluated: load(&self.counters.bars_evaluated),
            warmup_bars: load(&self.counters.warmup_bars),
            entries: load(&self.counters.entries),
            exits: load(&self.counters.exits),
            rejected_entries: load(&self.counters.rejected_entries),
            discarded_entries: load(&self.counters.discarded_entries),
            ambiguous_bars: load(&self.counters.ambiguous_bars),
            invalid_bars: load(&self.counters.invalid_bars),
        }
    }

    pub fn reset_counters(&self) {
        for counter in [
            &self.counters.bars_evaluated,
            &self.counters.warmup_bars,
            &self.counters.entries,
            &self.counters.exits,
            &self.counters.rejected_entries,
            &self.counters.discarded_entries,
            &self.counters.ambiguous_bars,
            &self.counters.invalid_bars,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
