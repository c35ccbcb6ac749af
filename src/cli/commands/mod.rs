//! CLI command implementations.

pub mod backtest;
pub mod bracket;
pub mod signal;
pub mod strategies;
pub mod validate;

use anyhow::{Context, Result};
use bracket_core::types::Bar;
use bracket_data::CsvBarSource;
use bracket_strategies::{SignalEvaluator, StrategyRegistry};
use tracing::info;

use crate::cli::StrategyArgs;

/// Build the evaluator named by the arguments.
pub(crate) fn build_evaluator(args: &StrategyArgs) -> Result<SignalEvaluator> {
    let params = match (&args.params, &args.strategy_config) {
        (Some(inline), _) => serde_json::from_str(inline).context("parsing --params")?,
        (None, Some(path)) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        (None, None) => serde_json::Value::Null,
    };

    let registry = StrategyRegistry::new();
    let strategy = registry
        .create(&args.strategy, params)
        .with_context(|| format!("creating strategy '{}'", args.strategy))?;
    info!(strategy = strategy.name(), params = %strategy.params(), "Strategy ready");
    Ok(SignalEvaluator::new(strategy))
}

/// Load the bars named by the arguments.
pub(crate) fn load_bars(args: &StrategyArgs) -> Result<Vec<Bar>> {
    let source = CsvBarSource::new(&args.data)
        .with_context(|| format!("opening {}", args.data.display()))?;
    let bars = if args.sort {
        source.load_sorted()
    } else {
        source.load()
    }
    .with_context(|| format!("loading bars from {}", args.data.display()))?;
    info!(bars = bars.len(), path = %args.data.display(), "Loaded data");
    Ok(bars)
}
