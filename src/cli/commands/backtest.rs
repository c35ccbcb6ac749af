//! Backtest command implementation.

use anyhow::{Context, Result};
use bracket_backtest::BacktestEngine;
use bracket_config::AppConfig;
use tracing::info;

use super::{build_evaluator, load_bars};
use crate::cli::{BacktestArgs, OutputFormat};

pub fn run(args: BacktestArgs, config: &AppConfig) -> Result<()> {
    let evaluator = build_evaluator(&args.strategy)?;
    let bars = load_bars(&args.strategy)?;

    let mut engine_config = config
        .backtest
        .engine_config(&args.strategy.symbol, args.strategy.timeframe);
    if let Some(capital) = args.capital {
        anyhow::ensure!(capital > rust_decimal::Decimal::ZERO, "--capital must be positive");
        engine_config.initial_capital = capital;
    }
    if let Some(commission) = args.commission_pct {
        engine_config.commission_pct = commission;
    }

    let report = BacktestEngine::new(engine_config)
        .context("invalid backtest settings")?
        .run(&evaluator, &bars);

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    if let Some(path) = &args.save {
        std::fs::write(path, report.to_json()?)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }
    if let Some(path) = &args.equity_csv {
        std::fs::write(path, report.equity_to_csv())
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "Equity curve saved");
    }

    Ok(())
}
