//! Evaluate the latest bar of a data file.

use anyhow::{bail, Context, Result};
use bracket_broker::BracketSpec;
use bracket_config::AppConfig;
use bracket_core::types::{BarSeries, Decision, Direction, Position};
use rust_decimal::Decimal;
use tracing::info;

use super::bracket::submit_bracket;
use super::{build_evaluator, load_bars};
use crate::cli::{PositionArg, SignalArgs};

pub async fn run(args: SignalArgs, config: &AppConfig) -> Result<()> {
    let evaluator = build_evaluator(&args.strategy)?;
    let bars = load_bars(&args.strategy)?;
    let series = BarSeries::from_bars(&args.strategy.symbol, args.strategy.timeframe, &bars);

    let position = held_position(&args)?;
    let decision = evaluator.evaluate(&series, &position);
    println!("{}", serde_json::to_string_pretty(&decision)?);

    let Decision::Enter(signal) = &decision else {
        if args.submit {
            info!("No entry on the latest bar, nothing to submit");
        }
        return Ok(());
    };
    if !args.submit {
        return Ok(());
    }

    let quantity = args.quantity.context("--submit needs --quantity")?;
    let spec = BracketSpec::from_plan(&signal.symbol, &signal.plan, quantity, args.price_decimals)?;
    let receipt = submit_bracket(&spec, config).await?;
    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(())
}

/// The evaluator only looks at the side of the held position, so the
/// levels are filled with the entry price.
fn held_position(args: &SignalArgs) -> Result<Position> {
    let direction = match args.position {
        PositionArg::Flat => return Ok(Position::flat()),
        PositionArg::Long => Direction::Long,
        PositionArg::Short => Direction::Short,
    };
    let Some(entry) = args.entry else {
        bail!("--entry is required with an open position");
    };
    Ok(Position::open(direction, entry, entry, entry, Decimal::ONE))
}
