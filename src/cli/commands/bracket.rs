//! Submit one bracket order.

use anyhow::{Context, Result};
use bracket_broker::{
    AlpacaConnection, BracketOrder, BracketSpec, OrderSubmitter, PaperConnection, PaperMode,
    SubmitReceipt,
};
use bracket_config::{AppConfig, BrokerKind};
use bracket_core::traits::{BrokerConnection, EventReceiver};
use tracing::info;

use crate::cli::BracketArgs;

pub async fn run(args: BracketArgs, config: &AppConfig) -> Result<()> {
    let mut spec = BracketSpec::new(
        args.symbol,
        args.side,
        args.quantity,
        args.entry,
        args.stop,
        args.target,
    );
    if args.market {
        spec = spec.at_market();
    }
    spec.validate()?;

    if args.dry_run {
        let bracket = BracketOrder::new(1, &spec);
        println!("{}", serde_json::to_string_pretty(&bracket)?);
        println!("Risk/reward: {:.2}", spec.risk_reward());
        return Ok(());
    }

    let receipt = submit_bracket(&spec, config).await?;
    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(())
}

/// Connect to the configured broker, submit, and disconnect.
pub(crate) async fn submit_bracket(spec: &BracketSpec, config: &AppConfig) -> Result<SubmitReceipt> {
    match config.broker.kind {
        BrokerKind::Paper => {
            let (conn, events) = PaperConnection::new(PaperMode::Acknowledge);
            submit_on(conn, events, spec, config).await
        }
        BrokerKind::Alpaca => {
            let alpaca = config
                .broker
                .alpaca_config()
                .context("reading Alpaca credentials")?;
            let (conn, events) = AlpacaConnection::new(alpaca)?;
            submit_on(conn, events, spec, config).await
        }
    }
}

async fn submit_on<C: BrokerConnection>(
    conn: C,
    events: EventReceiver,
    spec: &BracketSpec,
    config: &AppConfig,
) -> Result<SubmitReceipt> {
    let mut submitter =
        OrderSubmitter::connect(conn, events, config.broker.submitter_settings()).await?;
    let result = submitter.submit(spec).await;
    submitter.close().await?;

    let receipt = result.context("bracket submission failed")?;
    info!(parent_id = receipt.parent_id, status = ?receipt.status, "Bracket placed");
    Ok(receipt)
}
