//! Validate configuration command.

use anyhow::Result;
use bracket_config::{load_config, BrokerKind};
use std::path::Path;

pub fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {e}");
            return Err(e.into());
        }
    };

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {} ({})", config.logging.level, config.logging.format);
    if let Some(file) = &config.logging.file {
        println!("Log file: {file}");
    }
    match config.broker.kind {
        BrokerKind::Paper => println!("Broker: paper simulation"),
        BrokerKind::Alpaca => println!(
            "Broker: Alpaca ({}), credentials from {} / {}",
            if config.broker.paper { "paper" } else { "live" },
            config.broker.api_key_env,
            config.broker.api_secret_env
        ),
    }
    println!(
        "Timeouts: handshake {}s, acknowledgement {}s, leg pause {}ms",
        config.broker.handshake_timeout_secs,
        config.broker.ack_timeout_secs,
        config.broker.leg_pause_ms
    );
    println!("Informational codes: {:?}", config.broker.informational_codes);
    println!("Backtest capital: {}", config.backtest.initial_capital);
    println!("Backtest commission: {}%", config.backtest.commission_pct);

    Ok(())
}
