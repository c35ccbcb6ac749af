//! Signal evaluation and bracket-order submission CLI.

mod cli;
mod logging;

use anyhow::{Context, Result};
use bracket_config::{load_config, AppConfig};
use clap::Parser;
use cli::{Cli, Commands};
use logging::setup_logging;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::ValidateConfig = cli.command {
        return cli::commands::validate::run(&cli.config);
    }

    let config_found = cli.config.exists();
    let config = if config_found {
        load_config(&cli.config)
            .with_context(|| format!("loading configuration from {}", cli.config.display()))?
    } else {
        AppConfig::default()
    };

    let level = cli
        .log_level
        .map(|level| level.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let json = cli.json_logs || config.logging.is_json();
    let _guard = setup_logging(&level, json, &config.logging)?;

    if !config_found {
        warn!(path = %cli.config.display(), "Configuration file not found, using defaults");
    }

    match cli.command {
        Commands::Backtest(args) => cli::commands::backtest::run(args, &config),
        Commands::Signal(args) => cli::commands::signal::run(args, &config).await,
        Commands::Bracket(args) => cli::commands::bracket::run(args, &config).await,
        Commands::Strategies => cli::commands::strategies::run(),
        Commands::ValidateConfig => Ok(()),
    }
}
