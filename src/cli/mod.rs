//! CLI definitions.

pub mod commands;

use bracket_core::types::{Side, Timeframe};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bracket")]
#[command(author, version, about = "Signal evaluation and bracket-order submission")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "BRACKET_CONFIG")]
    pub config: PathBuf,

    /// Log level (defaults to logging.level from the configuration)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay historical bars through a strategy
    Backtest(BacktestArgs),
    /// Evaluate the latest bar and optionally submit the resulting bracket
    Signal(SignalArgs),
    /// Submit one bracket order
    Bracket(BracketArgs),
    /// List available strategies
    Strategies,
    /// Validate configuration
    ValidateConfig,
}

/// Strategy selection shared by commands that evaluate bars.
#[derive(clap::Args)]
pub struct StrategyArgs {
    /// Strategy to run (see `strategies`)
    #[arg(short, long)]
    pub strategy: String,

    /// Strategy parameters as inline JSON, e.g. '{"fast_period": 5}'
    #[arg(long, conflicts_with = "strategy_config")]
    pub params: Option<String>,

    /// Strategy parameters from a JSON file
    #[arg(long)]
    pub strategy_config: Option<PathBuf>,

    /// Data file (CSV)
    #[arg(long)]
    pub data: PathBuf,

    /// Sort and de-duplicate bars instead of rejecting out-of-order data
    #[arg(long)]
    pub sort: bool,

    /// Symbol the data belongs to
    #[arg(short = 'S', long, default_value = "DATA")]
    pub symbol: String,

    /// Timeframe
    #[arg(short, long, default_value = "1d")]
    pub timeframe: Timeframe,
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// Initial capital (overrides backtest.initial_capital)
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// Fee per fill in percent (overrides backtest.commission_pct)
    #[arg(long)]
    pub commission_pct: Option<Decimal>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Save the JSON report to a file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Save the equity curve as CSV
    #[arg(long)]
    pub equity_csv: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PositionArg {
    Flat,
    Long,
    Short,
}

#[derive(clap::Args)]
pub struct SignalArgs {
    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// Position currently held
    #[arg(long, value_enum, default_value = "flat")]
    pub position: PositionArg,

    /// Entry price of the held position
    #[arg(long, required_if_eq_any([("position", "long"), ("position", "short")]))]
    pub entry: Option<Decimal>,

    /// Submit the bracket when the decision is an entry
    #[arg(long, requires = "quantity")]
    pub submit: bool,

    /// Quantity to submit
    #[arg(long)]
    pub quantity: Option<Decimal>,

    /// Decimal places prices are rounded to before submission
    #[arg(long, default_value = "2")]
    pub price_decimals: u32,
}

#[derive(clap::Args)]
pub struct BracketArgs {
    /// Symbol to trade
    #[arg(short = 'S', long)]
    pub symbol: String,

    /// buy/long or sell/short
    #[arg(long)]
    pub side: Side,

    #[arg(long)]
    pub quantity: Decimal,

    /// Entry limit price (reference price with --market)
    #[arg(long)]
    pub entry: Decimal,

    /// Protective stop price
    #[arg(long)]
    pub stop: Decimal,

    /// Take-profit price
    #[arg(long)]
    pub target: Decimal,

    /// Enter at market instead of with a limit order
    #[arg(long)]
    pub market: bool,

    /// Validate and print the legs without contacting a broker
    #[arg(long)]
    pub dry_run: bool,
}
