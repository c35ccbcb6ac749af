//! Configuration structures.

use std::time::Duration;

use bracket_backtest::BacktestConfig;
use bracket_broker::{AlpacaConfig, SubmitterSettings};
use bracket_core::error::BrokerError;
use bracket_core::types::Timeframe;
use config::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub broker: BrokerSettings,
    #[serde(default)]
    pub backtest: BacktestSettings,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging.validate()?;
        self.broker.validate()?;
        self.backtest.validate()
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "bracket".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Daily-rotated log file, in addition to stderr
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format == "json"
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(ConfigError::Message(format!(
                "logging.format must be pretty or json, got {other}"
            ))),
        }
    }
}

/// Which broker connection to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrokerKind {
    #[default]
    Paper,
    Alpaca,
}

/// Broker connection and submission settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    pub kind: BrokerKind,
    /// Use the broker's paper account (Alpaca)
    pub paper: bool,
    pub api_key_env: String,
    pub api_secret_env: String,
    pub handshake_timeout_secs: u64,
    pub ack_timeout_secs: u64,
    pub leg_pause_ms: u64,
    /// Notice codes that are logged and never treated as failures
    pub informational_codes: Vec<i32>,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        let submitter = SubmitterSettings::default();
        let mut informational_codes: Vec<i32> =
            submitter.informational_codes.into_iter().collect();
        informational_codes.sort_unstable();
        Self {
            kind: BrokerKind::Paper,
            paper: true,
            api_key_env: "ALPACA_API_KEY".to_string(),
            api_secret_env: "ALPACA_API_SECRET".to_string(),
            handshake_timeout_secs: submitter.handshake_timeout.as_secs(),
            ack_timeout_secs: submitter.ack_timeout.as_secs(),
            leg_pause_ms: submitter.leg_pause.as_millis() as u64,
            informational_codes,
        }
    }
}

impl BrokerSettings {
    pub fn submitter_settings(&self) -> SubmitterSettings {
        SubmitterSettings {
            handshake_timeout: Duration::from_secs(self.handshake_timeout_secs),
            ack_timeout: Duration::from_secs(self.ack_timeout_secs),
            leg_pause: Duration::from_millis(self.leg_pause_ms),
            informational_codes: self.informational_codes.iter().copied().collect(),
        }
    }

    /// Alpaca credentials from the configured environment variables.
    pub fn alpaca_config(&self) -> Result<AlpacaConfig, BrokerError> {
        AlpacaConfig::from_env(&self.api_key_env, &self.api_secret_env, self.paper)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.handshake_timeout_secs == 0 || self.ack_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "broker timeouts must be at least one second".into(),
            ));
        }
        Ok(())
    }
}

/// Backtest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_capital: Decimal,
    /// Fee per fill, in percent of the filled value
    pub commission_pct: Decimal,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            initial_capital: dec!(10000),
            commission_pct: Decimal::ZERO,
        }
    }
}

impl BacktestSettings {
    /// Engine configuration for one symbol.
    pub fn engine_config(&self, symbol: &str, timeframe: Timeframe) -> BacktestConfig {
        BacktestConfig {
            symbol: symbol.to_string(),
            timeframe,
            initial_capital: self.initial_capital,
            commission_pct: self.commission_pct,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(ConfigError::Message(
                "backtest.initial_capital must be positive".into(),
            ));
        }
        if self.commission_pct < Decimal::ZERO || self.commission_pct >= Decimal::ONE_HUNDRED {
            return Err(ConfigError::Message(
                "backtest.commission_pct must be in [0, 100)".into(),
            ));
        }
        Ok(())
    }
}
