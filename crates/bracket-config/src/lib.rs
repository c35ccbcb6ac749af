//! Configuration management.
//!
//! Settings come from a TOML file, overridden by `BRACKET__<SECTION>__<KEY>`
//! environment variables.

mod settings;

pub use settings::{
    AppConfig, AppSettings, BacktestSettings, BrokerKind, BrokerSettings, LoggingConfig,
};

use config::{Config, ConfigError, Environment, File, FileFormat};
use std::path::Path;

fn environment() -> Environment {
    Environment::with_prefix("BRACKET")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("broker.informational_codes")
}

/// Load configuration from file and environment.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(environment())
        .build()?;

    let config: AppConfig = config.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from TOML text, without environment overrides.
pub fn parse_config(toml: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?
        .try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Render a configuration back to TOML.
pub fn to_toml(config: &AppConfig) -> Result<String, ConfigError> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::Message(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.broker.kind, BrokerKind::Paper);
        assert_eq!(config.backtest.initial_capital, dec!(10000));
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = parse_config(
            r#"
            [logging]
            level = "debug"
            format = "json"

            [broker]
            kind = "alpaca"
            ack_timeout_secs = 2
            leg_pause_ms = 0
            informational_codes = [2104]

            [backtest]
            initial_capital = 2500
            commission_pct = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.format, "json");
        assert_eq!(config.broker.kind, BrokerKind::Alpaca);
        let submitter = config.broker.submitter_settings();
        assert_eq!(submitter.ack_timeout, Duration::from_secs(2));
        assert!(submitter.leg_pause.is_zero());
        assert!(submitter.is_informational(2104));
        assert!(!submitter.is_informational(2106));
        assert_eq!(config.backtest.initial_capital, dec!(2500));
        assert_eq!(config.backtest.commission_pct, dec!(0.1));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse_config("[broker]\nack_timeout_secs = 0").is_err());
        assert!(parse_config("[backtest]\ninitial_capital = -5").is_err());
        assert!(parse_config("[logging]\nformat = \"xml\"").is_err());
        assert!(parse_config("[broker]\nkind = \"fix\"").is_err());
        assert!(parse_config("[backtest]\ncommission_pct = 100").is_err());
        assert!(parse_config("[backtest]\ncommission_pct = 150").is_err());
        assert!(parse_config("[backtest]\ncommission_pct = 0.25").is_ok());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = AppConfig::default();
        let text = to_toml(&config).unwrap();
        let parsed = parse_config(&text).unwrap();
        assert_eq!(parsed.broker.handshake_timeout_secs, config.broker.handshake_timeout_secs);
    }
}
