//! Strategy registry for creating rule sets by name.

use crate::{
    LsmaRsiConfig, LsmaRsiStrategy, MACrossoverConfig, MACrossoverStrategy, RsiReversionConfig,
    RsiReversionStrategy, StochRsiBandsConfig, StochRsiBandsStrategy,
};
use bracket_core::{error::StrategyError, traits::Strategy, traits::StrategyConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Information about a registered strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Registry key
    pub key: String,
    /// Display name
    pub name: String,
    pub description: String,
    /// Default configuration as JSON
    pub default_config: serde_json::Value,
}

/// Registry for the built-in rule sets.
pub struct StrategyRegistry {
    strategies: BTreeMap<String, StrategyInfo>,
}

fn info<C: Serialize + Default>(key: &str, name: &str, description: &str) -> (String, StrategyInfo) {
    (
        key.to_string(),
        StrategyInfo {
            key: key.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            default_config: serde_json::to_value(C::default()).unwrap_or_default(),
        },
    )
}

/// Parse a parameter object; `null` means all defaults.
fn parse_config<C: DeserializeOwned + StrategyConfig>(
    config: serde_json::Value,
) -> Result<C, StrategyError> {
    let config = if config.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        config
    };
    let config: C =
        serde_json::from_value(config).map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

impl StrategyRegistry {
    /// Create a new strategy registry with all built-in strategies.
    pub fn new() -> Self {
        let strategies = [
            info::<LsmaRsiConfig>(
                "lsma_rsi",
                "LSMA RSI",
                "Trend entries above/below the least-squares MA confirmed by RSI direction",
            ),
            info::<StochRsiBandsConfig>(
                "stoch_rsi_bands",
                "StochRSI Bands",
                "Long on a Stochastic RSI %K/%D cross above the lower Bollinger band",
            ),
            info::<MACrossoverConfig>(
                "ma_crossover",
                "MA Crossover",
                "Generates signals based on fast/slow moving average crossovers",
            ),
            info::<RsiReversionConfig>(
                "rsi_reversion",
                "RSI Reversion",
                "Buys RSI oversold readings and exits on overbought",
            ),
        ]
        .into_iter()
        .collect();

        Self { strategies }
    }

    /// List all available strategies, ordered by key.
    pub fn list(&self) -> Vec<&StrategyInfo> {
        self.strategies.values().collect()
    }

    /// Get strategy info by name.
    pub fn get(&self, name: &str) -> Option<&StrategyInfo> {
        self.strategies.get(name)
    }

    /// Check if a strategy exists.
    pub fn exists(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Get all strategy names.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    /// Validate a parameter object without building the strategy.
    pub fn validate(&self, name: &str, config: serde_json::Value) -> Result<(), StrategyError> {
        self.create(name, config).map(|_| ())
    }

    /// Create a strategy instance from configuration. Omitted fields take
    /// their defaults.
    pub fn create(
        &self,
        name: &str,
        config: serde_json::Value,
    ) -> Result<Box<dyn Strategy>, StrategyError> {
        match name {
            "lsma_rsi" => Ok(Box::new(LsmaRsiStrategy::new(parse_config(config)?))),
            "stoch_rsi_bands" => Ok(Box::new(StochRsiBandsStrategy::new(parse_config(config)?))),
            "ma_crossover" => Ok(Box::new(MACrossoverStrategy::new(parse_config(config)?))),
            "rsi_reversion" => Ok(Box::new(RsiReversionStrategy::new(parse_config(config)?))),
            _ => Err(StrategyError::NotFound(name.to_string())),
        }
    }

    /// Create a strategy with default configuration.
    pub fn create_default(&self, name: &str) -> Result<Box<dyn Strategy>, StrategyError> {
        self.create(name, serde_json::Value::Null)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_list() {
        let registry = StrategyRegistry::new();
        assert_eq!(registry.list().len(), 4);
        assert_eq!(
            registry.names(),
            vec!["lsma_rsi", "ma_crossover", "rsi_reversion", "stoch_rsi_bands"]
        );
    }

    #[test]
    fn test_registry_get() {
        let registry = StrategyRegistry::new();

        assert!(registry.get("ma_crossover").is_some());
        assert!(registry.exists("lsma_rsi"));
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_create_default() {
        let registry = StrategyRegistry::new();

        for name in registry.names() {
            let strategy = registry.create_default(name).unwrap();
            assert_eq!(strategy.name(), registry.get(name).unwrap().name);
        }
    }

    #[test]
    fn test_create_with_partial_config() {
        let registry = StrategyRegistry::new();

        let strategy = registry
            .create("ma_crossover", serde_json::json!({ "fast_period": 5, "slow_period": 10 }))
            .unwrap();
        assert_eq!(strategy.warmup_period(), 10);
        assert_eq!(strategy.params()["risk_multiplier"], 2.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let registry = StrategyRegistry::new();

        let result = registry.validate("ma_crossover", serde_json::json!({ "fast_period": 30 }));
        assert!(matches!(result, Err(StrategyError::InvalidConfig(_))));

        let result = registry.create("lsma_rsi", serde_json::json!({ "lsma_period": "long" }));
        assert!(matches!(result, Err(StrategyError::InvalidConfig(_))));
    }

    #[test]
    fn test_create_unknown_strategy() {
        let registry = StrategyRegistry::new();

        let result = registry.create_default("unknown");
        assert!(matches!(result, Err(StrategyError::NotFound(_))));
    }
}
