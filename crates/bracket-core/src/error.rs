//! Error types for the bracket system.

use rust_decimal::Decimal;
use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum BracketError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Invalid bracket levels: {0}")]
    Levels(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Strategy-specific errors.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Strategy not found: {0}")]
    NotFound(String),
}

/// Errors raised by a broker connection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BrokerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("API error: {0}")]
    ApiError(String),
}

/// Data source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("No data available: {0}")]
    NoDataAvailable(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Bars out of order at {index}: {timestamp} follows {previous}")]
    OutOfOrder {
        index: usize,
        previous: i64,
        timestamp: i64,
    },
}

/// Indicator calculation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Single-position ledger errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Position already open ({0})")]
    AlreadyInPosition(String),

    #[error("No open position")]
    NoPosition,

    #[error("Invalid price: {0}")]
    InvalidPrice(Decimal),

    #[error("No cash available to enter")]
    NoCash,

    #[error("Commission must be in [0, 100) percent, got {0}")]
    InvalidCommission(Decimal),

    #[error("Entry size must be positive, got {0}")]
    InvalidSize(Decimal),
}

/// Result type alias.
pub type BracketResult<T> = Result<T, BracketError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn load(fail: bool) -> BracketResult<()> {
        if fail {
            Err(DataError::NoDataAvailable("empty.csv".into()))?;
        }
        Ok(())
    }

    #[test]
    fn test_layer_errors_convert_to_top_level() {
        let err = load(true).unwrap_err();
        assert!(matches!(err, BracketError::Data(_)));
        assert_eq!(err.to_string(), "Data error: No data available: empty.csv");

        let err: BracketError = BrokerError::NotConnected.into();
        assert_eq!(err.to_string(), "Broker error: Not connected");
        assert!(load(false).is_ok());
    }
}
