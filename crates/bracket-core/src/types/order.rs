//! Order types and structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" | "long" => Ok(Side::Buy),
            "sell" | "short" => Ok(Side::Sell),
            _ => Err(format!("Invalid side: {}", s)),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Execute immediately at best available price
    Market,
    /// Execute at specified price or better
    Limit,
    /// Becomes a market order when the stop price is reached
    Stop,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Market => write!(f, "MKT"),
            OrderType::Limit => write!(f, "LMT"),
            OrderType::Stop => write!(f, "STP"),
        }
    }
}

/// Time in force for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Valid for the trading day only
    Day,
    /// Good til canceled
    #[default]
    #[serde(rename = "gtc")]
    GTC,
}

impl std::fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeInForce::Day => write!(f, "DAY"),
            TimeInForce::GTC => write!(f, "GTC"),
        }
    }
}

/// Order status as reported by a broker connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Known to the broker, not yet working (PendingSubmit / PreSubmitted)
    Pending,
    /// Order submitted to the exchange
    Submitted,
    /// Order accepted by broker/exchange
    Accepted,
    /// Order partially filled
    PartiallyFilled,
    /// Order completely filled
    Filled,
    /// Order canceled
    Canceled,
    /// Order rejected
    Rejected,
    /// Order expired
    Expired,
}

impl OrderStatus {
    /// Check if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Canceled
                | OrderStatus::Rejected
                | OrderStatus::Expired
        )
    }

    /// Statuses that confirm the broker has taken the order.
    pub fn is_acknowledgement(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending
                | OrderStatus::Submitted
                | OrderStatus::Accepted
                | OrderStatus::PartiallyFilled
                | OrderStatus::Filled
        )
    }

    /// Map a broker status string onto a status.
    ///
    /// Accepts both TWS-style (`PreSubmitted`, `Inactive`) and REST-style
    /// (`pending_new`, `partially_filled`) spellings.
    pub fn from_broker(status: &str) -> Option<Self> {
        let status = match status.to_lowercase().as_str() {
            "pendingsubmit" | "presubmitted" | "pending_new" | "new" | "apipending" => {
                OrderStatus::Pending
            }
            // A cancel or replace still in flight leaves the order live
            "submitted" | "pendingcancel" | "pending_cancel" | "pending_replace" => {
                OrderStatus::Submitted
            }
            "accepted" | "accepted_for_bidding" | "held" => OrderStatus::Accepted,
            "partially_filled" | "partiallyfilled" => OrderStatus::PartiallyFilled,
            "filled" => OrderStatus::Filled,
            "cancelled" | "canceled" | "apicancelled" => OrderStatus::Canceled,
            "rejected" | "inactive" => OrderStatus::Rejected,
            "expired" => OrderStatus::Expired,
            _ => return None,
        };
        Some(status)
    }
}

/// One leg of an order as handed to a broker connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLeg {
    /// Broker order id
    pub order_id: u64,
    /// Parent order id for child legs
    pub parent_id: Option<u64>,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    /// Limit price (limit orders)
    pub limit_price: Option<Decimal>,
    /// Trigger price (stop orders)
    pub stop_price: Option<Decimal>,
    pub time_in_force: TimeInForce,
    /// When false the broker holds the leg until a later leg transmits
    pub transmit: bool,
}

impl OrderLeg {
    /// Price that characterises the leg, whichever kind it is.
    pub fn price(&self) -> Option<Decimal> {
        self.limit_price.or(self.stop_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite_and_parse() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
        assert_eq!("SELL".parse::<Side>().unwrap(), Side::Sell);
        assert!("hold".parse::<Side>().is_err());
    }

    #[test]
    fn test_status_from_broker() {
        assert_eq!(OrderStatus::from_broker("PreSubmitted"), Some(OrderStatus::Pending));
        assert_eq!(OrderStatus::from_broker("Submitted"), Some(OrderStatus::Submitted));
        assert_eq!(OrderStatus::from_broker("filled"), Some(OrderStatus::Filled));
        assert_eq!(OrderStatus::from_broker("Inactive"), Some(OrderStatus::Rejected));
        assert_eq!(OrderStatus::from_broker("weird"), None);
        assert_eq!(OrderStatus::from_broker("PendingCancel"), Some(OrderStatus::Submitted));
        assert_eq!(OrderStatus::from_broker("pending_cancel"), Some(OrderStatus::Submitted));
        assert!(OrderStatus::from_broker("PendingCancel").unwrap().is_acknowledgement());
    }

    #[test]
    fn test_acknowledgement_statuses() {
        assert!(OrderStatus::Pending.is_acknowledgement());
        assert!(OrderStatus::Filled.is_acknowledgement());
        assert!(!OrderStatus::Rejected.is_acknowledgement());
        assert!(!OrderStatus::Canceled.is_acknowledgement());
        assert!(OrderStatus::Rejected.is_terminal());
    }
}
