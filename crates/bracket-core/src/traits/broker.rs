//! Broker connection trait and the callback events it produces.

use crate::error::BrokerError;
use crate::types::{OrderLeg, OrderStatus};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Asynchronous callbacks from a broker session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerEvent {
    /// Handshake completed; the next order id the session will accept.
    NextValidId(u64),
    /// The broker knows about an order.
    OpenOrder { order_id: u64, status: OrderStatus },
    /// Status update for an order.
    OrderStatus {
        order_id: u64,
        status: OrderStatus,
        filled: Decimal,
        avg_fill_price: Option<Decimal>,
    },
    /// Error or notice. `req_id` names the order it concerns, if any.
    Error {
        req_id: Option<u64>,
        code: i32,
        message: String,
    },
}

impl BrokerEvent {
    /// Order id and status for order-related events.
    pub fn order_status(&self) -> Option<(u64, OrderStatus)> {
        match self {
            BrokerEvent::OpenOrder { order_id, status }
            | BrokerEvent::OrderStatus {
                order_id, status, ..
            } => Some((*order_id, *status)),
            _ => None,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<BrokerEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<BrokerEvent>;

/// A live session with a broker.
///
/// Replies are not returned from calls; they arrive as [`BrokerEvent`]s on
/// the channel handed out when the connection was built.
#[async_trait]
pub trait BrokerConnection: Send {
    /// Get the name of this connection.
    fn name(&self) -> &str;

    /// Open the session. A successful handshake produces
    /// [`BrokerEvent::NextValidId`] on the event channel.
    async fn connect(&mut self) -> Result<(), BrokerError>;

    /// Hand one order leg to the broker.
    async fn place_order(&mut self, leg: &OrderLeg) -> Result<(), BrokerError>;

    /// Close the session.
    async fn disconnect(&mut self) -> Result<(), BrokerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_projection() {
        let event = BrokerEvent::OpenOrder {
            order_id: 7,
            status: OrderStatus::Pending,
        };
        assert_eq!(event.order_status(), Some((7, OrderStatus::Pending)));
        assert_eq!(BrokerEvent::NextValidId(1).order_status(), None);
    }

    #[test]
    fn test_event_json_tag() {
        let json = serde_json::to_string(&BrokerEvent::NextValidId(3)).unwrap();
        assert_eq!(json, r#"{"next_valid_id":3}"#);
    }
}
