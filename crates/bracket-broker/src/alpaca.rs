//! Alpaca REST connection.
//!
//! Alpaca accepts a bracket as a single order with `order_class = "bracket"`,
//! so the three legs are buffered until the transmitting one arrives and
//! then posted together.

use async_trait::async_trait;
use bracket_core::error::BrokerError;
use bracket_core::traits::{BrokerConnection, BrokerEvent, EventReceiver, EventSender};
use bracket_core::types::{OrderLeg, OrderStatus, OrderType, TimeInForce};
use chrono::Utc;
use reqwest::{header, Client};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Alpaca API configuration.
#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    pub api_key: String,
    pub api_secret: String,
    pub paper: bool,
    /// Prefix of every `client_order_id` sent in this session
    pub client_order_prefix: String,
}

impl AlpacaConfig {
    pub fn new(api_key: String, api_secret: String, paper: bool) -> Self {
        let session = Uuid::new_v4().simple().to_string();
        Self {
            api_key,
            api_secret,
            paper,
            client_order_prefix: format!("bkt-{}", &session[..8]),
        }
    }

    /// Load credentials from the named environment variables.
    pub fn from_env(key_env: &str, secret_env: &str, paper: bool) -> Result<Self, BrokerError> {
        let api_key = std::env::var(key_env)
            .map_err(|_| BrokerError::Configuration(format!("{key_env} not set")))?;
        let api_secret = std::env::var(secret_env)
            .map_err(|_| BrokerError::Configuration(format!("{secret_env} not set")))?;
        Ok(Self::new(api_key, api_secret, paper))
    }

    pub fn base_url(&self) -> &str {
        if self.paper {
            "https://paper-api.alpaca.markets"
        } else {
            "https://api.alpaca.markets"
        }
    }
}

#[derive(Debug, Deserialize)]
struct AlpacaAccount {
    status: String,
    #[serde(default)]
    trading_blocked: bool,
}

#[derive(Debug, Deserialize)]
struct AlpacaOrder {
    status: String,
    #[serde(default)]
    filled_qty: Option<String>,
    #[serde(default)]
    filled_avg_price: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
struct LimitLeg {
    limit_price: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct StopLeg {
    stop_price: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct BracketOrderRequest {
    symbol: String,
    qty: String,
    side: String,
    #[serde(rename = "type")]
    order_type: String,
    time_in_force: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit_price: Option<String>,
    order_class: &'static str,
    client_order_id: String,
    take_profit: LimitLeg,
    stop_loss: StopLeg,
}

/// Fold buffered legs into one bracket request.
///
/// Needs exactly one parent and one child of each kind (stop and limit).
fn build_request(legs: &[OrderLeg], prefix: &str) -> Result<BracketOrderRequest, BrokerError> {
    let parent = legs
        .iter()
        .find(|leg| leg.parent_id.is_none())
        .ok_or_else(|| BrokerError::OrderRejected("bracket has no parent leg".into()))?;
    let children = || {
        legs.iter()
            .filter(move |leg| leg.parent_id == Some(parent.order_id))
    };
    let stop = children()
        .find(|leg| leg.order_type == OrderType::Stop)
        .and_then(|leg| leg.stop_price)
        .ok_or_else(|| BrokerError::OrderRejected("bracket has no stop-loss leg".into()))?;
    let target = children()
        .find(|leg| leg.order_type == OrderType::Limit)
        .and_then(|leg| leg.limit_price)
        .ok_or_else(|| BrokerError::OrderRejected("bracket has no take-profit leg".into()))?;

    let order_type = match parent.order_type {
        OrderType::Market => "market",
        OrderType::Limit => "limit",
        OrderType::Stop => "stop",
    };
    let time_in_force = match parent.time_in_force {
        TimeInForce::Day => "day",
        TimeInForce::GTC => "gtc",
    };

    Ok(BracketOrderRequest {
        symbol: parent.symbol.clone(),
        qty: parent.quantity.to_string(),
        side: parent.side.to_string().to_lowercase(),
        order_type: order_type.to_string(),
        time_in_force: time_in_force.to_string(),
        limit_price: parent.limit_price.map(|p| p.to_string()),
        order_class: "bracket",
        client_order_id: format!("{prefix}-{}", parent.order_id),
        take_profit: LimitLeg {
            limit_price: target.to_string(),
        },
        stop_loss: StopLeg {
            stop_price: stop.to_string(),
        },
    })
}

/// Broker session over the Alpaca trading API.
pub struct AlpacaConnection {
    config: AlpacaConfig,
    client: Client,
    events: EventSender,
    connected: bool,
    buffered: Vec<OrderLeg>,
}

impl AlpacaConnection {
    pub fn new(config: AlpacaConfig) -> Result<(Self, EventReceiver), BrokerError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "APCA-API-KEY-ID",
            header::HeaderValue::from_str(&config.api_key)
                .map_err(|e| BrokerError::Configuration(e.to_string()))?,
        );
        headers.insert(
            "APCA-API-SECRET-KEY",
            header::HeaderValue::from_str(&config.api_secret)
                .map_err(|e| BrokerError::Configuration(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        let (events, receiver) = mpsc::unbounded_channel();
        let conn = Self {
            config,
            client,
            events,
            connected: false,
            buffered: Vec::new(),
        };
        Ok((conn, receiver))
    }

    fn emit(&self, event: BrokerEvent) -> Result<(), BrokerError> {
        self.events
            .send(event)
            .map_err(|_| BrokerError::Connection("event receiver dropped".into()))
    }

    /// Report an HTTP failure on the event channel and turn it into an error.
    async fn http_failure(
        &self,
        req_id: Option<u64>,
        resp: reqwest::Response,
    ) -> Result<BrokerError, BrokerError> {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        warn!(status = %status, body = %text, "Alpaca request failed");
        self.emit(BrokerEvent::Error {
            req_id,
            code: i32::from(status.as_u16()),
            message: text.clone(),
        })?;
        Ok(BrokerError::ApiError(format!("{status}: {text}")))
    }

    async fn post_bracket(&mut self) -> Result<(), BrokerError> {
        let legs = std::mem::take(&mut self.buffered);
        let request = build_request(&legs, &self.config.client_order_prefix)?;
        let parent_id = legs
            .iter()
            .find(|leg| leg.parent_id.is_none())
            .map(|leg| leg.order_id)
            .unwrap_or_default();

        debug!(client_order_id = %request.client_order_id, "Posting bracket order");
        let url = format!("{}/v2/orders", self.config.base_url());
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(self.http_failure(Some(parent_id), resp).await?);
        }

        let order: AlpacaOrder = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;
        let status = accepted_status(&order.status);

        info!(parent_id, status = ?status, "Alpaca accepted bracket");
        self.emit(BrokerEvent::OrderStatus {
            order_id: parent_id,
            status,
            filled: order
                .filled_qty
                .and_then(|q| q.parse().ok())
                .unwrap_or(Decimal::ZERO),
            avg_fill_price: order.filled_avg_price.and_then(|p| p.parse().ok()),
        })
    }
}

/// Status of an order the API has already accepted (HTTP 2xx).
///
/// The order is live at this point, so an unfamiliar status is reported as
/// submitted rather than as a failure.
fn accepted_status(raw: &str) -> OrderStatus {
    OrderStatus::from_broker(raw).unwrap_or_else(|| {
        warn!(status = raw, "Unrecognised Alpaca order status, treating as submitted");
        OrderStatus::Submitted
    })
}

#[async_trait]
impl BrokerConnection for AlpacaConnection {
    fn name(&self) -> &str {
        if self.config.paper {
            "alpaca-paper"
        } else {
            "alpaca"
        }
    }

    async fn connect(&mut self) -> Result<(), BrokerError> {
        let url = format!("{}/v2/account", self.config.base_url());
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(self.http_failure(None, resp).await?);
        }

        let account: AlpacaAccount = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;
        if account.trading_blocked {
            return Err(BrokerError::Connection(format!(
                "trading blocked on account (status {})",
                account.status
            )));
        }

        self.connected = true;
        info!(status = %account.status, paper = self.config.paper, "Connected to Alpaca");

        // Ids only need to be unique per client_order_id prefix.
        let seed = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(1);
        self.emit(BrokerEvent::NextValidId(seed))
    }

    async fn place_order(&mut self, leg: &OrderLeg) -> Result<(), BrokerError> {
        if !self.connected {
            return Err(BrokerError::NotConnected);
        }
        self.buffered.push(leg.clone());
        if leg.transmit {
            self.post_bracket().await?;
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), BrokerError> {
        self.connected = false;
        self.buffered.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{BracketOrder, BracketSpec};
    use bracket_core::types::Side;
    use rust_decimal_macros::dec;

    fn legs() -> Vec<OrderLeg> {
        let spec = BracketSpec::new("XYZ", Side::Sell, dec!(100), dec!(2.42), dec!(2.59), dec!(1.88));
        BracketOrder::new(40, &spec)
            .legs()
            .iter()
            .map(|(_, leg)| (*leg).clone())
            .collect()
    }

    #[test]
    fn test_request_from_bracket_legs() {
        let request = build_request(&legs(), "bkt-test").unwrap();
        assert_eq!(request.symbol, "XYZ");
        assert_eq!(request.side, "sell");
        assert_eq!(request.order_type, "limit");
        assert_eq!(request.time_in_force, "gtc");
        assert_eq!(request.limit_price.as_deref(), Some("2.42"));
        assert_eq!(request.client_order_id, "bkt-test-40");
        assert_eq!(request.take_profit.limit_price, "1.88");
        assert_eq!(request.stop_loss.stop_price, "2.59");
    }

    #[test]
    fn test_request_json_shape() {
        let request = build_request(&legs(), "p").unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["order_class"], "bracket");
        assert_eq!(json["type"], "limit");
        assert_eq!(json["stop_loss"]["stop_price"], "2.59");
    }

    #[test]
    fn test_incomplete_bracket_rejected() {
        let mut legs = legs();
        legs.truncate(2);
        assert!(matches!(
            build_request(&legs, "p"),
            Err(BrokerError::OrderRejected(_))
        ));
    }

    #[test]
    fn test_config_urls_and_prefix() {
        let paper = AlpacaConfig::new("k".into(), "s".into(), true);
        assert_eq!(paper.base_url(), "https://paper-api.alpaca.markets");
        assert!(paper.client_order_prefix.starts_with("bkt-"));
        let live = AlpacaConfig::new("k".into(), "s".into(), false);
        assert_eq!(live.base_url(), "https://api.alpaca.markets");
    }

    #[tokio::test]
    async fn test_place_requires_connection() {
        let config = AlpacaConfig::new("k".into(), "s".into(), true);
        let (mut conn, _events) = AlpacaConnection::new(config).unwrap();
        let leg = legs().remove(0);
        assert_eq!(conn.place_order(&leg).await, Err(BrokerError::NotConnected));
    }

    #[test]
    fn test_accepted_status_never_fails_a_live_order() {
        assert_eq!(accepted_status("accepted"), OrderStatus::Accepted);
        assert_eq!(accepted_status("pending_cancel"), OrderStatus::Submitted);
        assert_eq!(accepted_status("done_for_day"), OrderStatus::Submitted);
        assert!(accepted_status("calculated").is_acknowledgement());
    }
}
