//! In-process broker simulation.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bracket_core::error::BrokerError;
use bracket_core::traits::{BrokerConnection, BrokerEvent, EventReceiver, EventSender};
use bracket_core::types::{OrderLeg, OrderStatus};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// How the simulated broker answers a transmitted bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperMode {
    /// Report every held leg as pending, then submitted.
    Acknowledge,
    /// Accept the legs and never answer.
    Silent,
    /// Answer with an error event carrying this code for the parent order.
    Reject(i32),
}

/// Shared view of every leg the connection accepted.
#[derive(Debug, Clone, Default)]
pub struct PlacedOrders(Arc<Mutex<Vec<OrderLeg>>>);

impl PlacedOrders {
    fn record(&self, leg: &OrderLeg) {
        if let Ok(mut legs) = self.0.lock() {
            legs.push(leg.clone());
        }
    }

    pub fn snapshot(&self) -> Vec<OrderLeg> {
        self.0.lock().map(|legs| legs.clone()).unwrap_or_default()
    }
}

/// Simulated broker session.
///
/// Legs are held until one arrives with `transmit` set, then answered
/// according to the [`PaperMode`].
pub struct PaperConnection {
    mode: PaperMode,
    events: EventSender,
    connected: bool,
    handshake: bool,
    first_order_id: u64,
    held: Vec<OrderLeg>,
    placed: PlacedOrders,
    placements: usize,
    fail_on: Option<usize>,
}

impl PaperConnection {
    pub fn new(mode: PaperMode) -> (Self, EventReceiver) {
        let (events, receiver) = mpsc::unbounded_channel();
        let conn = Self {
            mode,
            events,
            connected: false,
            handshake: true,
            first_order_id: 1,
            held: Vec::new(),
            placed: PlacedOrders::default(),
            placements: 0,
            fail_on: None,
        };
        (conn, receiver)
    }

    /// Order id announced on connect.
    pub fn with_first_order_id(mut self, id: u64) -> Self {
        self.first_order_id = id;
        self
    }

    /// Connect without ever announcing an order id.
    pub fn without_handshake(mut self) -> Self {
        self.handshake = false;
        self
    }

    /// Fail the `index`-th placement (0-based, counted over the session).
    pub fn fail_leg(mut self, index: usize) -> Self {
        self.fail_on = Some(index);
        self
    }

    pub fn placed_orders(&self) -> PlacedOrders {
        self.placed.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn emit(&self, event: BrokerEvent) -> Result<(), BrokerError> {
        self.events
            .send(event)
            .map_err(|_| BrokerError::Connection("event receiver dropped".into()))
    }

    fn answer(&mut self) -> Result<(), BrokerError> {
        let legs = std::mem::take(&mut self.held);
        match self.mode {
            PaperMode::Acknowledge => {
                self.emit(farm_notice())?;
                for leg in &legs {
                    self.emit(BrokerEvent::OpenOrder {
                        order_id: leg.order_id,
                        status: OrderStatus::Pending,
                    })?;
                    self.emit(BrokerEvent::OrderStatus {
                        order_id: leg.order_id,
                        status: OrderStatus::Submitted,
                        filled: Decimal::ZERO,
                        avg_fill_price: None,
                    })?;
                }
            }
            PaperMode::Silent => debug!(legs = legs.len(), "Paper broker staying silent"),
            PaperMode::Reject(code) => {
                let parent = legs
                    .iter()
                    .find(|leg| leg.parent_id.is_none())
                    .or(legs.first())
                    .map(|leg| leg.order_id);
                self.emit(BrokerEvent::Error {
                    req_id: parent,
                    code,
                    message: "Order rejected by paper broker".into(),
                })?;
            }
        }
        Ok(())
    }
}

fn farm_notice() -> BrokerEvent {
    BrokerEvent::Error {
        req_id: None,
        code: 2104,
        message: "Market data farm connection is OK".into(),
    }
}

#[async_trait]
impl BrokerConnection for PaperConnection {
    fn name(&self) -> &str {
        "paper"
    }

    async fn connect(&mut self) -> Result<(), BrokerError> {
        self.connected = true;
        info!(mode = ?self.mode, "Paper broker connected");
        if self.handshake {
            self.emit(BrokerEvent::NextValidId(self.first_order_id))?;
            self.emit(farm_notice())?;
        }
        Ok(())
    }

    async fn place_order(&mut self, leg: &OrderLeg) -> Result<(), BrokerError> {
        if !self.connected {
            return Err(BrokerError::NotConnected);
        }

        let index = self.placements;
        self.placements += 1;
        if self.fail_on == Some(index) {
            return Err(BrokerError::OrderRejected(format!(
                "simulated failure placing order {}",
                leg.order_id
            )));
        }

        debug!(
            order_id = leg.order_id,
            side = %leg.side,
            order_type = %leg.order_type,
            price = ?leg.price(),
            "Paper broker accepted leg"
        );
        self.placed.record(leg);
        self.held.push(leg.clone());

        if leg.transmit {
            self.answer()?;
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), BrokerError> {
        self.connected = false;
        self.held.clear();
        Ok(())
    }
}
