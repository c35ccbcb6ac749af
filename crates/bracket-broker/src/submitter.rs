//! Bracket submission with bounded waits.

use std::collections::HashSet;
use std::time::Duration;

use bracket_core::error::BrokerError;
use bracket_core::traits::{BrokerConnection, BrokerEvent, EventReceiver};
use bracket_core::types::OrderStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::bracket::{BracketOrder, BracketSpec, LegKind};

/// Submission failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("Invalid bracket: {0}")]
    InvalidBracket(String),

    #[error("No order id from broker within {0:?}")]
    HandshakeTimeout(Duration),

    #[error("No acknowledgement for bracket {parent_id} within {waited:?}")]
    AckTimeout { parent_id: u64, waited: Duration },

    #[error("Order {order_id} rejected: {reason}")]
    Rejected { order_id: u64, reason: String },

    #[error("Placing {leg} leg (order {order_id}) failed: {source}")]
    Placement {
        leg: LegKind,
        order_id: u64,
        source: BrokerError,
    },

    #[error("Submitter halted after an unacknowledged bracket; resume required")]
    Halted,

    #[error("Broker event stream closed")]
    Disconnected,

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// Timing and filtering knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitterSettings {
    /// How long to wait for the first order id after connecting
    pub handshake_timeout: Duration,
    /// How long to wait for the broker to acknowledge a bracket
    pub ack_timeout: Duration,
    /// Pause between legs
    pub leg_pause: Duration,
    /// Broker notice codes that are status chatter, not failures
    pub informational_codes: HashSet<i32>,
}

impl Default for SubmitterSettings {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(5),
            ack_timeout: Duration::from_secs(5),
            leg_pause: Duration::from_millis(100),
            // Market data farm / HMDS farm connection OK, sec-def farm OK
            informational_codes: [2104, 2106, 2158].into_iter().collect(),
        }
    }
}

impl SubmitterSettings {
    pub fn is_informational(&self, code: i32) -> bool {
        self.informational_codes.contains(&code)
    }
}

/// A bracket the broker has acknowledged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub parent_id: u64,
    pub order_ids: [u64; 3],
    /// Leg whose status update counted as the acknowledgement
    pub acknowledged_by: u64,
    pub status: OrderStatus,
    pub risk_reward: Decimal,
}

/// Places brackets on a connection, one at a time.
///
/// After an acknowledgement timeout the broker-side state of the bracket is
/// unknown, so the submitter refuses further brackets until [`resume`] is
/// called.
///
/// [`resume`]: OrderSubmitter::resume
pub struct OrderSubmitter<C: BrokerConnection> {
    conn: C,
    events: EventReceiver,
    settings: SubmitterSettings,
    next_id: u64,
    halted: bool,
}

impl<C: BrokerConnection> OrderSubmitter<C> {
    /// Open the connection and wait for the broker's first valid order id.
    pub async fn connect(
        mut conn: C,
        mut events: EventReceiver,
        settings: SubmitterSettings,
    ) -> Result<Self, SubmitError> {
        info!(broker = conn.name(), "Connecting");
        conn.connect().await?;

        let next_id = match timeout(
            settings.handshake_timeout,
            Self::wait_for_next_id(&mut events, &settings),
        )
        .await
        {
            Ok(Ok(id)) => id,
            Ok(Err(e)) => {
                error!(broker = conn.name(), error = %e, "Handshake failed");
                let _ = conn.disconnect().await;
                return Err(e);
            }
            Err(_) => {
                error!(
                    broker = conn.name(),
                    timeout = ?settings.handshake_timeout,
                    "No order id from broker"
                );
                // Best effort, the handshake failure is what gets reported
                let _ = conn.disconnect().await;
                return Err(SubmitError::HandshakeTimeout(settings.handshake_timeout));
            }
        };

        info!(broker = conn.name(), next_id, "Connected");
        Ok(Self {
            conn,
            events,
            settings,
            next_id,
            halted: false,
        })
    }

    async fn wait_for_next_id(
        events: &mut EventReceiver,
        settings: &SubmitterSettings,
    ) -> Result<u64, SubmitError> {
        loop {
            match events.recv().await.ok_or(SubmitError::Disconnected)? {
                BrokerEvent::NextValidId(id) => return Ok(id),
                BrokerEvent::Error { code, message, .. } => {
                    log_notice(settings, None, code, &message)
                }
                other => debug!(?other, "Ignoring event during handshake"),
            }
        }
    }

    pub fn settings(&self) -> &SubmitterSettings {
        &self.settings
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Id the next bracket's parent will get.
    pub fn next_order_id(&self) -> u64 {
        self.next_id
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Accept brackets again after a halt.
    pub fn resume(&mut self) {
        if self.halted {
            warn!("Submitter resumed by operator");
        }
        self.halted = false;
    }

    /// Validate, place and confirm one bracket.
    ///
    /// Nothing is placed when validation fails. A failed leg is reported
    /// as is; legs already placed are left with the broker.
    pub async fn submit(&mut self, spec: &BracketSpec) -> Result<SubmitReceipt, SubmitError> {
        if self.halted {
            return Err(SubmitError::Halted);
        }
        spec.validate()?;

        self.drain_stale_events();

        let bracket = BracketOrder::new(self.next_id, spec);
        self.next_id += 3;
        info!(
            symbol = %spec.symbol,
            side = %spec.side,
            quantity = %spec.quantity,
            entry = %spec.entry_price,
            stop = %spec.stop_price,
            target = %spec.target_price,
            parent_id = bracket.parent_id(),
            "Submitting bracket"
        );

        for (i, (kind, leg)) in bracket.legs().into_iter().enumerate() {
            if i > 0 && !self.settings.leg_pause.is_zero() {
                sleep(self.settings.leg_pause).await;
            }
            debug!(leg = %kind, order_id = leg.order_id, transmit = leg.transmit, "Placing leg");
            self.conn
                .place_order(leg)
                .await
                .map_err(|source| SubmitError::Placement {
                    leg: kind,
                    order_id: leg.order_id,
                    source,
                })?;
        }

        let ack_timeout = self.settings.ack_timeout;
        let (acknowledged_by, status) = match timeout(ack_timeout, self.await_ack(&bracket)).await {
            Ok(result) => result?,
            Err(_) => {
                self.halted = true;
                error!(
                    parent_id = bracket.parent_id(),
                    timeout = ?ack_timeout,
                    "Bracket not acknowledged, halting submissions"
                );
                return Err(SubmitError::AckTimeout {
                    parent_id: bracket.parent_id(),
                    waited: ack_timeout,
                });
            }
        };

        info!(parent_id = bracket.parent_id(), acknowledged_by, ?status, "Bracket acknowledged");
        Ok(SubmitReceipt {
            parent_id: bracket.parent_id(),
            order_ids: bracket.order_ids(),
            acknowledged_by,
            status,
            risk_reward: spec.risk_reward(),
        })
    }

    /// Events left over from earlier brackets must not count for this one.
    fn drain_stale_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                BrokerEvent::Error {
                    req_id,
                    code,
                    message,
                } => log_notice(&self.settings, req_id, code, &message),
                BrokerEvent::NextValidId(id) => self.next_id = self.next_id.max(id),
                other => debug!(?other, "Stale broker event"),
            }
        }
    }

    async fn await_ack(&mut self, bracket: &BracketOrder) -> Result<(u64, OrderStatus), SubmitError> {
        loop {
            let event = self.events.recv().await.ok_or(SubmitError::Disconnected)?;
            match event {
                BrokerEvent::Error {
                    req_id,
                    code,
                    message,
                } => {
                    if self.settings.is_informational(code) {
                        log_notice(&self.settings, req_id, code, &message);
                        continue;
                    }
                    log_notice(&self.settings, req_id, code, &message);
                    if let Some(order_id) = req_id.filter(|id| bracket.contains(*id)) {
                        return Err(SubmitError::Rejected {
                            order_id,
                            reason: format!("{code}: {message}"),
                        });
                    }
                }
                BrokerEvent::NextValidId(id) => self.next_id = self.next_id.max(id),
                event => {
                    let Some((order_id, status)) = event.order_status() else {
                        continue;
                    };
                    if !bracket.contains(order_id) {
                        debug!(order_id, ?status, "Status for an unrelated order");
                        continue;
                    }
                    if status.is_acknowledgement() {
                        return Ok((order_id, status));
                    }
                    if status.is_terminal() {
                        return Err(SubmitError::Rejected {
                            order_id,
                            reason: format!("status {status:?}"),
                        });
                    }
                }
            }
        }
    }

    /// Disconnect from the broker.
    pub async fn close(mut self) -> Result<(), SubmitError> {
        info!(broker = self.conn.name(), "Disconnecting");
        self.conn.disconnect().await?;
        Ok(())
    }
}

fn log_notice(settings: &SubmitterSettings, req_id: Option<u64>, code: i32, message: &str) {
    if settings.is_informational(code) {
        debug!(?req_id, code, message, "Broker notice");
    } else {
        error!(?req_id, code, message, "Broker error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::{PaperConnection, PaperMode};
    use bracket_core::types::Side;
    use rust_decimal_macros::dec;

    fn fast_settings() -> SubmitterSettings {
        SubmitterSettings {
            handshake_timeout: Duration::from_millis(200),
            ack_timeout: Duration::from_millis(100),
            leg_pause: Duration::from_millis(1),
            ..Default::default()
        }
    }

    fn spec() -> BracketSpec {
        BracketSpec::new("XYZ", Side::Sell, dec!(1000), dec!(2.42), dec!(2.59), dec!(1.88))
    }

    async fn submitter(mode: PaperMode) -> (OrderSubmitter<PaperConnection>, crate::PlacedOrders) {
        let (conn, events) = PaperConnection::new(mode);
        let placed = conn.placed_orders();
        let submitter = OrderSubmitter::connect(conn, events, fast_settings())
            .await
            .unwrap();
        (submitter, placed)
    }

    #[tokio::test]
    async fn test_acknowledged_bracket() {
        let (mut submitter, placed) = submitter(PaperMode::Acknowledge).await;
        let first_id = submitter.next_order_id();

        let receipt = submitter.submit(&spec()).await.unwrap();

        assert_eq!(receipt.parent_id, first_id);
        assert_eq!(receipt.order_ids, [first_id, first_id + 1, first_id + 2]);
        assert!(receipt.status.is_acknowledgement());
        assert!((receipt.risk_reward - dec!(3.18)).abs() < dec!(0.01));

        let legs = placed.snapshot();
        assert_eq!(legs.len(), 3);
        assert_eq!(
            legs.iter().map(|l| l.transmit).collect::<Vec<_>>(),
            vec![false, false, true]
        );
        assert_eq!(submitter.next_order_id(), first_id + 3);
    }

    #[tokio::test]
    async fn test_consecutive_brackets_use_fresh_ids() {
        let (mut submitter, placed) = submitter(PaperMode::Acknowledge).await;

        let first = submitter.submit(&spec()).await.unwrap();
        let second = submitter.submit(&spec()).await.unwrap();

        assert_eq!(second.parent_id, first.parent_id + 3);
        assert_eq!(placed.snapshot().len(), 6);
    }

    #[tokio::test]
    async fn test_invalid_bracket_places_nothing() {
        let (mut submitter, placed) = submitter(PaperMode::Acknowledge).await;
        let mut inverted = spec();
        inverted.stop_price = dec!(1.88);
        inverted.target_price = dec!(2.59);

        let err = submitter.submit(&inverted).await.unwrap_err();

        assert!(matches!(err, SubmitError::InvalidBracket(_)));
        assert!(placed.snapshot().is_empty());
        assert!(!submitter.is_halted());
    }

    #[tokio::test]
    async fn test_ack_timeout_halts_until_resumed() {
        let (mut submitter, placed) = submitter(PaperMode::Silent).await;

        let err = submitter.submit(&spec()).await.unwrap_err();
        assert!(matches!(err, SubmitError::AckTimeout { .. }));
        assert!(submitter.is_halted());
        assert_eq!(placed.snapshot().len(), 3);

        // No further orders while halted
        assert_eq!(submitter.submit(&spec()).await.unwrap_err(), SubmitError::Halted);
        assert_eq!(placed.snapshot().len(), 3);

        submitter.resume();
        assert!(!submitter.is_halted());
    }

    #[tokio::test]
    async fn test_rejection_is_reported() {
        let (mut submitter, _) = submitter(PaperMode::Reject(201)).await;

        let err = submitter.submit(&spec()).await.unwrap_err();
        match err {
            SubmitError::Rejected { order_id, reason } => {
                assert_eq!(order_id, submitter.next_order_id() - 3);
                assert!(reason.starts_with("201"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!submitter.is_halted());
    }

    #[tokio::test]
    async fn test_informational_notices_do_not_fail_submission() {
        // The paper connection sends notice 2104 on connect and before acks
        let (mut submitter, _) = submitter(PaperMode::Acknowledge).await;
        assert!(submitter.settings().is_informational(2104));
        assert!(submitter.submit(&spec()).await.is_ok());
    }

    #[tokio::test]
    async fn test_notice_code_treated_as_rejection_when_not_listed() {
        let (conn, events) = PaperConnection::new(PaperMode::Reject(2104));
        let mut settings = fast_settings();
        settings.informational_codes.clear();
        let mut submitter = OrderSubmitter::connect(conn, events, settings).await.unwrap();

        assert!(matches!(
            submitter.submit(&spec()).await,
            Err(SubmitError::Rejected { .. })
        ));
    }

    #[tokio::test]
    async fn test_listed_code_is_ignored_even_for_inflight_order() {
        let (conn, events) = PaperConnection::new(PaperMode::Reject(2158));
        let mut submitter = OrderSubmitter::connect(conn, events, fast_settings()).await.unwrap();

        // The only reply is an informational notice, so nothing acknowledges
        assert!(matches!(
            submitter.submit(&spec()).await,
            Err(SubmitError::AckTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_handshake_timeout() {
        let (conn, events) = PaperConnection::new(PaperMode::Acknowledge);
        let conn = conn.without_handshake();

        let result = OrderSubmitter::connect(conn, events, fast_settings()).await;
        assert!(matches!(result, Err(SubmitError::HandshakeTimeout(_))));
    }

    /// Connection whose event stream is gone before the handshake completes.
    struct Dropout {
        disconnected: std::sync::Arc<std::sync::atomic::AtomicBool>,
    }

    #[async_trait::async_trait]
    impl BrokerConnection for Dropout {
        fn name(&self) -> &str {
            "dropout"
        }

        async fn connect(&mut self) -> Result<(), BrokerError> {
            Ok(())
        }

        async fn place_order(
            &mut self,
            _leg: &bracket_core::types::OrderLeg,
        ) -> Result<(), BrokerError> {
            Ok(())
        }

        async fn disconnect(&mut self) -> Result<(), BrokerError> {
            self.disconnected.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_closed_stream_during_handshake_disconnects() {
        let disconnected = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let conn = Dropout {
            disconnected: disconnected.clone(),
        };
        let (tx, events) = tokio::sync::mpsc::unbounded_channel();
        drop(tx);

        let result = OrderSubmitter::connect(conn, events, fast_settings()).await;
        assert!(matches!(result, Err(SubmitError::Disconnected)));
        assert!(disconnected.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_placement_failure_surfaces_leg() {
        let (conn, events) = PaperConnection::new(PaperMode::Acknowledge);
        let conn = conn.fail_leg(1);
        let mut submitter = OrderSubmitter::connect(conn, events, fast_settings()).await.unwrap();

        let err = submitter.submit(&spec()).await.unwrap_err();
        match err {
            SubmitError::Placement { leg, .. } => assert_eq!(leg, LegKind::StopLoss),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_close_disconnects() {
        let (submitter, _) = submitter(PaperMode::Acknowledge).await;
        assert!(submitter.connection().is_connected());
        assert!(submitter.close().await.is_ok());
    }
}
