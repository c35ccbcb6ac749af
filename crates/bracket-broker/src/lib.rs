//! Bracket orders and their submission.
//!
//! A bracket is an entry order with a protective stop and a take-profit
//! attached. [`OrderSubmitter`] places the three legs on a
//! [`BrokerConnection`](bracket_core::traits::BrokerConnection) and waits,
//! bounded, for the broker to acknowledge them. Two connections ship:
//! - [`PaperConnection`]: in-process simulation
//! - [`AlpacaConnection`]: Alpaca REST API

mod alpaca;
mod bracket;
mod paper;
mod submitter;

pub use alpaca::{AlpacaConfig, AlpacaConnection};
pub use bracket::{BracketOrder, BracketSpec, LegKind};
pub use paper::{PaperConnection, PaperMode, PlacedOrders};
pub use submitter::{OrderSubmitter, SubmitError, SubmitReceipt, SubmitterSettings};
