//! Core traits for the bracket system.

mod broker;
mod indicator;
mod strategy;

pub use broker::{BrokerConnection, BrokerEvent, EventReceiver, EventSender};
pub use indicator::{Indicator, MultiOutputIndicator};
pub use strategy::{Conditions, Strategy, StrategyConfig, StrategyState};
