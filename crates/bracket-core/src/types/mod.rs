//! Core data types.

mod indicator_series;
mod ohlcv;
mod order;
mod position;
mod signal;
mod timeframe;

pub use indicator_series::IndicatorSeries;
pub use ohlcv::{Bar, BarSeries};
pub use order::{OrderLeg, OrderStatus, OrderType, Side, TimeInForce};
pub use position::{Position, PositionSide};
pub use signal::{Decision, Direction, EntryPlan, EntrySignal, ExitSignal};
pub use timeframe::Timeframe;
