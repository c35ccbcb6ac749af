//! Stop/target levels and position accounting.
//!
//! - [`BracketLevels`]: stop and target from a reference price or fixed
//!   percentages, and the ordering check every entry must pass
//! - [`Ledger`]: single-position cash/units ledger without leverage

mod ledger;
mod levels;

pub use ledger::{ClosedTrade, Ledger};
pub use levels::{validate_levels, BracketLevels, LevelError, Price};
