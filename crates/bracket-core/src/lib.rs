//! Core types and traits for signal evaluation and bracket orders.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries) and aligned indicator series
//! - Order legs, positions and trade decisions
//! - Core traits for strategies, indicators and broker connections

pub mod types;
pub mod traits;
pub mod error;

pub use error::{BracketError, BracketResult};
pub use types::*;
pub use traits::*;
