//! Stop and target computation.

use bracket_core::error::BracketError;
use bracket_core::types::{Direction, EntryPlan};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

/// Why a set of levels cannot be traded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LevelError {
    #[error("{name} price {value} is not a positive finite number")]
    NotPositive { name: &'static str, value: String },

    #[error("{direction} levels out of order: entry {entry}, stop {stop}, target {target}")]
    WrongOrder {
        direction: Direction,
        entry: String,
        stop: String,
        target: String,
    },
}

impl From<LevelError> for BracketError {
    fn from(err: LevelError) -> Self {
        BracketError::Levels(err.to_string())
    }
}

/// Price representations the ordering check accepts.
pub trait Price: PartialOrd + Copy + Display {
    /// Finite and strictly positive.
    fn is_tradable(&self) -> bool;
}

impl Price for f64 {
    fn is_tradable(&self) -> bool {
        self.is_finite() && *self > 0.0
    }
}

impl Price for Decimal {
    fn is_tradable(&self) -> bool {
        *self > Decimal::ZERO
    }
}

/// Long: `stop < entry < target`. Short: `target < entry < stop`.
pub fn validate_levels<P: Price>(
    direction: Direction,
    entry: P,
    stop: P,
    target: P,
) -> Result<(), LevelError> {
    for (name, value) in [("entry", entry), ("stop", stop), ("target", target)] {
        if !value.is_tradable() {
            return Err(LevelError::NotPositive {
                name,
                value: value.to_string(),
            });
        }
    }

    let ordered = match direction {
        Direction::Long => stop < entry && entry < target,
        Direction::Short => target < entry && entry < stop,
    };
    if !ordered {
        return Err(LevelError::WrongOrder {
            direction,
            entry: entry.to_string(),
            stop: stop.to_string(),
            target: target.to_string(),
        });
    }
    Ok(())
}

/// Protective stop and profit target for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BracketLevels {
    pub stop: f64,
    pub target: f64,
}

impl BracketLevels {
    /// Stop at a reference price (e.g. a moving average), kept at least
    /// `min_distance_pct` percent away from the entry on the losing side.
    /// The target sits `multiplier` stop distances away on the winning side.
    pub fn from_reference(
        direction: Direction,
        entry: f64,
        reference: f64,
        min_distance_pct: f64,
        multiplier: f64,
    ) -> Self {
        let offset = entry * min_distance_pct / 100.0;
        let stop = match direction {
            Direction::Long => reference.min(entry - offset),
            Direction::Short => reference.max(entry + offset),
        };
        let distance = (entry - stop).abs();
        let target = match direction {
            Direction::Long => entry + distance * multiplier,
            Direction::Short => entry - distance * multiplier,
        };
        Self { stop, target }
    }

    /// Stop and target at fixed percentages from the entry.
    pub fn from_percentages(direction: Direction, entry: f64, stop_pct: f64, target_pct: f64) -> Self {
        let stop_offset = entry * stop_pct / 100.0;
        let target_offset = entry * target_pct / 100.0;
        match direction {
            Direction::Long => Self {
                stop: entry - stop_offset,
                target: entry + target_offset,
            },
            Direction::Short => Self {
                stop: entry + stop_offset,
                target: entry - target_offset,
            },
        }
    }

    pub fn plan(self, direction: Direction, entry: f64) -> EntryPlan {
        EntryPlan::new(direction, entry, self.stop, self.target)
    }
}
