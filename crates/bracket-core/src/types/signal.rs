//! Trade decisions produced by the signal evaluator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Side;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Side of the order that opens a trade in this direction.
    pub fn entry_side(&self) -> Side {
        match self {
            Direction::Long => Side::Buy,
            Direction::Short => Side::Sell,
        }
    }

    /// Side of the orders that close it (stop and take-profit).
    pub fn exit_side(&self) -> Side {
        self.entry_side().opposite()
    }
}

impl From<Side> for Direction {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => Direction::Long,
            Side::Sell => Direction::Short,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// Entry price with its protective stop and profit target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryPlan {
    pub direction: Direction,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
}

impl EntryPlan {
    pub fn new(direction: Direction, entry: f64, stop: f64, target: f64) -> Self {
        Self {
            direction,
            entry,
            stop,
            target,
        }
    }

    /// Long: `stop < entry < target`. Short: `target < entry < stop`.
    /// Non-finite or non-positive prices are never well ordered.
    pub fn is_well_ordered(&self) -> bool {
        let finite = [self.entry, self.stop, self.target]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0);
        if !finite {
            return false;
        }
        match self.direction {
            Direction::Long => self.stop < self.entry && self.entry < self.target,
            Direction::Short => self.target < self.entry && self.entry < self.stop,
        }
    }

    /// Reward distance over risk distance.
    pub fn risk_reward(&self) -> f64 {
        let risk = (self.entry - self.stop).abs();
        if risk == 0.0 {
            return 0.0;
        }
        (self.target - self.entry).abs() / risk
    }
}

/// An accepted entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySignal {
    pub symbol: String,
    /// Timestamp of the bar that produced the signal (unix ms)
    pub timestamp: i64,
    pub plan: EntryPlan,
    pub strategy: String,
    pub reason: String,
    /// Indicator values at evaluation time
    pub indicators: BTreeMap<String, f64>,
}

/// A request to close the open position at the current price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitSignal {
    pub symbol: String,
    pub timestamp: i64,
    pub price: f64,
    pub reason: String,
}

/// Outcome of evaluating one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Decision {
    Hold,
    Enter(EntrySignal),
    Exit(ExitSignal),
}

impl Decision {
    pub fn is_hold(&self) -> bool {
        matches!(self, Decision::Hold)
    }

    pub fn entry(&self) -> Option<&EntrySignal> {
        match self {
            Decision::Enter(signal) => Some(signal),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_ordering() {
        assert!(EntryPlan::new(Direction::Long, 100.0, 95.0, 110.0).is_well_ordered());
        assert!(!EntryPlan::new(Direction::Long, 100.0, 105.0, 110.0).is_well_ordered());
        assert!(EntryPlan::new(Direction::Short, 2.42, 2.59, 1.88).is_well_ordered());
        assert!(!EntryPlan::new(Direction::Short, 2.42, 1.88, 2.59).is_well_ordered());
        assert!(!EntryPlan::new(Direction::Long, f64::NAN, 95.0, 110.0).is_well_ordered());
    }

    #[test]
    fn test_plan_risk_reward() {
        let plan = EntryPlan::new(Direction::Short, 2.42, 2.59, 1.88);
        assert!((plan.risk_reward() - 3.1765).abs() < 1e-3);
    }

    #[test]
    fn test_direction_sides() {
        assert_eq!(Direction::Long.entry_side(), Side::Buy);
        assert_eq!(Direction::Long.exit_side(), Side::Sell);
        assert_eq!(Direction::from(Side::Sell), Direction::Short);
    }
}
