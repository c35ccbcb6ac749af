//! Position types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Direction;

/// Which way the book is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    #[default]
    Flat,
    Long,
    Short,
}

impl From<Direction> for PositionSide {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Long => PositionSide::Long,
            Direction::Short => PositionSide::Short,
        }
    }
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Flat => write!(f, "FLAT"),
            PositionSide::Long => write!(f, "LONG"),
            PositionSide::Short => write!(f, "SHORT"),
        }
    }
}

/// The single open position, or the flat state.
///
/// Prices and size are zero while flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub side: PositionSide,
    pub entry_price: Decimal,
    pub stop_price: Decimal,
    pub target_price: Decimal,
    /// Number of units held (always positive when not flat)
    pub size: Decimal,
}

impl Position {
    /// The flat state.
    pub fn flat() -> Self {
        Self::default()
    }

    /// Open a position.
    pub fn open(
        direction: Direction,
        entry_price: Decimal,
        stop_price: Decimal,
        target_price: Decimal,
        size: Decimal,
    ) -> Self {
        Self {
            side: direction.into(),
            entry_price,
            stop_price,
            target_price,
            size,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.side == PositionSide::Flat
    }

    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == PositionSide::Short
    }

    /// Direction of the open position, `None` when flat.
    pub fn direction(&self) -> Option<Direction> {
        match self.side {
            PositionSide::Long => Some(Direction::Long),
            PositionSide::Short => Some(Direction::Short),
            PositionSide::Flat => None,
        }
    }

    /// Unrealized profit/loss at a mark price.
    pub fn unrealized_pnl(&self, mark: Decimal) -> Decimal {
        match self.side {
            PositionSide::Long => (mark - self.entry_price) * self.size,
            PositionSide::Short => (self.entry_price - mark) * self.size,
            PositionSide::Flat => Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flat_position() {
        let position = Position::flat();
        assert!(position.is_flat());
        assert_eq!(position.direction(), None);
        assert_eq!(position.unrealized_pnl(dec!(100)), Decimal::ZERO);
    }

    #[test]
    fn test_long_and_short_pnl() {
        let long = Position::open(Direction::Long, dec!(100), dec!(95), dec!(110), dec!(10));
        assert!(long.is_long());
        assert_eq!(long.unrealized_pnl(dec!(105)), dec!(50));

        let short = Position::open(Direction::Short, dec!(100), dec!(105), dec!(90), dec!(10));
        assert!(short.is_short());
        assert_eq!(short.unrealized_pnl(dec!(105)), dec!(-50));
        assert_eq!(short.direction(), Some(Direction::Short));
    }
}
