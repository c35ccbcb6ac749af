//! Single-position cash/units ledger.
//!
//! All capital goes into the one open position and comes back as cash when
//! it closes: at any time either `cash` or the position size is zero.

use bracket_core::error::LedgerError;
use bracket_core::types::{Direction, Position};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A completed round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub direction: Direction,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub size: Decimal,
    /// Profit/loss after fees
    pub pnl: Decimal,
    pub fees: Decimal,
}

impl ClosedTrade {
    /// Return on the capital committed at entry, in percent.
    pub fn return_pct(&self) -> Decimal {
        let committed = self.entry_price * self.size;
        if committed.is_zero() {
            return Decimal::ZERO;
        }
        self.pnl / committed * Decimal::ONE_HUNDRED
    }
}

/// Cash plus at most one open position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    initial_capital: Decimal,
    cash: Decimal,
    position: Position,
    /// Fee charged on each fill, in percent of the filled value
    commission_pct: Decimal,
    /// Fee paid at entry of the open position
    entry_fee: Decimal,
    realized_pnl: Decimal,
    fees_paid: Decimal,
}

impl Ledger {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            cash: initial_capital,
            position: Position::flat(),
            commission_pct: Decimal::ZERO,
            entry_fee: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            fees_paid: Decimal::ZERO,
        }
    }

    /// Charge `commission_pct` percent of the filled value on every fill.
    ///
    /// A fee of 100% or more would leave nothing to buy with.
    pub fn with_commission(mut self, commission_pct: Decimal) -> Result<Self, LedgerError> {
        if commission_pct < Decimal::ZERO || commission_pct >= Decimal::ONE_HUNDRED {
            return Err(LedgerError::InvalidCommission(commission_pct));
        }
        self.commission_pct = commission_pct;
        Ok(self)
    }

    pub fn initial_capital(&self) -> Decimal {
        self.initial_capital
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_flat()
    }

    /// Sum of closed trade P&L.
    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    pub fn fees_paid(&self) -> Decimal {
        self.fees_paid
    }

    fn fee(&self, notional: Decimal) -> Decimal {
        notional * self.commission_pct / Decimal::ONE_HUNDRED
    }

    /// Open a position with all available cash.
    pub fn enter(
        &mut self,
        direction: Direction,
        price: Decimal,
        stop: Decimal,
        target: Decimal,
    ) -> Result<&Position, LedgerError> {
        if !self.position.is_flat() {
            return Err(LedgerError::AlreadyInPosition(self.position.side.to_string()));
        }
        if price <= Decimal::ZERO {
            return Err(LedgerError::InvalidPrice(price));
        }
        if self.cash <= Decimal::ZERO {
            return Err(LedgerError::NoCash);
        }

        let fee = self.fee(self.cash);
        let size = (self.cash - fee) / price;
        if size <= Decimal::ZERO {
            return Err(LedgerError::InvalidSize(size));
        }
        self.position = Position::open(direction, price, stop, target, size);
        self.entry_fee = fee;
        self.fees_paid += fee;
        self.cash = Decimal::ZERO;

        debug!(%direction, %price, %size, "Ledger entered position");
        self.check_invariant();
        Ok(&self.position)
    }

    /// Close the open position at `price`.
    pub fn exit(&mut self, price: Decimal) -> Result<ClosedTrade, LedgerError> {
        let direction = self.position.direction().ok_or(LedgerError::NoPosition)?;
        if price <= Decimal::ZERO {
            return Err(LedgerError::InvalidPrice(price));
        }

        let Position {
            entry_price, size, ..
        } = self.position;
        let proceeds = Self::mark_value(direction, entry_price, size, price);
        let fee = self.fee((size * price).abs());
        let pnl = proceeds - fee - (entry_price * size + self.entry_fee);

        self.cash = proceeds - fee;
        self.fees_paid += fee;
        self.realized_pnl += pnl;
        let trade = ClosedTrade {
            direction,
            entry_price,
            exit_price: price,
            size,
            pnl,
            fees: self.entry_fee + fee,
        };
        self.position = Position::flat();
        self.entry_fee = Decimal::ZERO;

        debug!(%direction, %price, %pnl, "Ledger closed position");
        self.check_invariant();
        Ok(trade)
    }

    /// Value of `size` units opened at `entry` and marked at `mark`.
    /// A short returns the committed capital plus the price drop.
    fn mark_value(direction: Direction, entry: Decimal, size: Decimal, mark: Decimal) -> Decimal {
        match direction {
            Direction::Long => size * mark,
            Direction::Short => size * entry + (entry - mark) * size,
        }
    }

    /// Account value at a mark price.
    pub fn value(&self, mark: Decimal) -> Decimal {
        match self.position.direction() {
            Some(direction) => Self::mark_value(
                direction,
                self.position.entry_price,
                self.position.size,
                mark,
            ),
            None => self.cash,
        }
    }

    /// Whether cash and units are never held together.
    pub fn holds_invariant(&self) -> bool {
        self.cash.is_zero() || self.position.size.is_zero()
    }

    fn check_invariant(&self) {
        debug_assert!(
            self.holds_invariant(),
            "ledger holds cash {} and {} units",
            self.cash,
            self.position.size
        );
    }
}
