//! Three-leg bracket orders.

use bracket_core::types::{Direction, EntryPlan, OrderLeg, OrderType, Side, TimeInForce};
use bracket_risk::validate_levels;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::submitter::SubmitError;

/// What to submit: an entry with its stop and target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketSpec {
    pub symbol: String,
    /// Side of the entry order
    pub side: Side,
    pub quantity: Decimal,
    /// Limit price of the entry, or the reference price for a market entry
    pub entry_price: Decimal,
    pub stop_price: Decimal,
    pub target_price: Decimal,
    /// `Limit` (default) or `Market`
    #[serde(default = "default_entry_type")]
    pub entry_type: OrderType,
}

fn default_entry_type() -> OrderType {
    OrderType::Limit
}

impl BracketSpec {
    pub fn new(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        entry_price: Decimal,
        stop_price: Decimal,
        target_price: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            entry_price,
            stop_price,
            target_price,
            entry_type: OrderType::Limit,
        }
    }

    /// Enter at market instead of with a limit order.
    pub fn at_market(mut self) -> Self {
        self.entry_type = OrderType::Market;
        self
    }

    /// Build from an evaluator plan, rounding prices to `price_decimals`.
    pub fn from_plan(
        symbol: impl Into<String>,
        plan: &EntryPlan,
        quantity: Decimal,
        price_decimals: u32,
    ) -> Result<Self, SubmitError> {
        let price = |name: &str, value: f64| {
            Decimal::from_f64(value)
                .map(|d| d.round_dp(price_decimals))
                .ok_or_else(|| SubmitError::InvalidBracket(format!("{name} price {value} is not representable")))
        };
        Ok(Self::new(
            symbol,
            plan.direction.entry_side(),
            quantity,
            price("entry", plan.entry)?,
            price("stop", plan.stop)?,
            price("target", plan.target)?,
        ))
    }

    pub fn direction(&self) -> Direction {
        Direction::from(self.side)
    }

    /// Reject anything that must never reach a broker.
    pub fn validate(&self) -> Result<(), SubmitError> {
        if self.symbol.trim().is_empty() {
            return Err(SubmitError::InvalidBracket("empty symbol".into()));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(SubmitError::InvalidBracket(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        if !matches!(self.entry_type, OrderType::Limit | OrderType::Market) {
            return Err(SubmitError::InvalidBracket(format!(
                "entry must be a limit or market order, got {}",
                self.entry_type
            )));
        }
        validate_levels(
            self.direction(),
            self.entry_price,
            self.stop_price,
            self.target_price,
        )
        .map_err(|e| SubmitError::InvalidBracket(e.to_string()))
    }

    /// Reward distance over risk distance.
    pub fn risk_reward(&self) -> Decimal {
        let risk = (self.entry_price - self.stop_price).abs();
        if risk.is_zero() {
            return Decimal::ZERO;
        }
        (self.target_price - self.entry_price).abs() / risk
    }
}

/// Which leg of a bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    Parent,
    StopLoss,
    TakeProfit,
}

impl std::fmt::Display for LegKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LegKind::Parent => write!(f, "parent"),
            LegKind::StopLoss => write!(f, "stop-loss"),
            LegKind::TakeProfit => write!(f, "take-profit"),
        }
    }
}

/// The three legs of a bracket, ids `n`, `n+1`, `n+2`.
///
/// Only the take-profit leg transmits, so the broker activates all three
/// together once the last one arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketOrder {
    pub parent: OrderLeg,
    pub stop_loss: OrderLeg,
    pub take_profit: OrderLeg,
}

impl BracketOrder {
    pub fn new(first_id: u64, spec: &BracketSpec) -> Self {
        let exit_side = spec.side.opposite();
        let parent_id = first_id;

        let parent = OrderLeg {
            order_id: parent_id,
            parent_id: None,
            symbol: spec.symbol.clone(),
            side: spec.side,
            order_type: spec.entry_type,
            quantity: spec.quantity,
            limit_price: (spec.entry_type == OrderType::Limit).then_some(spec.entry_price),
            stop_price: None,
            time_in_force: TimeInForce::GTC,
            transmit: false,
        };

        let stop_loss = OrderLeg {
            order_id: parent_id + 1,
            parent_id: Some(parent_id),
            side: exit_side,
            order_type: OrderType::Stop,
            limit_price: None,
            stop_price: Some(spec.stop_price),
            ..parent.clone()
        };

        let take_profit = OrderLeg {
            order_id: parent_id + 2,
            parent_id: Some(parent_id),
            side: exit_side,
            order_type: OrderType::Limit,
            limit_price: Some(spec.target_price),
            stop_price: None,
            transmit: true,
            ..parent.clone()
        };

        Self {
            parent,
            stop_loss,
            take_profit,
        }
    }

    pub fn parent_id(&self) -> u64 {
        self.parent.order_id
    }

    /// Legs in submission order.
    pub fn legs(&self) -> [(LegKind, &OrderLeg); 3] {
        [
            (LegKind::Parent, &self.parent),
            (LegKind::StopLoss, &self.stop_loss),
            (LegKind::TakeProfit, &self.take_profit),
        ]
    }

    pub fn order_ids(&self) -> [u64; 3] {
        [
            self.parent.order_id,
            self.stop_loss.order_id,
            self.take_profit.order_id,
        ]
    }

    pub fn contains(&self, order_id: u64) -> bool {
        self.order_ids().contains(&order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn short_spec() -> BracketSpec {
        BracketSpec::new("XYZ", Side::Sell, dec!(1000), dec!(2.42), dec!(2.59), dec!(1.88))
    }

    #[test]
    fn test_short_bracket_risk_reward() {
        let spec = short_spec();
        assert!(spec.validate().is_ok());
        let rr = spec.risk_reward();
        assert!((rr - dec!(3.18)).abs() < dec!(0.01), "risk/reward {rr}");
    }

    #[test]
    fn test_inverted_levels_rejected() {
        let mut spec = short_spec();
        spec.stop_price = dec!(1.88);
        spec.target_price = dec!(2.59);
        assert!(matches!(spec.validate(), Err(SubmitError::InvalidBracket(_))));
    }

    #[test]
    fn test_bad_quantity_and_entry_type() {
        let mut spec = short_spec();
        spec.quantity = Decimal::ZERO;
        assert!(spec.validate().is_err());

        let mut spec = short_spec();
        spec.entry_type = OrderType::Stop;
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_bracket_legs() {
        let order = BracketOrder::new(41, &short_spec());

        assert_eq!(order.order_ids(), [41, 42, 43]);

        assert_eq!(order.parent.side, Side::Sell);
        assert_eq!(order.parent.order_type, OrderType::Limit);
        assert_eq!(order.parent.limit_price, Some(dec!(2.42)));
        assert_eq!(order.parent.parent_id, None);
        assert!(!order.parent.transmit);

        assert_eq!(order.stop_loss.side, Side::Buy);
        assert_eq!(order.stop_loss.order_type, OrderType::Stop);
        assert_eq!(order.stop_loss.stop_price, Some(dec!(2.59)));
        assert_eq!(order.stop_loss.parent_id, Some(41));
        assert!(!order.stop_loss.transmit);

        assert_eq!(order.take_profit.side, Side::Buy);
        assert_eq!(order.take_profit.limit_price, Some(dec!(1.88)));
        assert_eq!(order.take_profit.parent_id, Some(41));
        assert!(order.take_profit.transmit);

        for (_, leg) in order.legs() {
            assert_eq!(leg.quantity, dec!(1000));
            assert_eq!(leg.time_in_force, TimeInForce::GTC);
        }
    }

    #[test]
    fn test_market_entry_has_no_limit() {
        let order = BracketOrder::new(1, &short_spec().at_market());
        assert_eq!(order.parent.order_type, OrderType::Market);
        assert_eq!(order.parent.limit_price, None);
    }

    #[test]
    fn test_from_plan_rounds_prices() {
        let plan = EntryPlan::new(Direction::Long, 100.123, 98.456, 103.789);
        let spec = BracketSpec::from_plan("ABC", &plan, dec!(5), 2).unwrap();
        assert_eq!(spec.side, Side::Buy);
        assert_eq!(spec.entry_price, dec!(100.12));
        assert_eq!(spec.stop_price, dec!(98.46));
        assert_eq!(spec.target_price, dec!(103.79));
        assert!(spec.validate().is_ok());

        let plan = EntryPlan::new(Direction::Long, f64::NAN, 1.0, 2.0);
        assert!(BracketSpec::from_plan("ABC", &plan, dec!(5), 2).is_err());
    }
}
