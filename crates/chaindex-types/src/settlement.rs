//! Settlement entries produced by matching.
//!
//! A [`SettlementEntry`] is one side of an execution: the account, the
//! executed quantity, and what it cost (or yielded). Entries are created by
//! the matching step and only aggregated by this core.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Canonical, CanonicalWriter, OrderId, OrderType, PairKey, PositionDirection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementEntry {
    pub account: String,
    pub price_denom: String,
    pub asset_denom: String,
    pub quantity: Decimal,
    pub execution_cost_or_proceed: Decimal,
    pub expected_cost_or_proceed: Decimal,
    pub position_direction: PositionDirection,
    pub order_type: OrderType,
    pub order_id: OrderId,
    /// Block time (unix seconds) of the execution.
    pub timestamp: u64,
    pub height: u64,
    /// Per-block sequence assigned by the matcher.
    pub settlement_id: u64,
}

impl SettlementEntry {
    #[must_use]
    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.price_denom, &self.asset_denom)
    }

    /// Difference between the expected and realised cost. Positive when the
    /// account did better than its limit.
    #[must_use]
    pub fn price_improvement(&self) -> Decimal {
        self.expected_cost_or_proceed - self.execution_cost_or_proceed
    }
}

impl Canonical for SettlementEntry {
    fn canonical_string(&self) -> String {
        CanonicalWriter::new()
            .str("account", &self.account)
            .str("price_denom", &self.price_denom)
            .str("asset_denom", &self.asset_denom)
            .dec("quantity", self.quantity)
            .dec("execution_cost_or_proceed", self.execution_cost_or_proceed)
            .dec("expected_cost_or_proceed", self.expected_cost_or_proceed)
            .tag("position_direction", &self.position_direction.to_string())
            .tag("order_type", &self.order_type.to_string())
            .num("order_id", self.order_id.0)
            .num("timestamp", self.timestamp)
            .num("height", self.height)
            .num("settlement_id", self.settlement_id)
            .finish()
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl SettlementEntry {
    pub fn dummy(account: &str, order_id: u64, pair: &crate::Pair) -> Self {
        Self {
            account: account.to_string(),
            price_denom: pair.price_denom.clone(),
            asset_denom: pair.asset_denom.clone(),
            quantity: Decimal::ONE,
            execution_cost_or_proceed: Decimal::new(100, 0),
            expected_cost_or_proceed: Decimal::new(100, 0),
            position_direction: PositionDirection::Long,
            order_type: OrderType::Limit,
            order_id: OrderId(order_id),
            timestamp: 0,
            height: 1,
            settlement_id: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pair;

    #[test]
    fn price_improvement_sign() {
        let mut entry = SettlementEntry::dummy("alice", 1, &Pair::new("USDC", "ATOM"));
        entry.expected_cost_or_proceed = Decimal::new(101, 0);
        assert_eq!(entry.price_improvement(), Decimal::ONE);
    }

    #[test]
    fn canonical_string_leads_with_account() {
        let entry = SettlementEntry::dummy("bob", 9, &Pair::new("USDC", "ATOM"));
        let s = entry.canonical_string();
        assert!(s.starts_with("account:\"bob\""), "Got: {s}");
        assert!(s.contains("order_id:9"));
    }
}
