//! Order and cancellation types recorded during block execution.
//!
//! Orders are immutable once placed within a block. Matching references
//! them but never mutates them; fills are expressed as [`SettlementEntry`]s.
//!
//! [`SettlementEntry`]: crate::SettlementEntry

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Canonical, CanonicalWriter, ContractAddress, OrderId, PairKey};

/// Direction of the position an order opens or extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionDirection {
    Long,
    Short,
}

impl std::fmt::Display for PositionDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

/// The type of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Limit,
    Market,
    Liquidation,
    FokMarket,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Limit => write!(f, "LIMIT"),
            Self::Market => write!(f, "MARKET"),
            Self::Liquidation => write!(f, "LIQUIDATION"),
            Self::FokMarket => write!(f, "FOK_MARKET"),
        }
    }
}

/// Placement status of an order within the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Placed,
    FailedToPlace,
    Cancelled,
    Fulfilled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Placed => write!(f, "PLACED"),
            Self::FailedToPlace => write!(f, "FAILED_TO_PLACE"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Fulfilled => write!(f, "FULFILLED"),
        }
    }
}

/// An order placed against a contract's book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    /// Owner of the order.
    pub account: String,
    pub contract_addr: ContractAddress,
    pub price_denom: String,
    pub asset_denom: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub order_type: OrderType,
    pub position_direction: PositionDirection,
    /// Opaque contract-specific payload.
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub nominal: Decimal,
}

impl Order {
    #[must_use]
    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.price_denom, &self.asset_denom)
    }
}

impl Canonical for Order {
    fn canonical_string(&self) -> String {
        CanonicalWriter::new()
            .num("id", self.id.0)
            .tag("status", &self.status.to_string())
            .str("account", &self.account)
            .str("contract_addr", self.contract_addr.as_str())
            .dec("price", self.price)
            .dec("quantity", self.quantity)
            .str("price_denom", &self.price_denom)
            .str("asset_denom", &self.asset_denom)
            .tag("order_type", &self.order_type.to_string())
            .tag("position_direction", &self.position_direction.to_string())
            .str("data", &self.data)
            .dec("nominal", self.nominal)
            .finish()
    }
}

/// Who asked for a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancellationInitiator {
    User,
    Liquidated,
}

impl std::fmt::Display for CancellationInitiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "USER"),
            Self::Liquidated => write!(f, "LIQUIDATED"),
        }
    }
}

/// A request to remove a resting order by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancellation {
    pub id: OrderId,
    pub initiator: CancellationInitiator,
    /// Account that submitted the request.
    pub creator: String,
    pub contract_addr: ContractAddress,
    pub price_denom: String,
    pub asset_denom: String,
    pub position_direction: PositionDirection,
    pub price: Decimal,
}

impl Cancellation {
    #[must_use]
    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.price_denom, &self.asset_denom)
    }
}

impl Canonical for Cancellation {
    fn canonical_string(&self) -> String {
        CanonicalWriter::new()
            .num("id", self.id.0)
            .tag("initiator", &self.initiator.to_string())
            .str("creator", &self.creator)
            .str("contract_addr", self.contract_addr.as_str())
            .str("price_denom", &self.price_denom)
            .str("asset_denom", &self.asset_denom)
            .tag("position_direction", &self.position_direction.to_string())
            .dec("price", self.price)
            .finish()
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy(id: u64, contract: &ContractAddress, pair: &crate::Pair) -> Self {
        Self {
            id: OrderId(id),
            status: OrderStatus::Placed,
            account: format!("acct-{id}"),
            contract_addr: contract.clone(),
            price_denom: pair.price_denom.clone(),
            asset_denom: pair.asset_denom.clone(),
            price: Decimal::new(100, 0),
            quantity: Decimal::ONE,
            order_type: OrderType::Limit,
            position_direction: PositionDirection::Long,
            data: String::new(),
            nominal: Decimal::ZERO,
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Cancellation {
    pub fn dummy(id: u64, contract: &ContractAddress, pair: &crate::Pair) -> Self {
        Self {
            id: OrderId(id),
            initiator: CancellationInitiator::User,
            creator: format!("acct-{id}"),
            contract_addr: contract.clone(),
            price_denom: pair.price_denom.clone(),
            asset_denom: pair.asset_denom.clone(),
            position_direction: PositionDirection::Long,
            price: Decimal::new(100, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pair;

    fn contract() -> ContractAddress {
        ContractAddress::new("dex1contract")
    }

    #[test]
    fn canonical_string_starts_with_id() {
        let order = Order::dummy(5, &contract(), &Pair::new("USDC", "ATOM"));
        assert!(order.canonical_string().starts_with("id:5 status:PLACED"));
    }

    #[test]
    fn equal_prices_render_equal() {
        let pair = Pair::new("USDC", "ATOM");
        let mut a = Order::dummy(1, &contract(), &pair);
        let mut b = a.clone();
        a.price = Decimal::new(1000, 1);
        b.price = Decimal::new(100, 0);
        assert_eq!(a.canonical_string(), b.canonical_string());
    }

    #[test]
    fn cancellation_pair_key() {
        let c = Cancellation::dummy(3, &contract(), &Pair::new("USDC", "ATOM"));
        assert_eq!(c.pair_key(), PairKey::new("USDC", "ATOM"));
        assert!(c.canonical_string().contains("initiator:USER"));
    }

    #[test]
    fn enums_serialize_screaming() {
        let json = serde_json::to_string(&OrderType::FokMarket).unwrap();
        assert_eq!(json, "\"FOK_MARKET\"");
        let json = serde_json::to_string(&PositionDirection::Short).unwrap();
        assert_eq!(json, "\"SHORT\"");
    }
}
