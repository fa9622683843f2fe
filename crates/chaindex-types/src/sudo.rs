//! Privileged messages the module sends to exchange contracts.
//!
//! The wire form is JSON with the variant name as the outer key, e.g.
//! `{"bulk_order_cancellations":{"ids":[1,2,3]}}`. Contracts dispatch on
//! that key; [`SudoMsg::msg_type`] returns the same string for metrics.

use serde::{Deserialize, Serialize};

use crate::{ChaindexError, Order, OrderId, Result, SettlementEntry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SudoMsg {
    BulkOrderCancellations(OrderCancellationMsgDetails),
    BulkOrderPlacements(OrderPlacementMsgDetails),
    Settlement(SettlementMsgDetails),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancellationMsgDetails {
    pub ids: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlacementMsgDetails {
    pub orders: Vec<Order>,
    pub deposits: Vec<ContractDeposit>,
}

/// Funds an account attached to its order placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDeposit {
    pub account: String,
    pub denom: String,
    pub amount: rust_decimal::Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementMsgDetails {
    pub epoch: u64,
    pub entries: Vec<SettlementEntry>,
}

impl SudoMsg {
    /// Cancellation instruction for the given order ids, in the given order.
    #[must_use]
    pub fn cancellations(ids: impl IntoIterator<Item = OrderId>) -> Self {
        Self::BulkOrderCancellations(OrderCancellationMsgDetails {
            ids: ids.into_iter().map(|id| id.0).collect(),
        })
    }

    /// Metric label for this message kind.
    #[must_use]
    pub fn msg_type(&self) -> &'static str {
        match self {
            Self::BulkOrderCancellations(_) => "bulk_order_cancellations",
            Self::BulkOrderPlacements(_) => "bulk_order_placements",
            Self::Settlement(_) => "settlement",
        }
    }

    /// Ids carried by a cancellation message; empty for other kinds.
    #[must_use]
    pub fn ids_to_cancel(&self) -> &[u64] {
        match self {
            Self::BulkOrderCancellations(details) => &details.ids,
            _ => &[],
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ChaindexError::Serialization(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| ChaindexError::Serialization(e.to_string()))
    }
}

/// What a contract returned from a sudo call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SudoResponse {
    pub gas_used: u64,
    #[serde(default)]
    pub data: Vec<u8>,
}
