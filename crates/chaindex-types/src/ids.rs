//! Identifiers used throughout chaindex.
//!
//! Order ids are chain-assigned `u64` counters, so every node derives the
//! same id for the same placement. Contract addresses are opaque strings.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Chain-assigned order identifier. Monotonically increasing per contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// ContractAddress
// ---------------------------------------------------------------------------

/// Address of a registered exchange contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractAddress(pub String);

impl ContractAddress {
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContractAddress {
    fn from(addr: &str) -> Self {
        Self(addr.to_string())
    }
}

// ---------------------------------------------------------------------------
// Pair
// ---------------------------------------------------------------------------

/// A trading pair registered under a contract (e.g., `USDC|ATOM`).
///
/// Identity is the `(price_denom, asset_denom)` tuple; tick sizes are
/// registration metadata and do not take part in bucket lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Pair {
    pub price_denom: String,
    pub asset_denom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_tick_size: Option<rust_decimal::Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_tick_size: Option<rust_decimal::Decimal>,
}

impl Pair {
    #[must_use]
    pub fn new(price_denom: impl Into<String>, asset_denom: impl Into<String>) -> Self {
        Self {
            price_denom: price_denom.into(),
            asset_denom: asset_denom.into(),
            price_tick_size: None,
            quantity_tick_size: None,
        }
    }

    /// The bucket key used by the match-state store.
    #[must_use]
    pub fn key(&self) -> PairKey {
        PairKey::new(&self.price_denom, &self.asset_denom)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.price_denom, self.asset_denom)
    }
}

/// String form of a pair's identity: `"{price_denom}|{asset_denom}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairKey(pub String);

impl PairKey {
    #[must_use]
    pub fn new(price_denom: &str, asset_denom: &str) -> Self {
        Self(format!("{price_denom}|{asset_denom}"))
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// TxIndex
// ---------------------------------------------------------------------------

/// Position of a transaction within its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxIndex(pub u32);

impl TxIndex {
    #[must_use]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TxIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Origin
// ---------------------------------------------------------------------------

/// Who recorded an entry into the match-state store.
///
/// The derived ordering places every transaction before end-of-block
/// synthesized entries, and transactions in block order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Origin {
    Tx(TxIndex),
    EndBlock,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tx(idx) => write!(f, "{idx}"),
            Self::EndBlock => write!(f, "end_block"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
