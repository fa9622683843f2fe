//! Committed key/value state of the block.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::access::AccessKey;

/// A stored value. Balances are decimals, everything else is opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    Amount(Decimal),
    Bytes(Vec<u8>),
}

impl StateValue {
    #[must_use]
    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            Self::Amount(d) => Some(*d),
            Self::Bytes(_) => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            Self::Amount(_) => None,
        }
    }
}

/// Buffered writes of one transaction. `None` deletes the key.
pub type WriteSet = BTreeMap<AccessKey, Option<StateValue>>;

/// Ordered state map. Iteration and hashing follow key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateStore {
    entries: BTreeMap<AccessKey, StateValue>,
}

impl StateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &AccessKey) -> Option<&StateValue> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: AccessKey, value: StateValue) {
        self.entries.insert(key, value);
    }

    /// Balance of `account` in `denom`; zero when never set.
    #[must_use]
    pub fn balance(&self, account: &str, denom: &str) -> Decimal {
        self.get(&AccessKey::balance(account, denom))
            .and_then(StateValue::as_amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// Seed a balance, e.g. for genesis or tests.
    pub fn set_balance(&mut self, account: &str, denom: &str, amount: Decimal) {
        self.set(AccessKey::balance(account, denom), StateValue::Amount(amount));
    }

    /// Apply one transaction's buffered writes.
    pub fn apply(&mut self, writes: WriteSet) {
        for (key, value) in writes {
            match value {
                Some(v) => {
                    self.entries.insert(key, v);
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
    }

    /// Sum of all balances in `denom`.
    #[must_use]
    pub fn total_supply(&self, denom: &str) -> Decimal {
        self.entries
            .iter()
            .filter_map(|(k, v)| match k {
                AccessKey::Balance { denom: d, .. } if d == denom => v.as_amount(),
                _ => None,
            })
            .sum()
    }

    /// SHA-256 over all entries in key order.
    #[must_use]
    pub fn root(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"chaindex:state:v1:");
        hasher.update((self.entries.len() as u64).to_le_bytes());
        for (key, value) in &self.entries {
            let k = key.to_string();
            hasher.update((k.len() as u64).to_le_bytes());
            hasher.update(k.as_bytes());
            match value {
                StateValue::Amount(d) => {
                    let s = d.normalize().to_string();
                    hasher.update([0u8]);
                    hasher.update((s.len() as u64).to_le_bytes());
                    hasher.update(s.as_bytes());
                }
                StateValue::Bytes(b) => {
                    hasher.update([1u8]);
                    hasher.update((b.len() as u64).to_le_bytes());
                    hasher.update(b);
                }
            }
        }
        let digest = hasher.finalize();
        let mut root = [0u8; 32];
        root.copy_from_slice(&digest);
        root
    }

    #[must_use]
    pub fn root_hex(&self) -> String {
        hex::encode(self.root())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccessKey, &StateValue)> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_balance_is_zero() {
        assert_eq!(StateStore::new().balance("alice", "usdc"), Decimal::ZERO);
    }

    #[test]
    fn apply_sets_and_deletes() {
        let mut state = StateStore::new();
        state.set_balance("alice", "usdc", Decimal::new(10, 0));
        let mut writes = WriteSet::new();
        writes.insert(AccessKey::balance("alice", "usdc"), None);
        writes.insert(
            AccessKey::named("flag"),
            Some(StateValue::Bytes(b"on".to_vec())),
        );
        state.apply(writes);
        assert_eq!(state.balance("alice", "usdc"), Decimal::ZERO);
        assert_eq!(
            state.get(&AccessKey::named("flag")).and_then(StateValue::as_bytes),
            Some(&b"on"[..])
        );
    }

    #[test]
    fn root_ignores_insertion_order_and_scale() {
        let mut a = StateStore::new();
        a.set_balance("alice", "usdc", Decimal::new(10, 0));
        a.set_balance("bob", "usdc", Decimal::new(5, 0));

        let mut b = StateStore::new();
        b.set_balance("bob", "usdc", Decimal::new(500, 2));
        b.set_balance("alice", "usdc", Decimal::new(10, 0));

        assert_eq!(a.root(), b.root());
        b.set_balance("bob", "usdc", Decimal::new(6, 0));
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn total_supply_per_denom() {
        let mut s = StateStore::new();
        s.set_balance("a", "usdc", Decimal::new(3, 0));
        s.set_balance("b", "usdc", Decimal::new(4, 0));
        s.set_balance("a", "atom", Decimal::new(100, 0));
        assert_eq!(s.total_supply("usdc"), Decimal::new(7, 0));
    }
}
