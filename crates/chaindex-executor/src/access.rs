//! Declared state access of a transaction.
//!
//! Every transaction states up front which keys it reads and writes. The
//! scheduler derives the dependency graph from these sets, and the
//! execution context refuses any access outside them.

use std::collections::BTreeMap;
use std::fmt;

use chaindex_types::{ContractAddress, PairKey};

/// A unit of state a transaction may touch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessKey {
    /// Bank balance of one account in one denom.
    Balance { account: String, denom: String },
    /// A key in a contract's storage.
    ContractStore {
        contract: ContractAddress,
        key: String,
    },
    /// The match-state bucket of a contract and pair.
    MatchBucket {
        contract: ContractAddress,
        pair: PairKey,
    },
    /// Anything else, by name.
    Named(String),
}

impl AccessKey {
    #[must_use]
    pub fn balance(account: impl Into<String>, denom: impl Into<String>) -> Self {
        Self::Balance {
            account: account.into(),
            denom: denom.into(),
        }
    }

    #[must_use]
    pub fn contract_store(contract: &ContractAddress, key: impl Into<String>) -> Self {
        Self::ContractStore {
            contract: contract.clone(),
            key: key.into(),
        }
    }

    #[must_use]
    pub fn match_bucket(contract: &ContractAddress, pair: &PairKey) -> Self {
        Self::MatchBucket {
            contract: contract.clone(),
            pair: pair.clone(),
        }
    }

    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Balance { account, denom } => write!(f, "balance/{account}/{denom}"),
            Self::ContractStore { contract, key } => write!(f, "store/{contract}/{key}"),
            Self::MatchBucket { contract, pair } => write!(f, "bucket/{contract}/{pair}"),
            Self::Named(name) => write!(f, "named/{name}"),
        }
    }
}

/// Read or write. Write implies read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessType {
    Read,
    Write,
}

impl AccessType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// The keys a transaction declares, each with its strongest access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessSet {
    entries: BTreeMap<AccessKey, AccessType>,
}

impl AccessSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: declare a read.
    #[must_use]
    pub fn read(mut self, key: AccessKey) -> Self {
        self.insert(key, AccessType::Read);
        self
    }

    /// Builder: declare a write.
    #[must_use]
    pub fn write(mut self, key: AccessKey) -> Self {
        self.insert(key, AccessType::Write);
        self
    }

    /// Declare an access. A write is never downgraded to a read.
    pub fn insert(&mut self, key: AccessKey, access: AccessType) {
        let slot = self.entries.entry(key).or_insert(access);
        if access == AccessType::Write {
            *slot = AccessType::Write;
        }
    }

    #[must_use]
    pub fn allows(&self, key: &AccessKey, access: AccessType) -> bool {
        match (self.entries.get(key), access) {
            (None, _) => false,
            (Some(_), AccessType::Read) => true,
            (Some(declared), AccessType::Write) => *declared == AccessType::Write,
        }
    }

    /// Two sets conflict when they share a key and at least one writes it.
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.entries.iter().any(|(key, a)| {
            large
                .entries
                .get(key)
                .is_some_and(|b| *a == AccessType::Write || *b == AccessType::Write)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccessKey, AccessType)> {
        self.entries.iter().map(|(k, a)| (k, *a))
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
