//! Registry of contracts, their pairs, and chain parameters.

use std::sync::{PoisonError, RwLock};

use chaindex_types::{ChaindexError, ContractAddress, Pair, Params, Result};

/// Read access to module state the end-block logic needs.
///
/// Implementations must return contracts and pairs in registration order;
/// that order decides the order of sudo calls and cancellation ids.
pub trait Keeper: Send + Sync {
    /// Current, validated chain parameters.
    fn params(&self) -> Result<Params>;

    fn registered_contracts(&self) -> Vec<ContractAddress>;

    fn registered_pairs(&self, contract: &ContractAddress) -> Result<Vec<Pair>>;
}

#[derive(Debug, Default)]
struct Registry {
    params: Option<Params>,
    contracts: Vec<(ContractAddress, Vec<Pair>)>,
}

/// Keeper backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryKeeper {
    inner: RwLock<Registry>,
}

impl InMemoryKeeper {
    /// A keeper with no parameters set. [`Keeper::params`] fails until
    /// [`InMemoryKeeper::set_params`] is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_params(params: Params) -> Self {
        let keeper = Self::new();
        keeper.set_params(params);
        keeper
    }

    pub fn set_params(&self, params: Params) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .params = Some(params);
    }

    /// Register a contract. Registering twice is a no-op.
    pub fn register_contract(&self, contract: ContractAddress) {
        let mut reg = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !reg.contracts.iter().any(|(c, _)| *c == contract) {
            tracing::debug!(%contract, "Contract registered");
            reg.contracts.push((contract, Vec::new()));
        }
    }

    /// Register a pair under a contract. A pair with the same key replaces
    /// the existing one in place.
    ///
    /// # Errors
    /// `ContractNotRegistered` if the contract is unknown.
    pub fn register_pair(&self, contract: &ContractAddress, pair: Pair) -> Result<()> {
        let mut reg = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let (_, pairs) = reg
            .contracts
            .iter_mut()
            .find(|(c, _)| c == contract)
            .ok_or_else(|| ChaindexError::ContractNotRegistered(contract.clone()))?;
        match pairs.iter_mut().find(|p| p.key() == pair.key()) {
            Some(existing) => *existing = pair,
            None => pairs.push(pair),
        }
        Ok(())
    }
}

impl Keeper for InMemoryKeeper {
    fn params(&self) -> Result<Params> {
        let params = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .params
            .clone()
            .ok_or(ChaindexError::MissingParameter("params"))?;
        params.validate()?;
        Ok(params)
    }

    fn registered_contracts(&self) -> Vec<ContractAddress> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contracts
            .iter()
            .map(|(c, _)| c.clone())
            .collect()
    }

    fn registered_pairs(&self, contract: &ContractAddress) -> Result<Vec<Pair>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contracts
            .iter()
            .find(|(c, _)| c == contract)
            .map(|(_, pairs)| pairs.clone())
            .ok_or_else(|| ChaindexError::ContractNotRegistered(contract.clone()))
    }
}
