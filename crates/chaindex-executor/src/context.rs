//! Per-transaction execution context.
//!
//! Reads see the committed snapshot of the previous group overlaid with the
//! transaction's own buffered writes. Writes stay buffered until the
//! executor commits them in block order. Match-state records go straight
//! into the shared store, tagged with the transaction's origin, and are
//! discarded if the transaction fails.

use std::sync::Arc;

use chaindex_matchcore::MemState;
use chaindex_types::{
    BlockContext, Cancellation, ChaindexError, ContractAddress, Order, Origin, Result,
    SettlementEntry, TxIndex,
};
use rust_decimal::Decimal;

use crate::access::{AccessKey, AccessSet, AccessType};
use crate::state::{StateStore, StateValue, WriteSet};

pub struct TxContext {
    index: TxIndex,
    block: Arc<BlockContext>,
    snapshot: Arc<StateStore>,
    memstate: Arc<MemState>,
    /// `None` lifts access checks (a tx whose access set is unknown).
    declared: Option<Arc<AccessSet>>,
    writes: WriteSet,
}

impl TxContext {
    #[must_use]
    pub fn new(
        index: TxIndex,
        block: Arc<BlockContext>,
        snapshot: Arc<StateStore>,
        memstate: Arc<MemState>,
        declared: Option<Arc<AccessSet>>,
    ) -> Self {
        Self {
            index,
            block,
            snapshot,
            memstate,
            declared,
            writes: WriteSet::new(),
        }
    }

    #[must_use]
    pub fn index(&self) -> TxIndex {
        self.index
    }

    #[must_use]
    pub fn block(&self) -> &BlockContext {
        &self.block
    }

    #[must_use]
    pub fn origin(&self) -> Origin {
        Origin::Tx(self.index)
    }

    fn check(&self, key: &AccessKey, access: AccessType) -> Result<()> {
        match &self.declared {
            Some(set) if !set.allows(key, access) => Err(ChaindexError::UndeclaredAccess {
                tx: self.index,
                key: key.to_string(),
                access: access.as_str(),
            }),
            _ => Ok(()),
        }
    }

    // -----------------------------------------------------------------
    // Key/value access
    // -----------------------------------------------------------------

    pub fn get(&self, key: &AccessKey) -> Result<Option<StateValue>> {
        self.check(key, AccessType::Read)?;
        if let Some(buffered) = self.writes.get(key) {
            return Ok(buffered.clone());
        }
        Ok(self.snapshot.get(key).cloned())
    }

    pub fn set(&mut self, key: AccessKey, value: StateValue) -> Result<()> {
        self.check(&key, AccessType::Write)?;
        self.writes.insert(key, Some(value));
        Ok(())
    }

    pub fn delete(&mut self, key: AccessKey) -> Result<()> {
        self.check(&key, AccessType::Write)?;
        self.writes.insert(key, None);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Balances
    // -----------------------------------------------------------------

    pub fn balance(&self, account: &str, denom: &str) -> Result<Decimal> {
        Ok(self
            .get(&AccessKey::balance(account, denom))?
            .and_then(|v| v.as_amount())
            .unwrap_or(Decimal::ZERO))
    }

    pub fn credit(&mut self, account: &str, denom: &str, amount: Decimal) -> Result<()> {
        let current = self.balance(account, denom)?;
        self.set(
            AccessKey::balance(account, denom),
            StateValue::Amount(current + amount),
        )
    }

    /// Move `amount` of `denom` between accounts.
    ///
    /// # Errors
    /// `InsufficientFunds` when `from` cannot cover the amount, or
    /// `UndeclaredAccess` when either balance was not declared as written.
    pub fn transfer(&mut self, from: &str, to: &str, denom: &str, amount: Decimal) -> Result<()> {
        let available = self.balance(from, denom)?;
        if available < amount {
            return Err(ChaindexError::InsufficientFunds {
                account: from.to_string(),
                denom: denom.to_string(),
                needed: amount,
                available,
            });
        }
        self.set(
            AccessKey::balance(from, denom),
            StateValue::Amount(available - amount),
        )?;
        self.credit(to, denom, amount)
    }

    // -----------------------------------------------------------------
    // Match state
    // -----------------------------------------------------------------

    pub fn place_order(&mut self, order: Order) -> Result<()> {
        self.check(
            &AccessKey::match_bucket(&order.contract_addr, &order.pair_key()),
            AccessType::Write,
        )?;
        self.memstate.record_order(self.origin(), order);
        Ok(())
    }

    pub fn cancel_order(&mut self, cancellation: Cancellation) -> Result<()> {
        self.check(
            &AccessKey::match_bucket(&cancellation.contract_addr, &cancellation.pair_key()),
            AccessType::Write,
        )?;
        self.memstate.record_cancellation(self.origin(), cancellation);
        Ok(())
    }

    pub fn record_settlement(
        &mut self,
        contract: &ContractAddress,
        entry: SettlementEntry,
    ) -> Result<()> {
        self.check(
            &AccessKey::match_bucket(contract, &entry.pair_key()),
            AccessType::Write,
        )?;
        self.memstate.record_settlement(self.origin(), contract, entry);
        Ok(())
    }

    /// Consume the context, yielding the buffered writes.
    #[must_use]
    pub fn into_writes(self) -> WriteSet {
        self.writes
    }
}
