//! End-of-block cancellation of pending orders.
//!
//! Cancellations recorded during the block are forwarded to their contract
//! in a single `bulk_order_cancellations` sudo message, with a gas allowance
//! proportional to the number of ids.

use std::sync::Arc;
use std::time::Duration;

use chaindex_matchcore::MemState;
use chaindex_telemetry::Telemetry;
use chaindex_types::{
    BlockContext, ChaindexError, ContractAddress, OrderId, Pair, Params, Result, SudoMsg,
};

use crate::sudo::{ContractCaller, call_contract_sudo};

/// What the orchestrator sent for one contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelOutcome {
    /// Ids in the order they were sent. Empty when nothing was sent.
    pub ids: Vec<OrderId>,
    pub gas_limit: u64,
}

impl CancelOutcome {
    /// No sudo call was made.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Gas allowance for cancelling `count` orders. The contract runtime
/// enforces what is actually consumed.
///
/// # Errors
/// `GasOverflow` if the product does not fit in a u64.
pub fn cancel_gas_limit(params: &Params, count: usize) -> Result<u64> {
    u64::try_from(count)
        .ok()
        .and_then(|n| params.default_gas_per_cancel.checked_mul(n))
        .ok_or(ChaindexError::GasOverflow {
            per_unit: params.default_gas_per_cancel,
            count,
        })
}

pub struct CancelOrchestrator {
    caller: Arc<dyn ContractCaller>,
    telemetry: Arc<dyn Telemetry>,
    sudo_not_done_after: Duration,
}

impl CancelOrchestrator {
    #[must_use]
    pub fn new(
        caller: Arc<dyn ContractCaller>,
        telemetry: Arc<dyn Telemetry>,
        sudo_not_done_after: Duration,
    ) -> Self {
        Self {
            caller,
            telemetry,
            sudo_not_done_after,
        }
    }

    /// Pending cancellation ids of `contract`, pair by pair in `pairs`
    /// order, then in recording order. A pair nothing was recorded for
    /// contributes no ids.
    pub fn pending_ids(
        memstate: &MemState,
        contract: &ContractAddress,
        pairs: &[Pair],
    ) -> Result<Vec<OrderId>> {
        let mut ids = Vec::new();
        for pair in pairs {
            match memstate.cancellations(contract, &pair.key()) {
                Ok(cancellations) => ids.extend(cancellations.iter().map(|c| c.id)),
                Err(ChaindexError::BucketNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(ids)
    }

    /// Send the block's cancellations for `contract` to the contract.
    ///
    /// Makes no call when there is nothing to cancel.
    ///
    /// # Errors
    /// Gas computation errors and contract-call failures, unchanged.
    pub fn cancel_orders(
        &self,
        ctx: &BlockContext,
        contract: &ContractAddress,
        pairs: &[Pair],
        memstate: &MemState,
        params: &Params,
    ) -> Result<CancelOutcome> {
        let span = tracing::info_span!("SudoCancelOrders", contract_addr = %contract);
        let _enter = span.enter();

        let ids = Self::pending_ids(memstate, contract, pairs)?;
        if ids.is_empty() {
            return Ok(CancelOutcome::default());
        }

        let gas_limit = cancel_gas_limit(params, ids.len())?;
        let msg = SudoMsg::cancellations(ids.iter().copied());
        if let Err(e) = call_contract_sudo(
            self.caller.as_ref(),
            self.telemetry.as_ref(),
            ctx,
            contract,
            &msg,
            gas_limit,
            self.sudo_not_done_after,
        ) {
            tracing::error!(
                height = ctx.height,
                count = ids.len(),
                gas_limit,
                error = %e,
                "Error during cancellation"
            );
            return Err(e);
        }

        tracing::debug!(count = ids.len(), gas_limit, "Cancellations sent");
        Ok(CancelOutcome { ids, gas_limit })
    }
}
