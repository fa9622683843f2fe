//! End-block pipeline.
//!
//! Runs after every transaction of the block has committed:
//! 1. For each registered contract, in registration order, send pending
//!    cancellations (see [`crate::cancel_orders`])
//! 2. Apply the [`FailurePolicy`] to contracts whose pass failed
//! 3. Build the canonical [`MatchResult`] and its root for every pair of
//!    every contract that succeeded
//! 4. Clear the match-state store for the next block

use std::sync::Arc;
use std::time::Duration;

use chaindex_matchcore::{MemState, compute_result_root, root_hex};
use chaindex_telemetry::{Telemetry, metrics};
use chaindex_types::{
    BlockContext, ChaindexError, ContractAddress, EndBlockConfig, FailurePolicy, MatchResult,
    Pair, Result,
};

use crate::cancel_orders::{CancelOrchestrator, CancelOutcome};
use crate::keeper::Keeper;
use crate::sudo::ContractCaller;

/// Final match state of one contract and pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSettlement {
    pub contract: ContractAddress,
    pub pair: Pair,
    pub result: MatchResult,
    pub root: [u8; 32],
}

impl ContractSettlement {
    #[must_use]
    pub fn root_hex(&self) -> String {
        root_hex(&self.root)
    }
}

/// Everything the end-block pass produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSettlement {
    pub height: u64,
    /// Cancellation outcome per successful contract, in registration order.
    pub cancellations: Vec<(ContractAddress, CancelOutcome)>,
    pub settlements: Vec<ContractSettlement>,
    /// Contracts skipped under [`FailurePolicy::SkipContract`].
    pub failed_contracts: Vec<ContractAddress>,
}

impl BlockSettlement {
    #[must_use]
    pub fn cancelled_count(&self) -> usize {
        self.cancellations.iter().map(|(_, o)| o.ids.len()).sum()
    }
}

pub struct EndBlocker {
    keeper: Arc<dyn Keeper>,
    orchestrator: CancelOrchestrator,
    telemetry: Arc<dyn Telemetry>,
    failure_policy: FailurePolicy,
}

impl EndBlocker {
    #[must_use]
    pub fn new(
        keeper: Arc<dyn Keeper>,
        caller: Arc<dyn ContractCaller>,
        telemetry: Arc<dyn Telemetry>,
        config: &EndBlockConfig,
    ) -> Self {
        let orchestrator = CancelOrchestrator::new(
            caller,
            Arc::clone(&telemetry),
            Duration::from_millis(config.sudo_not_done_after_ms),
        );
        Self {
            keeper,
            orchestrator,
            telemetry,
            failure_policy: config.failure_policy,
        }
    }

    /// Run the end-block pass for `ctx.height`.
    ///
    /// # Errors
    /// Under [`FailurePolicy::Abort`], the first contract failure. The
    /// store is left untouched in that case.
    pub fn end_block(&self, ctx: &BlockContext, memstate: &MemState) -> Result<BlockSettlement> {
        let mut out = BlockSettlement {
            height: ctx.height,
            ..BlockSettlement::default()
        };

        for contract in self.keeper.registered_contracts() {
            match self.settle_contract(ctx, &contract, memstate) {
                Ok((outcome, settlements)) => {
                    out.cancellations.push((contract, outcome));
                    out.settlements.extend(settlements);
                }
                Err(e) => match self.failure_policy {
                    FailurePolicy::Abort => {
                        tracing::error!(height = ctx.height, %contract, error = %e, "End block aborted");
                        return Err(e);
                    }
                    FailurePolicy::SkipContract => {
                        tracing::warn!(height = ctx.height, %contract, error = %e, "Contract skipped for this block");
                        out.failed_contracts.push(contract);
                    }
                },
            }
        }

        memstate.clear();

        let cancelled = out.cancelled_count();
        #[allow(clippy::cast_precision_loss)]
        metrics::set_throughput_metric(self.telemetry.as_ref(), "cancellations", cancelled as f64);
        tracing::info!(
            height = ctx.height,
            contracts = out.cancellations.len(),
            failed = out.failed_contracts.len(),
            cancelled,
            "End block complete"
        );
        Ok(out)
    }

    fn settle_contract(
        &self,
        ctx: &BlockContext,
        contract: &ContractAddress,
        memstate: &MemState,
    ) -> Result<(CancelOutcome, Vec<ContractSettlement>)> {
        let params = self.keeper.params()?;
        let pairs = self.keeper.registered_pairs(contract)?;

        let outcome = self
            .orchestrator
            .cancel_orders(ctx, contract, &pairs, memstate, &params)?;

        let mut settlements = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let result = match memstate.match_result(contract, &pair.key()) {
                Ok(result) => result,
                Err(ChaindexError::BucketNotFound { .. }) => MatchResult::default(),
                Err(e) => return Err(e),
            };
            let root = compute_result_root(&result);
            tracing::debug!(%contract, %pair, root = %root_hex(&root), "Match result built");
            settlements.push(ContractSettlement {
                contract: contract.clone(),
                pair,
                result,
                root,
            });
        }
        Ok((outcome, settlements))
    }
}
