//! Concurrent block executor.
//!
//! A block is split into dependency-ordered groups (see [`crate::dag`]).
//! Groups run one after another; the transactions of a group run on
//! blocking worker threads, bounded by a semaphore, and report back over a
//! channel. Draining the channel is the group barrier. Buffered writes are
//! then committed in transaction index order.
//!
//! If the graph cannot be built the block runs sequentially, with one
//! `dag_build_error` signal. A failing or panicking transaction is rolled
//! back and recorded; its siblings and later groups are unaffected.
//!
//! Declared access is enforced the same way in every mode. Only a
//! transaction whose access set cannot be determined runs unrestricted.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chaindex_matchcore::MemState;
use chaindex_telemetry::{Telemetry, log_if_not_done_after, metrics};
use chaindex_types::{BlockContext, ChaindexError, Origin, Result, SchedulerConfig, TxIndex};
use tokio::sync::{Semaphore, mpsc};

use crate::access::AccessSet;
use crate::context::TxContext;
use crate::dag::{DagBuildError, DependencyDag};
use crate::state::{StateStore, WriteSet};
use crate::tx::{DeliverTx, TxResponse};

pub type SharedTx = Arc<dyn DeliverTx>;

/// How a block was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessType {
    Concurrent,
    Sequential,
}

impl ProcessType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Concurrent => "concurrent",
            Self::Sequential => "sequential",
        }
    }
}

/// A transaction that did not commit.
#[derive(Debug)]
pub struct TxFailure {
    pub index: TxIndex,
    pub error: ChaindexError,
}

/// Outcome of one block.
#[derive(Debug)]
pub struct BlockExecution {
    pub state: StateStore,
    /// One entry per transaction, in block order.
    pub results: Vec<std::result::Result<TxResponse, TxFailure>>,
    pub process_type: ProcessType,
    pub group_count: usize,
    pub dag_error: Option<DagBuildError>,
}

impl BlockExecution {
    pub fn failures(&self) -> impl Iterator<Item = &TxFailure> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }

    #[must_use]
    pub fn failed_indices(&self) -> Vec<TxIndex> {
        self.failures().map(|f| f.index).collect()
    }

    #[must_use]
    pub fn gas_used(&self) -> u64 {
        self.results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|r| r.gas_used)
            .sum()
    }
}

type Delivery = Result<(TxResponse, WriteSet)>;

pub struct BlockExecutor {
    config: SchedulerConfig,
    telemetry: Arc<dyn Telemetry>,
}

impl BlockExecutor {
    #[must_use]
    pub fn new(config: SchedulerConfig, telemetry: Arc<dyn Telemetry>) -> Self {
        Self { config, telemetry }
    }

    /// Execute `txs` against `state`.
    ///
    /// # Errors
    /// Only infrastructure failures (worker pool gone). Transaction
    /// failures are reported inside [`BlockExecution::results`].
    pub async fn execute(
        &self,
        block: &BlockContext,
        state: StateStore,
        memstate: &Arc<MemState>,
        txs: &[SharedTx],
    ) -> Result<BlockExecution> {
        let start = Instant::now();
        let block = Arc::new(block.clone());

        let execution = if self.config.enabled {
            match DependencyDag::from_txs(txs) {
                Ok((dag, sets)) => {
                    self.execute_concurrent(&block, state, memstate, txs, &dag, sets)
                        .await?
                }
                Err(err) => {
                    tracing::warn!(
                        height = block.height,
                        reason = %err.reason,
                        error = %err,
                        "Dependency graph build failed, executing block sequentially"
                    );
                    metrics::incr_dag_build_error_counter(self.telemetry.as_ref(), &err.reason);
                    let mut execution =
                        self.execute_sequential(&block, state, memstate, txs).await?;
                    execution.dag_error = Some(err);
                    execution
                }
            }
        } else {
            self.execute_sequential(&block, state, memstate, txs).await?
        };

        let process_type = execution.process_type.as_str();
        metrics::incr_tx_process_type_counter(self.telemetry.as_ref(), process_type);
        metrics::block_process_latency(self.telemetry.as_ref(), start, process_type);
        tracing::info!(
            height = block.height,
            process_type,
            txs = txs.len(),
            groups = execution.group_count,
            failed = execution.failures().count(),
            "Block executed"
        );
        Ok(execution)
    }

    // -----------------------------------------------------------------
    // Concurrent path
    // -----------------------------------------------------------------

    async fn execute_concurrent(
        &self,
        block: &Arc<BlockContext>,
        mut state: StateStore,
        memstate: &Arc<MemState>,
        txs: &[SharedTx],
        dag: &DependencyDag,
        sets: Vec<AccessSet>,
    ) -> Result<BlockExecution> {
        let sets: Vec<Arc<AccessSet>> = sets.into_iter().map(Arc::new).collect();
        let groups = dag.groups();
        let not_done_after = Duration::from_millis(self.config.not_done_after_ms);
        let mut results: Vec<Option<std::result::Result<TxResponse, TxFailure>>> =
            txs.iter().map(|_| None).collect();

        tracing::debug!(
            height = block.height,
            groups = groups.len(),
            edges = dag.edge_count(),
            "Dependency graph built"
        );

        for (n, group) in groups.iter().enumerate() {
            let snapshot = Arc::new(state);
            let label = format!("tx_group_{n}");
            let deliveries = log_if_not_done_after(
                self.telemetry.as_ref(),
                &label,
                not_done_after,
                self.run_group(block, &snapshot, memstate, txs, &sets, group),
            )
            .await?;
            state = Arc::try_unwrap(snapshot).unwrap_or_else(|shared| (*shared).clone());

            for (index, delivery) in deliveries {
                let outcome = match delivery {
                    Ok((response, writes)) => {
                        state.apply(writes);
                        Ok(response)
                    }
                    Err(error) => {
                        metrics::incr_failed_concurrent_deliver_tx_counter(
                            self.telemetry.as_ref(),
                        );
                        Err(roll_back(memstate, index, error))
                    }
                };
                results[index.as_usize()] = Some(outcome);
            }
        }

        let results = results
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                r.ok_or_else(|| {
                    ChaindexError::Internal(format!("tx:{i} was never scheduled"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BlockExecution {
            state,
            results,
            process_type: ProcessType::Concurrent,
            group_count: groups.len(),
            dag_error: None,
        })
    }

    /// Run one group and return its deliveries sorted by index.
    async fn run_group(
        &self,
        block: &Arc<BlockContext>,
        snapshot: &Arc<StateStore>,
        memstate: &Arc<MemState>,
        txs: &[SharedTx],
        sets: &[Arc<AccessSet>],
        group: &[TxIndex],
    ) -> Result<Vec<(TxIndex, Delivery)>> {
        let (sender, mut receiver) = mpsc::channel(group.len().max(1));
        let permits = Arc::new(Semaphore::new(self.config.concurrency_workers.max(1)));

        for &index in group {
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|_| ChaindexError::WorkerPoolClosed)?;
            let ctx = TxContext::new(
                index,
                Arc::clone(block),
                Arc::clone(snapshot),
                Arc::clone(memstate),
                Some(Arc::clone(&sets[index.as_usize()])),
            );
            let tx = Arc::clone(&txs[index.as_usize()]);
            let telemetry = Arc::clone(&self.telemetry);
            let sender = sender.clone();

            tokio::task::spawn_blocking(move || {
                let delivery = deliver_one(telemetry.as_ref(), tx.as_ref(), ctx);
                drop(permit);
                // receiver outlives every sender
                let _ = sender.blocking_send((index, delivery));
            });
        }
        drop(sender);

        let mut deliveries = Vec::with_capacity(group.len());
        while let Some(item) = receiver.recv().await {
            deliveries.push(item);
        }
        if deliveries.len() != group.len() {
            return Err(ChaindexError::WorkerPoolClosed);
        }
        deliveries.sort_by_key(|(index, _)| *index);
        Ok(deliveries)
    }

    // -----------------------------------------------------------------
    // Sequential path
    // -----------------------------------------------------------------

    async fn execute_sequential(
        &self,
        block: &Arc<BlockContext>,
        mut state: StateStore,
        memstate: &Arc<MemState>,
        txs: &[SharedTx],
    ) -> Result<BlockExecution> {
        let mut results = Vec::with_capacity(txs.len());

        for (i, tx) in txs.iter().enumerate() {
            let index = TxIndex(
                u32::try_from(i).map_err(|_| ChaindexError::Internal("block too large".into()))?,
            );
            let declared = tx.access_set().ok().map(Arc::new);
            let snapshot = Arc::new(state);
            let ctx = TxContext::new(
                index,
                Arc::clone(block),
                Arc::clone(&snapshot),
                Arc::clone(memstate),
                declared,
            );
            let tx = Arc::clone(tx);
            let telemetry = Arc::clone(&self.telemetry);
            let delivery = tokio::task::spawn_blocking(move || {
                deliver_one(telemetry.as_ref(), tx.as_ref(), ctx)
            })
            .await
            .map_err(|_| ChaindexError::WorkerPoolClosed)?;
            state = Arc::try_unwrap(snapshot).unwrap_or_else(|shared| (*shared).clone());

            results.push(match delivery {
                Ok((response, writes)) => {
                    state.apply(writes);
                    Ok(response)
                }
                Err(error) => Err(roll_back(memstate, index, error)),
            });
        }

        Ok(BlockExecution {
            state,
            results,
            process_type: ProcessType::Sequential,
            group_count: txs.len(),
            dag_error: None,
        })
    }
}

fn roll_back(memstate: &MemState, index: TxIndex, error: ChaindexError) -> TxFailure {
    tracing::warn!(tx = %index, error = %error, "Transaction failed, rolling back");
    memstate.discard_origin(Origin::Tx(index));
    TxFailure { index, error }
}

/// Deliver one transaction, containing panics.
fn deliver_one(telemetry: &dyn Telemetry, tx: &dyn DeliverTx, mut ctx: TxContext) -> Delivery {
    let start = Instant::now();
    let index = ctx.index();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| tx.deliver(&mut ctx)));
    metrics::measure_deliver_tx_duration(telemetry, start);

    match outcome {
        Ok(Ok(response)) => Ok((response, ctx.into_writes())),
        Ok(Err(error)) => Err(error),
        Err(payload) => Err(ChaindexError::TxPanicked {
            tx: index,
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
