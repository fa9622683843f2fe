//! # chaindex-executor
//!
//! Concurrent execution of a block's transactions.
//!
//! - [`AccessSet`]: the keys a transaction declares before it runs
//! - [`DependencyDag`]: conflict graph and level grouping
//! - [`BlockExecutor`]: runs groups concurrently, commits in block order,
//!   falls back to sequential execution when the graph cannot be built
//! - [`StateStore`] / [`TxContext`]: committed state and the per-transaction
//!   view onto it

pub mod access;
pub mod context;
pub mod dag;
pub mod executor;
pub mod state;
pub mod tx;

pub use access::{AccessKey, AccessSet, AccessType};
pub use context::TxContext;
pub use dag::{DagBuildError, DependencyDag};
pub use executor::{BlockExecution, BlockExecutor, ProcessType, SharedTx, TxFailure};
pub use state::{StateStore, StateValue, WriteSet};
pub use tx::{DeliverTx, TxResponse};
