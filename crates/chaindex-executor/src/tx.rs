use chaindex_types::Result;

use crate::access::AccessSet;
use crate::context::TxContext;
use crate::dag::DagBuildError;

/// What a delivered transaction reports back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxResponse {
    pub gas_used: u64,
    pub log: String,
}

impl TxResponse {
    #[must_use]
    pub fn new(gas_used: u64, log: impl Into<String>) -> Self {
        Self {
            gas_used,
            log: log.into(),
        }
    }
}

/// A transaction the block executor can schedule.
///
/// `deliver` runs on a blocking worker thread and sees only the keys
/// `access_set` declared, unless the block fell back to sequential mode.
pub trait DeliverTx: Send + Sync {
    /// Keys this transaction will touch. An error means the set cannot be
    /// known before execution; the whole block then runs sequentially.
    fn access_set(&self) -> std::result::Result<AccessSet, DagBuildError>;

    fn deliver(&self, ctx: &mut TxContext) -> Result<TxResponse>;
}
