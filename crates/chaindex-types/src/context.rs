//! Chain context handed to collaborators for the block being processed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub chain_id: String,
    pub height: u64,
    /// Consensus block time. Never wall-clock time: every node must see the
    /// same value.
    pub block_time: DateTime<Utc>,
}

impl BlockContext {
    #[must_use]
    pub fn new(chain_id: impl Into<String>, height: u64, block_time: DateTime<Utc>) -> Self {
        Self {
            chain_id: chain_id.into(),
            height,
            block_time,
        }
    }

    /// Block time as unix seconds, the unit settlement entries carry.
    #[must_use]
    pub fn unix_time(&self) -> u64 {
        u64::try_from(self.block_time.timestamp()).unwrap_or(0)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl BlockContext {
    pub fn dummy(height: u64) -> Self {
        Self::new("chaindex-test", height, DateTime::<Utc>::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_time_at_epoch() {
        assert_eq!(BlockContext::dummy(1).unix_time(), 0);
    }

    #[test]
    fn pre_epoch_clamps_to_zero() {
        let ctx = BlockContext::new("c", 1, DateTime::<Utc>::from_timestamp(-5, 0).unwrap());
        assert_eq!(ctx.unix_time(), 0);
    }
}
