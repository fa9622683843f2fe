//! # chaindex-matchcore
//!
//! Block-scoped match state for the chaindex core.
//!
//! - [`MemState`]: concurrent per-`(contract, pair)` accumulation of orders,
//!   cancellations and settlement entries, read back in a deterministic order
//! - [`determinism`]: SHA-256 roots over canonical [`MatchResult`]s
//!
//! [`MatchResult`]: chaindex_types::MatchResult

pub mod determinism;
pub mod memstate;

pub use determinism::{compute_result_root, root_hex, verify_result_root};
pub use memstate::{BucketKey, MemState};
