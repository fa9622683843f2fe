//! # chaindex-types
//!
//! Shared types, errors, and configuration for the **chaindex** execution
//! and settlement core.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`ContractAddress`], [`Pair`], [`PairKey`], [`TxIndex`], [`Origin`]
//! - **Order model**: [`Order`], [`Cancellation`], [`OrderType`], [`PositionDirection`]
//! - **Settlement model**: [`SettlementEntry`]
//! - **Canonical ordering**: [`Canonical`], [`MatchResult`], [`canonical_sort`]
//! - **Sudo messages**: [`SudoMsg`], [`SudoResponse`]
//! - **Context**: [`BlockContext`]
//! - **Configuration**: [`ChainConfig`], [`Params`], [`SchedulerConfig`], [`EndBlockConfig`]
//! - **Errors**: [`ChaindexError`] with `DEX_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod canonical;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod ids;
pub mod match_result;
pub mod order;
pub mod settlement;
pub mod sudo;

// Re-export all primary types at crate root for ergonomic imports:
//   use chaindex_types::{Order, Cancellation, MatchResult, SudoMsg, ...};

pub use canonical::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use ids::*;
pub use match_result::*;
pub use order::*;
pub use settlement::*;
pub use sudo::*;

// Constants are accessed via `chaindex_types::constants::FOO`
// (not re-exported to avoid name collisions).
