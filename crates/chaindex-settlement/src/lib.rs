//! # chaindex-settlement
//!
//! End-of-block processing for registered exchange contracts.
//!
//! ## Pipeline
//!
//! Once every transaction of a block has committed, [`EndBlocker`]:
//! 1. Sends each contract its pending cancellations as one sudo message,
//!    with gas proportional to the number of ids ([`CancelOrchestrator`])
//! 2. Skips or aborts on contract failure, per [`FailurePolicy`]
//! 3. Builds the canonical match result and root of every pair
//! 4. Clears the match-state store
//!
//! Collaborators are traits: [`Keeper`] for registration and parameters,
//! [`ContractCaller`] for the contract runtime.
//!
//! [`FailurePolicy`]: chaindex_types::FailurePolicy

pub mod cancel_orders;
pub mod end_block;
pub mod keeper;
pub mod sudo;

pub use cancel_orders::{CancelOrchestrator, CancelOutcome, cancel_gas_limit};
pub use end_block::{BlockSettlement, ContractSettlement, EndBlocker};
pub use keeper::{InMemoryKeeper, Keeper};
pub use sudo::{ContractCaller, call_contract_sudo};
