//! Error types for chaindex.
//!
//! All errors use the `DEX_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Match-state store errors
//! - 2xx: Parameter errors
//! - 3xx: Contract call errors
//! - 4xx: Scheduling errors
//! - 5xx: Transaction execution errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{ContractAddress, PairKey, TxIndex};

/// Central error enum for all chaindex operations.
#[derive(Debug, Error)]
pub enum ChaindexError {
    // =================================================================
    // Match-State Store Errors (1xx)
    // =================================================================
    /// No bucket exists for the pair, either because nothing was recorded
    /// or because the store was cleared at block end.
    #[error("DEX_ERR_100: Match-state bucket not found: {contract} {pair}")]
    BucketNotFound {
        contract: ContractAddress,
        pair: PairKey,
    },

    // =================================================================
    // Parameter Errors (2xx)
    // =================================================================
    /// The keeper has no value for a required parameter.
    #[error("DEX_ERR_200: Missing parameter: {0}")]
    MissingParameter(&'static str),

    /// A parameter is present but unusable.
    #[error("DEX_ERR_201: Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// `gas per unit × count` does not fit in a u64.
    #[error("DEX_ERR_202: Gas overflow: {per_unit} x {count}")]
    GasOverflow { per_unit: u64, count: usize },

    // =================================================================
    // Contract Call Errors (3xx)
    // =================================================================
    /// The contract runtime rejected or failed a sudo call.
    #[error("DEX_ERR_300: Contract call to {contract} failed: {reason}")]
    ContractCall {
        contract: ContractAddress,
        reason: String,
    },

    /// The contract is not registered with the module.
    #[error("DEX_ERR_301: Contract not registered: {0}")]
    ContractNotRegistered(ContractAddress),

    // =================================================================
    // Scheduling Errors (4xx)
    // =================================================================
    /// The executor's worker pool was shut down mid-block.
    #[error("DEX_ERR_400: Worker pool closed")]
    WorkerPoolClosed,

    // =================================================================
    // Transaction Execution Errors (5xx)
    // =================================================================
    /// A transaction touched a key outside its declared access set.
    #[error("DEX_ERR_500: {tx} accessed undeclared key {key} ({access})")]
    UndeclaredAccess {
        tx: TxIndex,
        key: String,
        access: &'static str,
    },

    /// Not enough balance for a transfer.
    #[error("DEX_ERR_501: Insufficient funds for {account} in {denom}: need {needed}, have {available}")]
    InsufficientFunds {
        account: String,
        denom: String,
        needed: Decimal,
        available: Decimal,
    },

    /// Transaction logic rejected the transaction.
    #[error("DEX_ERR_502: Transaction failed: {reason}")]
    TxFailed { reason: String },

    /// Transaction logic panicked; the panic was contained.
    #[error("DEX_ERR_503: {tx} panicked: {message}")]
    TxPanicked { tx: TxIndex, message: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("DEX_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("DEX_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("DEX_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("DEX_ERR_903: I/O error: {0}")]
    Io(String),
}

impl ChaindexError {
    /// Shorthand for transaction-logic rejections.
    pub fn tx_failed(reason: impl Into<String>) -> Self {
        Self::TxFailed {
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, ChaindexError>;

impl From<std::io::Error> for ChaindexError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_not_found_display() {
        let err = ChaindexError::BucketNotFound {
            contract: ContractAddress::new("dex1c"),
            pair: PairKey::new("USDC", "ATOM"),
        };
        let msg = format!("{err}");
        assert!(msg.starts_with("DEX_ERR_100"), "Got: {msg}");
        assert!(msg.contains("USDC|ATOM"));
    }

    #[test]
    fn insufficient_funds_display() {
        let err = ChaindexError::InsufficientFunds {
            account: "alice".into(),
            denom: "usdc".into(),
            needed: Decimal::new(100, 0),
            available: Decimal::new(50, 0),
        };
        let msg = format!("{err}");
        assert!(msg.contains("DEX_ERR_501"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn all_errors_have_dex_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(ChaindexError::MissingParameter("default_gas_per_cancel")),
            Box::new(ChaindexError::GasOverflow {
                per_unit: u64::MAX,
                count: 2,
            }),
            Box::new(ChaindexError::WorkerPoolClosed),
            Box::new(ChaindexError::tx_failed("boom")),
            Box::new(ChaindexError::TxPanicked {
                tx: TxIndex(4),
                message: "oops".into(),
            }),
            Box::new(ChaindexError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("DEX_ERR_"),
                "Error missing DEX_ERR_ prefix: {msg}"
            );
        }
    }
}
