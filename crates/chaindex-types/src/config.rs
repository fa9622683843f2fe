//! Configuration types for chaindex nodes.
//!
//! [`Params`] are chain parameters normally read from the keeper; the rest
//! is node-local tuning. Everything composes into [`ChainConfig`], which can
//! be loaded from JSON with missing sections falling back to defaults.

use serde::{Deserialize, Serialize};

use crate::{ChaindexError, Result, constants};

/// Chain parameters consumed by the end-of-block logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Gas granted to a contract per cancellation it must process.
    pub default_gas_per_cancel: u64,
    /// Gas granted per order placement.
    pub default_gas_per_order: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            default_gas_per_cancel: constants::DEFAULT_GAS_PER_CANCEL,
            default_gas_per_order: constants::DEFAULT_GAS_PER_ORDER,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<()> {
        if self.default_gas_per_cancel == 0 {
            return Err(ChaindexError::InvalidParameter {
                name: "default_gas_per_cancel",
                reason: "must be positive".into(),
            });
        }
        if self.default_gas_per_order == 0 {
            return Err(ChaindexError::InvalidParameter {
                name: "default_gas_per_order",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Tuning for the concurrent block executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// When false every block runs sequentially.
    pub enabled: bool,
    /// Maximum transactions executing at the same time.
    pub concurrency_workers: usize,
    /// Report a transaction group still running after this many ms.
    pub not_done_after_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency_workers: constants::DEFAULT_CONCURRENCY_WORKERS,
            not_done_after_ms: constants::DEFAULT_GROUP_NOT_DONE_AFTER_MS,
        }
    }
}

/// What the end-block pipeline does when a contract's sudo pass fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Return the error to the block-processing caller.
    Abort,
    /// Mark the contract as failed for this block and continue.
    #[default]
    SkipContract,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndBlockConfig {
    /// Report a sudo call still running after this many ms.
    pub sudo_not_done_after_ms: u64,
    pub failure_policy: FailurePolicy,
}

impl Default for EndBlockConfig {
    fn default() -> Self {
        Self {
            sudo_not_done_after_ms: constants::DEFAULT_SUDO_NOT_DONE_AFTER_MS,
            failure_policy: FailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: constants::DEFAULT_LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

/// Full node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub params: Params,
    pub scheduler: SchedulerConfig,
    pub end_block: EndBlockConfig,
    pub logging: LoggingConfig,
}

impl ChainConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|e| ChaindexError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        if self.scheduler.concurrency_workers == 0 {
            return Err(ChaindexError::Configuration(
                "scheduler.concurrency_workers must be positive".into(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ChaindexError::Configuration(
                "logging.level must not be empty".into(),
            ));
        }
        Ok(())
    }
}
