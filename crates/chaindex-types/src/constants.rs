//! System-wide constants for chaindex.

/// Default gas charged per pending cancellation during end-of-block.
pub const DEFAULT_GAS_PER_CANCEL: u64 = 53_000;

/// Default gas charged per order placement.
pub const DEFAULT_GAS_PER_ORDER: u64 = 55_000;

/// Default number of transactions allowed to execute at once.
pub const DEFAULT_CONCURRENCY_WORKERS: usize = 20;

/// A transaction group still running after this long is reported.
pub const DEFAULT_GROUP_NOT_DONE_AFTER_MS: u64 = 2_000;

/// A sudo call still running after this long is reported.
pub const DEFAULT_SUDO_NOT_DONE_AFTER_MS: u64 = 5_000;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Prefix for every metric name.
pub const METRIC_PREFIX: &str = "chaindex";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

