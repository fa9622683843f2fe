//! # chaindex-telemetry
//!
//! Observability plumbing for the chaindex core:
//!
//! - [`Telemetry`]: the injected, fire-and-forget metric capability
//! - [`metrics`]: the named counters, gauges and timers the core emits
//! - Sinks: [`NoopTelemetry`], [`MemoryTelemetry`], [`PrometheusTelemetry`]
//! - [`watchdog`]: "not done after" reporting that never aborts work
//! - [`logging`]: `tracing-subscriber` setup

pub mod logging;
pub mod metrics;
pub mod prometheus_sink;
pub mod sink;
pub mod watchdog;

pub use logging::init_logging;
pub use prometheus_sink::PrometheusTelemetry;
pub use sink::{Label, MemoryTelemetry, NoopTelemetry, Telemetry, metric_name};
pub use watchdog::{log_if_not_done_after, report_if_exceeded};
