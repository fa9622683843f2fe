//! Named metrics emitted by the execution and settlement core.
//!
//! Each helper fixes a metric name and its label keys so call sites cannot
//! drift. Names are listed as the Prometheus series they produce.

use std::time::Instant;

use chaindex_types::constants::METRIC_PREFIX;

use crate::{Label, Telemetry};

/// Time taken to execute a sudo message.
///
/// `chaindex_sudo_duration_milliseconds{type}`
pub fn measure_sudo_execution_duration(t: &dyn Telemetry, start: Instant, msg_type: &str) {
    t.measure_since(
        &[METRIC_PREFIX, "sudo", "duration", "milliseconds"],
        start,
        &[Label::new("type", msg_type)],
    );
}

/// Failed sudo executions.
///
/// `chaindex_sudo_error_count{type}`
pub fn increment_sudo_fail_count(t: &dyn Telemetry, msg_type: &str) {
    t.incr_counter(
        &[METRIC_PREFIX, "sudo", "error", "count"],
        1.0,
        &[Label::new("type", msg_type)],
    );
}

/// Constant gauge carrying the running version and commit as labels.
///
/// `chaindex_version_and_commit{version,commit}`
pub fn gauge_version_and_commit(t: &dyn Telemetry, version: &str, commit: &str) {
    t.set_gauge(
        &[METRIC_PREFIX, "version", "and", "commit"],
        1.0,
        &[Label::new("version", version), Label::new("commit", commit)],
    );
}

/// `chaindex_tx_process_type{type}`
pub fn incr_tx_process_type_counter(t: &dyn Telemetry, process_type: &str) {
    t.incr_counter(
        &[METRIC_PREFIX, "tx", "process", "type"],
        1.0,
        &[Label::new("type", process_type)],
    );
}

/// Time taken to process a block, by process type.
///
/// `chaindex_process_block_milliseconds{type}`
pub fn block_process_latency(t: &dyn Telemetry, start: Instant, process_type: &str) {
    t.measure_since(
        &[METRIC_PREFIX, "process", "block", "milliseconds"],
        start,
        &[Label::new("type", process_type)],
    );
}

/// Dependency graph construction failures.
///
/// `chaindex_dag_build_error{reason}`
pub fn incr_dag_build_error_counter(t: &dyn Telemetry, reason: &str) {
    t.incr_counter(
        &[METRIC_PREFIX, "dag", "build", "error"],
        1.0,
        &[Label::new("reason", reason)],
    );
}

/// Transactions that failed under concurrent delivery.
///
/// `chaindex_tx_concurrent_delivertx_error`
pub fn incr_failed_concurrent_deliver_tx_counter(t: &dyn Telemetry) {
    t.incr_counter(
        &[METRIC_PREFIX, "tx", "concurrent", "delivertx", "error"],
        1.0,
        &[],
    );
}

/// Operations still running past their expected duration.
///
/// `chaindex_log_not_done_after{label}`
pub fn incr_log_if_not_done_after(t: &dyn Telemetry, label: &str) {
    t.incr_counter(
        &[METRIC_PREFIX, "log", "not", "done", "after"],
        1.0,
        &[Label::new("label", label)],
    );
}

/// `chaindex_deliver_tx_milliseconds`
pub fn measure_deliver_tx_duration(t: &dyn Telemetry, start: Instant) {
    t.measure_since(&[METRIC_PREFIX, "deliver", "tx", "milliseconds"], start, &[]);
}

/// `chaindex_oracle_vote_penalty_count{type,validator}`
#[allow(clippy::cast_precision_loss)]
pub fn set_oracle_vote_penalty_count(
    t: &dyn Telemetry,
    count: u64,
    validator: &str,
    penalty_type: &str,
) {
    t.set_gauge(
        &[METRIC_PREFIX, "oracle", "vote", "penalty", "count"],
        count as f64,
        &[
            Label::new("type", penalty_type),
            Label::new("validator", validator),
        ],
    );
}

/// `chaindex_epoch_new`
#[allow(clippy::cast_precision_loss)]
pub fn set_epoch_new(t: &dyn Telemetry, epoch: u64) {
    t.set_gauge(&[METRIC_PREFIX, "epoch", "new"], epoch as f64, &[]);
}

/// `chaindex_throughput_<metric_name>`
pub fn set_throughput_metric(t: &dyn Telemetry, metric_name: &str, value: f64) {
    t.set_gauge(&[METRIC_PREFIX, "throughput", metric_name], value, &[]);
}
