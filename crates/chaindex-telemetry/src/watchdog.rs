//! "Not done after" reporting for long-running operations.
//!
//! Nothing here aborts work. An overrun is logged and counted under
//! `chaindex_log_not_done_after{label}`; the operation keeps running to
//! completion.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::{Telemetry, metrics};

/// Await `fut`, reporting once if it is still pending after `after`.
pub async fn log_if_not_done_after<F>(
    telemetry: &dyn Telemetry,
    label: &str,
    after: Duration,
    fut: F,
) -> F::Output
where
    F: Future,
{
    tokio::pin!(fut);
    tokio::select! {
        out = &mut fut => return out,
        () = tokio::time::sleep(after) => {
            report(telemetry, label, after);
        }
    }
    fut.await
}

/// Synchronous counterpart: call after a blocking operation returns.
/// Returns whether the deadline was exceeded.
pub fn report_if_exceeded(
    telemetry: &dyn Telemetry,
    label: &str,
    start: Instant,
    after: Duration,
) -> bool {
    let elapsed = start.elapsed();
    if elapsed <= after {
        return false;
    }
    report(telemetry, label, after);
    true
}

fn report(telemetry: &dyn Telemetry, label: &str, after: Duration) {
    tracing::warn!(
        label,
        after_ms = u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
        "Operation not done after deadline"
    );
    metrics::incr_log_if_not_done_after(telemetry, label);
}
