//! The telemetry capability and its in-process sinks.
//!
//! Components never reach for a global registry. They hold an
//! `Arc<dyn Telemetry>` handed to them at construction, so tests can pass a
//! [`MemoryTelemetry`] and assert on exactly what was emitted.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// A metric label (`name=value`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Label {
    pub name: &'static str,
    pub value: String,
}

impl Label {
    pub fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Fire-and-forget metric sink.
///
/// Metric names are passed as segments (`["chaindex", "sudo", "error", "count"]`)
/// and joined with `_` by the sink. No method returns an error; a sink that
/// cannot record a sample drops it.
pub trait Telemetry: Send + Sync {
    fn incr_counter(&self, name: &[&str], value: f64, labels: &[Label]);

    fn set_gauge(&self, name: &[&str], value: f64, labels: &[Label]);

    /// Record the milliseconds elapsed since `start`.
    fn measure_since(&self, name: &[&str], start: Instant, labels: &[Label]);
}

/// Joins name segments the way every sink names its series.
#[must_use]
pub fn metric_name(name: &[&str]) -> String {
    name.join("_")
}

// ---------------------------------------------------------------------------
// NoopTelemetry
// ---------------------------------------------------------------------------

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn incr_counter(&self, _name: &[&str], _value: f64, _labels: &[Label]) {}

    fn set_gauge(&self, _name: &[&str], _value: f64, _labels: &[Label]) {}

    fn measure_since(&self, _name: &[&str], _start: Instant, _labels: &[Label]) {}
}

// ---------------------------------------------------------------------------
// MemoryTelemetry
// ---------------------------------------------------------------------------

type SeriesKey = (String, Vec<(String, String)>);

fn series_key(name: &[&str], labels: &[Label]) -> SeriesKey {
    let mut pairs: Vec<(String, String)> = labels
        .iter()
        .map(|l| (l.name.to_string(), l.value.clone()))
        .collect();
    pairs.sort();
    (metric_name(name), pairs)
}

fn query_key(name: &str, labels: &[(&str, &str)]) -> SeriesKey {
    let mut pairs: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    pairs.sort();
    (name.to_string(), pairs)
}

#[derive(Debug, Default)]
struct Recorded {
    counters: BTreeMap<SeriesKey, f64>,
    gauges: BTreeMap<SeriesKey, f64>,
    samples: BTreeMap<SeriesKey, Vec<f64>>,
}

/// Keeps every emitted value in memory, queryable by joined name and labels.
#[derive(Debug, Default)]
pub struct MemoryTelemetry {
    inner: Mutex<Recorded>,
}

impl MemoryTelemetry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Recorded) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Counter value for an exact label set (0 when never incremented).
    #[must_use]
    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> f64 {
        let key = query_key(name, labels);
        self.with(|r| r.counters.get(&key).copied().unwrap_or(0.0))
    }

    /// Sum of a counter across every label set.
    #[must_use]
    pub fn counter_total(&self, name: &str) -> f64 {
        self.with(|r| {
            r.counters
                .iter()
                .filter(|((n, _), _)| n == name)
                .map(|(_, v)| *v)
                .sum()
        })
    }

    #[must_use]
    pub fn gauge(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        let key = query_key(name, labels);
        self.with(|r| r.gauges.get(&key).copied())
    }

    /// Number of duration samples recorded across every label set.
    #[must_use]
    pub fn sample_count(&self, name: &str) -> usize {
        self.with(|r| {
            r.samples
                .iter()
                .filter(|((n, _), _)| n == name)
                .map(|(_, v)| v.len())
                .sum()
        })
    }

    pub fn reset(&self) {
        self.with(|r| *r = Recorded::default());
    }
}

impl Telemetry for MemoryTelemetry {
    fn incr_counter(&self, name: &[&str], value: f64, labels: &[Label]) {
        let key = series_key(name, labels);
        self.with(|r| *r.counters.entry(key).or_insert(0.0) += value);
    }

    fn set_gauge(&self, name: &[&str], value: f64, labels: &[Label]) {
        let key = series_key(name, labels);
        self.with(|r| {
            r.gauges.insert(key, value);
        });
    }

    fn measure_since(&self, name: &[&str], start: Instant, labels: &[Label]) {
        let key = series_key(name, labels);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.with(|r| r.samples.entry(key).or_default().push(elapsed_ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_accumulates_per_label_set() {
        let t = MemoryTelemetry::new();
        t.incr_counter(&["a", "b"], 1.0, &[Label::new("type", "x")]);
        t.incr_counter(&["a", "b"], 2.0, &[Label::new("type", "x")]);
        t.incr_counter(&["a", "b"], 1.0, &[Label::new("type", "y")]);
        assert!((t.counter("a_b", &[("type", "x")]) - 3.0).abs() < f64::EPSILON);
        assert!((t.counter_total("a_b") - 4.0).abs() < f64::EPSILON);
        assert!(t.counter("a_b", &[]).abs() < f64::EPSILON);
    }

    #[test]
    fn label_order_does_not_matter() {
        let t = MemoryTelemetry::new();
        t.incr_counter(
            &["m"],
            1.0,
            &[Label::new("b", "2"), Label::new("a", "1")],
        );
        assert!((t.counter("m", &[("a", "1"), ("b", "2")]) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn gauge_overwrites() {
        let t = MemoryTelemetry::new();
        t.set_gauge(&["g"], 1.0, &[]);
        t.set_gauge(&["g"], 5.0, &[]);
        assert_eq!(t.gauge("g", &[]), Some(5.0));
        assert_eq!(t.gauge("missing", &[]), None);
    }

    #[test]
    fn samples_and_reset() {
        let t = MemoryTelemetry::new();
        t.measure_since(&["d"], Instant::now(), &[]);
        t.measure_since(&["d"], Instant::now(), &[Label::new("type", "z")]);
        assert_eq!(t.sample_count("d"), 2);
        t.reset();
        assert_eq!(t.sample_count("d"), 0);
    }

    #[test]
    fn noop_accepts_everything() {
        let t = NoopTelemetry;
        t.incr_counter(&["x"], 1.0, &[]);
        t.set_gauge(&["x"], 1.0, &[]);
        t.measure_since(&["x"], Instant::now(), &[]);
    }
}
