//! Prometheus-backed [`Telemetry`] sink.
//!
//! Series are created lazily on first use with the label keys of that first
//! sample. A later sample with a different label set for the same name is
//! dropped with a debug log; telemetry never fails the caller.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use prometheus::core::Collector;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};

use crate::{Label, Telemetry, metric_name};

#[derive(Default)]
struct Series {
    counters: HashMap<String, CounterVec>,
    gauges: HashMap<String, GaugeVec>,
    histograms: HashMap<String, HistogramVec>,
}

pub struct PrometheusTelemetry {
    registry: Registry,
    series: Mutex<Series>,
}

impl PrometheusTelemetry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(Registry::new())
    }

    #[must_use]
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry,
            series: Mutex::new(Series::default()),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Current state in the Prometheus text exposition format.
    #[must_use]
    pub fn gather_text(&self) -> String {
        let mut buf = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buf) {
            tracing::debug!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Series> {
        self.series.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns false when the registry refused the collector, e.g. a name
    /// already taken by a series of another kind. Samples still go to the
    /// unregistered vec but are never exported.
    fn register(&self, name: &str, collector: Box<dyn Collector>) -> bool {
        match self.registry.register(collector) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(metric = %name, error = %e, "Series not registered");
                false
            }
        }
    }
}

impl Default for PrometheusTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

fn split(labels: &[Label]) -> (Vec<&str>, Vec<&str>) {
    labels.iter().map(|l| (l.name, l.value.as_str())).unzip()
}

impl Telemetry for PrometheusTelemetry {
    fn incr_counter(&self, name: &[&str], value: f64, labels: &[Label]) {
        let name = metric_name(name);
        let (keys, values) = split(labels);
        let mut series = self.lock();
        let vec = if let Some(vec) = series.counters.get(&name) {
            vec.clone()
        } else {
            let Ok(vec) = CounterVec::new(Opts::new(name.clone(), name.clone()), &keys) else {
                tracing::debug!(metric = %name, "Invalid counter definition");
                return;
            };
            self.register(&name, Box::new(vec.clone()));
            series.counters.insert(name.clone(), vec.clone());
            vec
        };
        match vec.get_metric_with_label_values(&values) {
            Ok(counter) => counter.inc_by(value),
            Err(e) => tracing::debug!(metric = %name, error = %e, "Dropped counter sample"),
        }
    }

    fn set_gauge(&self, name: &[&str], value: f64, labels: &[Label]) {
        let name = metric_name(name);
        let (keys, values) = split(labels);
        let mut series = self.lock();
        let vec = if let Some(vec) = series.gauges.get(&name) {
            vec.clone()
        } else {
            let Ok(vec) = GaugeVec::new(Opts::new(name.clone(), name.clone()), &keys) else {
                tracing::debug!(metric = %name, "Invalid gauge definition");
                return;
            };
            self.register(&name, Box::new(vec.clone()));
            series.gauges.insert(name.clone(), vec.clone());
            vec
        };
        match vec.get_metric_with_label_values(&values) {
            Ok(gauge) => gauge.set(value),
            Err(e) => tracing::debug!(metric = %name, error = %e, "Dropped gauge sample"),
        }
    }

    fn measure_since(&self, name: &[&str], start: Instant, labels: &[Label]) {
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        let name = metric_name(name);
        let (keys, values) = split(labels);
        let mut series = self.lock();
        let vec = if let Some(vec) = series.histograms.get(&name) {
            vec.clone()
        } else {
            let Ok(vec) = HistogramVec::new(HistogramOpts::new(name.clone(), name.clone()), &keys)
            else {
                tracing::debug!(metric = %name, "Invalid histogram definition");
                return;
            };
            self.register(&name, Box::new(vec.clone()));
            series.histograms.insert(name.clone(), vec.clone());
            vec
        };
        match vec.get_metric_with_label_values(&values) {
            Ok(histogram) => histogram.observe(elapsed_ms),
            Err(e) => tracing::debug!(metric = %name, error = %e, "Dropped histogram sample"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;

    #[test]
    fn counters_show_up_in_exposition() {
        let t = PrometheusTelemetry::new();
        metrics::increment_sudo_fail_count(&t, "bulk_order_cancellations");
        metrics::increment_sudo_fail_count(&t, "bulk_order_cancellations");
        let text = t.gather_text();
        assert!(text.contains("chaindex_sudo_error_count"), "Got: {text}");
        assert!(text.contains("type=\"bulk_order_cancellations\"} 2"), "Got: {text}");
    }

    #[test]
    fn mismatched_labels_are_dropped_not_panicking() {
        let t = PrometheusTelemetry::new();
        t.incr_counter(&["m"], 1.0, &[Label::new("a", "1")]);
        t.incr_counter(&["m"], 1.0, &[]);
        assert!(t.gather_text().contains("m{a=\"1\"} 1"));
    }

    #[test]
    fn name_clash_across_kinds_is_not_exported() {
        let t = PrometheusTelemetry::new();
        t.incr_counter(&["dup"], 1.0, &[]);
        t.set_gauge(&["dup"], 5.0, &[]);

        let clash = GaugeVec::new(Opts::new("dup", "dup"), &[]).unwrap();
        assert!(!t.register("dup", Box::new(clash)));

        let text = t.gather_text();
        assert!(text.contains("# TYPE dup counter"), "Got: {text}");
        assert!(text.contains("dup 1"), "Got: {text}");
        assert!(!text.contains("dup 5"), "Got: {text}");
    }

    #[test]
    fn histograms_and_gauges() {
        let t = PrometheusTelemetry::new();
        metrics::block_process_latency(&t, Instant::now(), "sequential");
        metrics::set_epoch_new(&t, 7);
        let text = t.gather_text();
        assert!(text.contains("chaindex_process_block_milliseconds_count{type=\"sequential\"} 1"));
        assert!(text.contains("chaindex_epoch_new 7"));
    }
}
