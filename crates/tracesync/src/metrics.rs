//! Verification metrics using metrics-rs.
//!
//! The library records through the `metrics` facade; the binary installs a
//! [`CliRecorder`] when `--metrics` is given and prints the summary on exit.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit, counter,
    describe_counter, describe_gauge, describe_histogram, gauge, histogram,
};
use parking_lot::RwLock;

use crate::reconcile::ReconcileStats;

/// Per-binary verification status for metrics recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryStatus {
    Pass,
    Fail,
    Skip,
    Error,
}

// ============================================================================
// Metric descriptions
// ============================================================================

/// Register metric descriptions. Call once at startup.
pub fn init() {
    describe_counter!(
        "tracesync_binaries_passed_total",
        Unit::Count,
        "Binaries verified without mismatches"
    );
    describe_counter!(
        "tracesync_binaries_failed_total",
        Unit::Count,
        "Binaries with at least one mismatch"
    );
    describe_counter!(
        "tracesync_binaries_skipped_total",
        Unit::Count,
        "Golden traces without a DUT counterpart"
    );
    describe_counter!(
        "tracesync_binaries_errored_total",
        Unit::Count,
        "Binaries whose inputs could not be read"
    );
    describe_counter!("tracesync_mismatches_total", Unit::Count, "Total mismatches");
    describe_counter!(
        "tracesync_speculative_fetches_total",
        Unit::Count,
        "DUT fetches classified as speculative"
    );
    describe_counter!(
        "tracesync_synthesized_commits_total",
        Unit::Count,
        "Register commits synthesized for same-value rewrites"
    );
    describe_counter!(
        "tracesync_reordered_commits_total",
        Unit::Count,
        "Register commits swapped by the superscalar reorderer"
    );
    describe_counter!(
        "tracesync_unknown_instructions_total",
        Unit::Count,
        "Fetched words outside RV32I, treated as speculative"
    );

    describe_gauge!(
        "tracesync_batch_workers",
        Unit::Count,
        "Worker threads used by batch verification"
    );

    describe_histogram!(
        "tracesync_verify_duration_seconds",
        Unit::Seconds,
        "Per-binary reconciliation and comparison time"
    );
}

// ============================================================================
// Metric recording functions
// ============================================================================

/// Record the verdict of one binary.
pub fn record_binary(status: BinaryStatus) {
    match status {
        BinaryStatus::Pass => counter!("tracesync_binaries_passed_total").increment(1),
        BinaryStatus::Fail => counter!("tracesync_binaries_failed_total").increment(1),
        BinaryStatus::Skip => counter!("tracesync_binaries_skipped_total").increment(1),
        BinaryStatus::Error => counter!("tracesync_binaries_errored_total").increment(1),
    }
}

/// Record reconciliation and comparison results for one binary.
pub fn record_verification(stats: &ReconcileStats, mismatches: usize, elapsed: Duration) {
    counter!("tracesync_mismatches_total").increment(mismatches as u64);
    counter!("tracesync_speculative_fetches_total").increment(stats.speculative_fetches as u64);
    counter!("tracesync_synthesized_commits_total").increment(stats.synthesized_commits as u64);
    counter!("tracesync_reordered_commits_total").increment(stats.reordered_commits as u64);
    counter!("tracesync_unknown_instructions_total").increment(stats.unknown_instructions as u64);
    histogram!("tracesync_verify_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record the batch worker count.
#[allow(clippy::cast_precision_loss)]
pub fn record_workers(workers: usize) {
    gauge!("tracesync_batch_workers").set(workers as f64);
}

// ============================================================================
// CLI Recorder for terminal output
// ============================================================================

#[derive(Default)]
struct CounterStorage {
    values: RwLock<HashMap<String, u64>>,
}

#[derive(Default)]
struct GaugeStorage {
    values: RwLock<HashMap<String, f64>>,
}

#[derive(Default)]
struct HistogramStorage {
    values: RwLock<HashMap<String, Vec<f64>>>,
}

struct CliCounter {
    key: String,
    storage: Arc<CounterStorage>,
}

impl metrics::CounterFn for CliCounter {
    fn increment(&self, value: u64) {
        let mut values = self.storage.values.write();
        *values.entry(self.key.clone()).or_insert(0) += value;
    }

    fn absolute(&self, value: u64) {
        let mut values = self.storage.values.write();
        values.insert(self.key.clone(), value);
    }
}

struct CliGauge {
    key: String,
    storage: Arc<GaugeStorage>,
}

impl metrics::GaugeFn for CliGauge {
    fn increment(&self, value: f64) {
        let mut values = self.storage.values.write();
        *values.entry(self.key.clone()).or_insert(0.0) += value;
    }

    fn decrement(&self, value: f64) {
        let mut values = self.storage.values.write();
        *values.entry(self.key.clone()).or_insert(0.0) -= value;
    }

    fn set(&self, value: f64) {
        let mut values = self.storage.values.write();
        values.insert(self.key.clone(), value);
    }
}

struct CliHistogram {
    key: String,
    storage: Arc<HistogramStorage>,
}

impl metrics::HistogramFn for CliHistogram {
    fn record(&self, value: f64) {
        let mut values = self.storage.values.write();
        values.entry(self.key.clone()).or_default().push(value);
    }
}

/// Recorder that keeps metrics in memory for a summary at exit.
pub struct CliRecorder {
    counters: Arc<CounterStorage>,
    gauges: Arc<GaugeStorage>,
    histograms: Arc<HistogramStorage>,
}

impl CliRecorder {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(CounterStorage::default()),
            gauges: Arc::new(GaugeStorage::default()),
            histograms: Arc::new(HistogramStorage::default()),
        }
    }

    /// Install as the global metrics recorder.
    ///
    /// Returns `None` if a recorder is already installed.
    pub fn install(self) -> Option<CliRecorderHandle> {
        let counters = Arc::clone(&self.counters);
        let gauges = Arc::clone(&self.gauges);
        let histograms = Arc::clone(&self.histograms);

        metrics::set_global_recorder(self).ok()?;

        Some(CliRecorderHandle {
            counters,
            gauges,
            histograms,
        })
    }
}

impl Default for CliRecorder {
    fn default() -> Self {
        Self::new()
    }
}

fn key_to_string(key: &Key) -> String {
    let name = key.name();
    let labels = key.labels();
    if labels.len() == 0 {
        name.to_string()
    } else {
        let label_str: Vec<String> = labels
            .map(|l| format!("{}={}", l.key(), l.value()))
            .collect();
        format!("{}{{{}}}", name, label_str.join(","))
    }
}

impl Recorder for CliRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(Arc::new(CliCounter {
            key: key_to_string(key),
            storage: Arc::clone(&self.counters),
        }))
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::from_arc(Arc::new(CliGauge {
            key: key_to_string(key),
            storage: Arc::clone(&self.gauges),
        }))
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(Arc::new(CliHistogram {
            key: key_to_string(key),
            storage: Arc::clone(&self.histograms),
        }))
    }
}

/// Read access to metrics collected by an installed [`CliRecorder`].
pub struct CliRecorderHandle {
    counters: Arc<CounterStorage>,
    gauges: Arc<GaugeStorage>,
    histograms: Arc<HistogramStorage>,
}

impl CliRecorderHandle {
    pub fn get_counter(&self, key: &str) -> Option<u64> {
        self.counters.values.read().get(key).copied()
    }

    pub fn get_gauge(&self, key: &str) -> Option<f64> {
        self.gauges.values.read().get(key).copied()
    }

    /// Render all collected metrics, sorted by key.
    #[allow(clippy::cast_precision_loss)]
    pub fn render_summary(&self) -> String {
        let counters = self.counters.values.read();
        let gauges = self.gauges.values.read();
        let histograms = self.histograms.values.read();

        if counters.is_empty() && gauges.is_empty() && histograms.is_empty() {
            return "No metrics collected.\n".to_string();
        }

        let mut lines = vec![String::new(), "## Metrics Summary".to_string(), String::new()];

        if !counters.is_empty() {
            lines.push("### Counters".to_string());
            let mut entries: Vec<_> = counters.iter().collect();
            entries.sort();
            for (key, value) in entries {
                lines.push(format!("  {key}: {value}"));
            }
            lines.push(String::new());
        }

        if !gauges.is_empty() {
            lines.push("### Gauges".to_string());
            let mut keys: Vec<_> = gauges.keys().collect();
            keys.sort();
            for key in keys {
                lines.push(format!("  {key}: {:.6}", gauges[key]));
            }
            lines.push(String::new());
        }

        if !histograms.is_empty() {
            lines.push("### Histograms".to_string());
            let mut keys: Vec<_> = histograms.keys().collect();
            keys.sort();
            for key in keys {
                let values = &histograms[key];
                if values.is_empty() {
                    continue;
                }
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let avg = values.iter().sum::<f64>() / values.len() as f64;
                lines.push(format!(
                    "  {key}: count={}, min={min:.6}, max={max:.6}, avg={avg:.6}",
                    values.len()
                ));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }

    /// Print all collected metrics to stdout.
    pub fn print_summary(&self) {
        println!("{}", self.render_summary());
    }
}
