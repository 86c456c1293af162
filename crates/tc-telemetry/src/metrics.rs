//! Prometheus metrics for the title registry.
//!
//! All metrics follow the naming convention: `tc_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: registry calls by operation and outcome, commit rejections
//! - **Histogram**: call latency per operation

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Registry calls by operation and outcome
    pub static ref OPERATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("tc_registry_operations_total", "Registry operations by outcome"),
        &["operation", "outcome"]  // outcome: ok or an error kind
    ).expect("metric creation failed");

    /// Commits refused because a read went stale
    pub static ref COMMIT_REJECTIONS: Counter = Counter::new(
        "tc_ledger_commit_rejections_total",
        "Commits refused by optimistic concurrency control"
    ).expect("metric creation failed");

    /// Call latency
    pub static ref OPERATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "tc_registry_operation_duration_seconds",
            "Time spent in a registry operation"
        ).buckets(exponential_buckets(0.0001, 2.0, 14).expect("bucket layout is valid")),
        &["operation"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry. Registering twice is a
/// no-op.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(OPERATIONS_TOTAL.clone()),
        Box::new(COMMIT_REJECTIONS.clone()),
        Box::new(OPERATION_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Record one finished registry call.
///
/// `outcome` is `"ok"` or the error kind label.
pub fn record_operation(operation: &str, outcome: &str, seconds: f64) {
    OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
    OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(seconds);
    if outcome == "commit_rejected" {
        COMMIT_REJECTIONS.inc();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard that records an operation when dropped.
pub struct OperationTimer {
    operation: String,
    outcome: &'static str,
    start: std::time::Instant,
}

impl OperationTimer {
    /// Start timing `operation`. The outcome defaults to `"ok"`.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            outcome: "ok",
            start: std::time::Instant::now(),
        }
    }

    /// Mark the call as failed with `outcome`.
    pub fn fail(&mut self, outcome: &'static str) {
        self.outcome = outcome;
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        record_operation(
            &self.operation,
            self.outcome,
            self.start.elapsed().as_secs_f64(),
        );
    }
}
