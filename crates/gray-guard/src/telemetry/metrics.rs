//! Prometheus metrics for the gray guard
//!
//! - `gray_guard_evaluations_total` (counter) - Guard runs by verdict
//! - `gray_guard_fetch_duration_seconds` (histogram) - Ops read latency by endpoint
//! - `gray_guard_fetch_failures_total` (counter) - Failed ops reads by endpoint and error kind
//! - `gray_guard_violations_total` (counter) - Breached metrics
//!
//! # Example
//!
//! ```rust
//! use gray_guard::contracts::GuardStatus;
//! use gray_guard::telemetry::GuardMetrics;
//!
//! let metrics = GuardMetrics::new().unwrap();
//! metrics.record_verdict(GuardStatus::Pass);
//! assert_eq!(metrics.evaluations(GuardStatus::Pass), 1);
//! ```

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

use super::{Result, TelemetryError};
use crate::client::Endpoint;
use crate::contracts::{GuardStatus, Metric};

const NAMESPACE: &str = "gray_guard";

/// Guard metrics backed by a private registry
pub struct GuardMetrics {
    registry: Registry,

    /// Guard runs by verdict
    evaluations_total: IntCounterVec,

    /// Ops read duration in seconds (by endpoint)
    fetch_duration_seconds: HistogramVec,

    /// Failed ops reads (by endpoint, kind)
    fetch_failures_total: IntCounterVec,

    /// Breached metrics (by metric)
    violations_total: IntCounterVec,
}

impl GuardMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let evaluations_total = IntCounterVec::new(
            Opts::new("evaluations_total", "Total number of guard runs by verdict")
                .namespace(NAMESPACE),
            &["verdict"],
        )?;

        let fetch_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "fetch_duration_seconds",
                "Ops API read duration in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0]),
            &["endpoint"],
        )?;

        let fetch_failures_total = IntCounterVec::new(
            Opts::new("fetch_failures_total", "Total number of failed ops API reads")
                .namespace(NAMESPACE),
            &["endpoint", "kind"],
        )?;

        let violations_total = IntCounterVec::new(
            Opts::new("violations_total", "Total number of threshold violations")
                .namespace(NAMESPACE),
            &["metric"],
        )?;

        registry.register(Box::new(evaluations_total.clone()))?;
        registry.register(Box::new(fetch_duration_seconds.clone()))?;
        registry.register(Box::new(fetch_failures_total.clone()))?;
        registry.register(Box::new(violations_total.clone()))?;

        Ok(Self {
            registry,
            evaluations_total,
            fetch_duration_seconds,
            fetch_failures_total,
            violations_total,
        })
    }

    /// Record the terminal state of a guard run
    pub fn record_verdict(&self, status: GuardStatus) {
        self.evaluations_total
            .with_label_values(&[status.as_str()])
            .inc();
    }

    /// Observe ops read duration
    pub fn observe_fetch(&self, endpoint: Endpoint, duration_secs: f64) {
        self.fetch_duration_seconds
            .with_label_values(&[endpoint.as_str()])
            .observe(duration_secs);
    }

    pub fn record_fetch_failure(&self, endpoint: Endpoint, kind: &str) {
        self.fetch_failures_total
            .with_label_values(&[endpoint.as_str(), kind])
            .inc();
    }

    pub fn record_violation(&self, metric: Metric) {
        self.violations_total.with_label_values(&[metric.key()]).inc();
    }

    /// Runs recorded with `status` so far
    pub fn evaluations(&self, status: GuardStatus) -> u64 {
        self.evaluations_total
            .with_label_values(&[status.as_str()])
            .get()
    }

    pub fn gather(&self) -> Vec<prometheus::proto::MetricFamily> {
        self.registry.gather()
    }

    /// Render the Prometheus text exposition format
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::EncodingFailed(e.to_string()))
    }
}
