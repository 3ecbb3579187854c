//! Telemetry for the gray guard
//!
//! Prometheus counters and histograms kept in a private registry so that a
//! drill can share one instance across many guard runs.

pub mod metrics;

pub use metrics::GuardMetrics;

use thiserror::Error;

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("Failed to encode metrics: {0}")]
    EncodingFailed(String),
}

/// Result type for telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;
