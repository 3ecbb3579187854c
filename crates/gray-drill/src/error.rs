//! Error types for the drill harness
//!
//! These abort a drill. A guard run that misses its expected status is a
//! recorded result, not an error.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrillError {
    /// Stub ops host could not bind or report its address
    #[error("failed to start stub ops host: {0}")]
    Bind(#[source] std::io::Error),

    #[error("failed to read stage plan {}: {source}", .path.display())]
    PlanFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid stage plan: {0}")]
    PlanParse(String),

    #[error("failed to write report {}: {source}", .path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("metrics error: {0}")]
    Metrics(#[from] gray_guard::telemetry::TelemetryError),
}

impl From<serde_json::Error> for DrillError {
    fn from(err: serde_json::Error) -> Self {
        DrillError::PlanParse(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for DrillError {
    fn from(err: serde_yaml::Error) -> Self {
        DrillError::PlanParse(format!("YAML error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, DrillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DrillError::PlanParse("no ramp stages".to_string());
        assert_eq!(err.to_string(), "invalid stage plan: no ramp stages");

        let err = DrillError::ReportWrite {
            path: PathBuf::from("/nope/report.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().starts_with("failed to write report /nope/report.md"));
    }
}
