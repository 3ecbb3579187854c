//! Guard decision record
//!
//! The tri-state gate result plus enough context to audit it later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{Metric, MetricsSnapshot, ThresholdSet, Violation};

/// Terminal state of one guard run; the discriminant is the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum GuardStatus {
    /// All observed metrics are within their limits
    Pass = 0,
    /// The gate could not be evaluated
    OperationalFailure = 1,
    /// Evaluation completed and at least one metric breached its limit
    ThresholdBreach = 2,
}

impl GuardStatus {
    pub fn from_violations(violations: &[Violation]) -> Self {
        if violations.is_empty() {
            GuardStatus::Pass
        } else {
            GuardStatus::ThresholdBreach
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GuardStatus::Pass => "pass",
            GuardStatus::OperationalFailure => "operational_failure",
            GuardStatus::ThresholdBreach => "threshold_breach",
        }
    }
}

impl From<GuardStatus> for i32 {
    fn from(status: GuardStatus) -> Self {
        status.code()
    }
}

impl std::fmt::Display for GuardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit record for a single guard run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardDecision {
    /// Unique run identifier
    pub run_id: Uuid,

    /// Decision timestamp
    pub decided_at: DateTime<Utc>,

    pub status: GuardStatus,

    pub exit_code: i32,

    pub platform: String,

    pub time_range: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<ThresholdSet>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<MetricsSnapshot>,

    #[serde(default)]
    pub violations: Vec<Violation>,

    /// SHA-256 over the evaluated readings; absent when nothing was evaluated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs_hash: Option<String>,

    /// Diagnostic for operational failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GuardDecision {
    /// Record a completed evaluation
    pub fn evaluated(
        scope: &DecisionScope,
        thresholds: ThresholdSet,
        snapshot: MetricsSnapshot,
        violations: Vec<Violation>,
    ) -> Self {
        let status = GuardStatus::from_violations(&violations);
        Self {
            run_id: Uuid::new_v4(),
            decided_at: Utc::now(),
            status,
            exit_code: status.code(),
            platform: scope.platform.clone(),
            time_range: scope.time_range.clone(),
            group_id: scope.group_id.clone(),
            inputs_hash: Some(compute_inputs_hash(&thresholds, &snapshot)),
            thresholds: Some(thresholds),
            snapshot: Some(snapshot),
            violations,
            error: None,
        }
    }

    /// Record a run that could not be evaluated
    pub fn failed(scope: &DecisionScope, error: impl Into<String>) -> Self {
        let status = GuardStatus::OperationalFailure;
        Self {
            run_id: Uuid::new_v4(),
            decided_at: Utc::now(),
            status,
            exit_code: status.code(),
            platform: scope.platform.clone(),
            time_range: scope.time_range.clone(),
            group_id: scope.group_id.clone(),
            thresholds: None,
            snapshot: None,
            violations: Vec::new(),
            inputs_hash: None,
            error: Some(error.into()),
        }
    }

    /// One-line description used in logs
    pub fn summary(&self) -> String {
        format!(
            "{} - platform={}, time_range={}, group={}, violations={}",
            self.status,
            self.platform,
            self.time_range,
            self.group_id.as_deref().unwrap_or("-"),
            self.violations.len()
        )
    }
}

/// Query filters a decision was taken under
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionScope {
    pub platform: String,
    pub time_range: String,
    pub group_id: Option<String>,
}

/// Deterministic hash of the evaluated readings
pub fn compute_inputs_hash(thresholds: &ThresholdSet, snapshot: &MetricsSnapshot) -> String {
    let mut hasher = Sha256::new();
    for metric in Metric::ALL {
        hasher.update(metric.key().as_bytes());
        hasher.update(b"|limit=");
        hasher.update(thresholds.limit(metric).to_string().as_bytes());
        hasher.update(b"|actual=");
        hasher.update(snapshot.reading(metric).to_string().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
