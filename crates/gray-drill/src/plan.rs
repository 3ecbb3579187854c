//! Drill stage plan
//!
//! The canned data the stub ops host serves: one threshold set, a list of
//! ramp stages that must pass, and one rollback stage that must breach.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{DrillError, Result};

/// Limits served by the stub thresholds endpoint, in wire key names
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdLimits {
    pub sla_percent_min: Option<f64>,
    pub ttft_p99_ms_max: Option<f64>,
    pub request_error_rate_percent_max: Option<f64>,
    pub upstream_error_rate_percent_max: Option<f64>,
}

impl Default for ThresholdLimits {
    fn default() -> Self {
        Self {
            sla_percent_min: Some(99.5),
            ttft_p99_ms_max: Some(900.0),
            request_error_rate_percent_max: Some(2.0),
            upstream_error_rate_percent_max: Some(2.0),
        }
    }
}

/// Observations served for one stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageSnapshot {
    pub sla: f64,
    pub ttft_p99_ms: f64,
    pub error_rate: f64,
    pub upstream_error_rate: f64,
}

impl StageSnapshot {
    pub const fn new(
        sla: f64,
        ttft_p99_ms: f64,
        error_rate: f64,
        upstream_error_rate: f64,
    ) -> Self {
        Self {
            sla,
            ttft_p99_ms,
            error_rate,
            upstream_error_rate,
        }
    }

    /// Overview `data` object in the ops API shape
    pub fn to_payload(&self) -> Value {
        json!({
            "sla": self.sla,
            "error_rate": self.error_rate,
            "upstream_error_rate": self.upstream_error_rate,
            "ttft": {"p99_ms": self.ttft_p99_ms},
        })
    }
}

/// A traffic ramp step expected to pass the guard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RampStage {
    pub id: String,
    /// Traffic share label, e.g. "5%"
    pub traffic_ratio: String,
    pub snapshot: StageSnapshot,
}

/// Injected fault expected to breach every threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackStage {
    #[serde(default = "default_rollback_id")]
    pub id: String,
    pub snapshot: StageSnapshot,
}

fn default_rollback_id() -> String {
    "rollback".to_string()
}

/// Full drill plan; read-only once the drill starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagePlan {
    #[serde(default)]
    pub thresholds: ThresholdLimits,
    pub ramp: Vec<RampStage>,
    pub rollback: RollbackStage,
}

impl Default for StagePlan {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StagePlan {
    /// The standard A/B/C/D ramp plus rollback fault injection
    pub fn builtin() -> Self {
        let ramp = [
            ("A", "5%", StageSnapshot::new(99.78, 780.0, 1.20, 1.05)),
            ("B", "20%", StageSnapshot::new(99.82, 730.0, 1.05, 0.92)),
            ("C", "50%", StageSnapshot::new(99.86, 680.0, 0.88, 0.80)),
            ("D", "100%", StageSnapshot::new(99.89, 640.0, 0.72, 0.67)),
        ]
        .into_iter()
        .map(|(id, ratio, snapshot)| RampStage {
            id: id.to_string(),
            traffic_ratio: ratio.to_string(),
            snapshot,
        })
        .collect();

        Self {
            thresholds: ThresholdLimits::default(),
            ramp,
            rollback: RollbackStage {
                id: default_rollback_id(),
                snapshot: StageSnapshot::new(97.10, 1550.0, 6.30, 5.60),
            },
        }
    }

    /// Load a plan from YAML (`.yaml`/`.yml`) or JSON and validate it
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DrillError::PlanFile {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let plan: StagePlan = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        plan.validate()?;
        Ok(plan)
    }

    /// At least one ramp stage, unique stage ids, no blank or padded ids.
    ///
    /// The guard trims the group id it sends, so a padded id would never
    /// select its own stage on the stub host.
    pub fn validate(&self) -> Result<()> {
        if self.ramp.is_empty() {
            return Err(DrillError::PlanParse("plan has no ramp stages".to_string()));
        }

        let mut seen = HashSet::new();
        let ids = self
            .ramp
            .iter()
            .map(|s| s.id.as_str())
            .chain(std::iter::once(self.rollback.id.as_str()));
        for id in ids {
            if id.trim().is_empty() {
                return Err(DrillError::PlanParse("stage id must not be blank".to_string()));
            }
            if id != id.trim() {
                return Err(DrillError::PlanParse(format!(
                    "stage id must not have surrounding whitespace: {:?}",
                    id
                )));
            }
            if !seen.insert(id) {
                return Err(DrillError::PlanParse(format!("duplicate stage id: {}", id)));
            }
        }

        Ok(())
    }

    /// Snapshot for a `group_id` filter; unknown or missing ids fall back
    /// to the first ramp stage
    pub fn snapshot_for(&self, group_id: Option<&str>) -> Option<&StageSnapshot> {
        let requested = group_id.and_then(|id| {
            if id == self.rollback.id {
                Some(&self.rollback.snapshot)
            } else {
                self.ramp.iter().find(|s| s.id == id).map(|s| &s.snapshot)
            }
        });

        requested.or_else(|| self.ramp.first().map(|s| &s.snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_plan() {
        let plan = StagePlan::builtin();
        assert!(plan.validate().is_ok());

        let ids: Vec<&str> = plan.ramp.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C", "D"]);
        let ratios: Vec<&str> = plan.ramp.iter().map(|s| s.traffic_ratio.as_str()).collect();
        assert_eq!(ratios, vec!["5%", "20%", "50%", "100%"]);
        assert_eq!(plan.rollback.id, "rollback");
        assert_eq!(plan.thresholds.sla_percent_min, Some(99.5));
    }

    #[test]
    fn test_snapshot_lookup_with_fallback() {
        let plan = StagePlan::builtin();

        assert_eq!(plan.snapshot_for(Some("C")).unwrap().ttft_p99_ms, 680.0);
        assert_eq!(plan.snapshot_for(Some("rollback")).unwrap().sla, 97.10);
        assert_eq!(plan.snapshot_for(Some("Z")).unwrap().sla, 99.78);
        assert_eq!(plan.snapshot_for(None).unwrap().sla, 99.78);
    }

    #[test]
    fn test_snapshot_payload_shape() {
        let payload = StageSnapshot::new(99.78, 780.0, 1.20, 1.05).to_payload();
        assert_eq!(payload["sla"], 99.78);
        assert_eq!(payload["ttft"]["p99_ms"], 780.0);
        assert_eq!(payload["error_rate"], 1.20);
    }

    #[test]
    fn test_validation_rejects_bad_plans() {
        let mut plan = StagePlan::builtin();
        plan.ramp.clear();
        assert!(plan.validate().is_err());

        let mut plan = StagePlan::builtin();
        plan.rollback.id = "A".to_string();
        assert!(plan.validate().unwrap_err().to_string().contains("duplicate stage id: A"));

        let mut plan = StagePlan::builtin();
        plan.ramp[1].id = " ".to_string();
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_padded_ids() {
        let mut plan = StagePlan::builtin();
        plan.ramp[1].id = " B".to_string();
        plan.ramp[1].snapshot = StageSnapshot::new(90.0, 5000.0, 50.0, 50.0);
        let err = plan.validate().unwrap_err().to_string();
        assert!(err.contains("surrounding whitespace"), "{}", err);

        let mut plan = StagePlan::builtin();
        plan.rollback.id = "rollback\t".to_string();
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_load_yaml_plan() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            r#"
ramp:
  - id: canary
    traffic_ratio: "1%"
    snapshot: {{sla: 99.9, ttft_p99_ms: 500, error_rate: 0.1, upstream_error_rate: 0.1}}
rollback:
  snapshot: {{sla: 90.0, ttft_p99_ms: 5000, error_rate: 10, upstream_error_rate: 10}}
"#
        )
        .unwrap();

        let plan = StagePlan::load(file.path()).unwrap();
        assert_eq!(plan.ramp.len(), 1);
        assert_eq!(plan.ramp[0].id, "canary");
        assert_eq!(plan.rollback.id, "rollback");
        assert_eq!(plan.thresholds, ThresholdLimits::default());
    }

    #[test]
    fn test_load_json_plan_is_validated() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let mut plan = StagePlan::builtin();
        plan.ramp.clear();
        write!(file, "{}", serde_json::to_string(&plan).unwrap()).unwrap();

        assert!(matches!(
            StagePlan::load(file.path()),
            Err(DrillError::PlanParse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            StagePlan::load("/definitely/not/here.yaml"),
            Err(DrillError::PlanFile { .. })
        ));
    }
}
