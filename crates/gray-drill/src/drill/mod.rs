//! Drill orchestration
//!
//! Runs the guard once per ramp stage (expecting pass) and once for the
//! rollback stage (expecting a threshold breach), strictly in order.
//!
//! ```text
//! NotStarted -> RunningStage(i) -> Evaluating(i) -> RunningStage(i+1) ...
//!            -> RollbackCheck -> Done
//! ```
//!
//! Every stage outcome is recorded verbatim; a stage missing its
//! expectation never aborts the drill.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use gray_guard::client::DEFAULT_TIMEOUT;
use gray_guard::runner::{DEFAULT_PLATFORM, DEFAULT_TIME_RANGE};
use gray_guard::{GuardMetrics, GuardOptions, GuardRunner, GuardStatus};

use crate::error::Result;
use crate::plan::StagePlan;
use crate::stub::StubHost;

/// Drill execution phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "phase", content = "stage")]
pub enum DrillPhase {
    NotStarted,
    RunningStage(usize),
    Evaluating(usize),
    RollbackCheck,
    Done,
}

/// Outcome of one drill stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageResult {
    pub stage_id: String,
    /// Traffic share label; `None` for the rollback stage
    pub traffic_ratio: Option<String>,
    pub status: GuardStatus,
    pub expected: GuardStatus,
    /// Whether `status` matched `expected`
    pub passed: bool,
    /// Guard stdout then stderr, trimmed
    pub output: String,
}

impl StageResult {
    fn new(
        stage_id: &str,
        traffic_ratio: Option<&str>,
        expected: GuardStatus,
        status: GuardStatus,
        output: String,
    ) -> Self {
        Self {
            stage_id: stage_id.to_string(),
            traffic_ratio: traffic_ratio.map(str::to_string),
            status,
            expected,
            passed: status == expected,
            output,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.status.code()
    }
}

/// Result of one complete drill
#[derive(Debug, Clone, Serialize)]
pub struct DrillReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub ramp: Vec<StageResult>,
    pub rollback: StageResult,
    /// Phase transitions in the order they happened
    pub phases: Vec<DrillPhase>,
}

impl DrillReport {
    pub fn ramp_passed(&self) -> bool {
        self.ramp.iter().all(|s| s.passed)
    }

    /// The rollback stage produced a threshold breach
    pub fn rollback_triggered(&self) -> bool {
        self.rollback.status == GuardStatus::ThresholdBreach
    }

    /// Overall verdict: every ramp stage passed and rollback was triggered
    pub fn passed(&self) -> bool {
        self.ramp_passed() && self.rollback_triggered()
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}

/// Guard settings shared by every stage
#[derive(Debug, Clone)]
pub struct DrillConfig {
    pub platform: String,
    pub time_range: String,
    pub timeout: Duration,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            platform: DEFAULT_PLATFORM.to_string(),
            time_range: DEFAULT_TIME_RANGE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Drives the guard through the stage plan
pub struct DrillHarness {
    plan: Arc<StagePlan>,
    config: DrillConfig,
    runner: GuardRunner,
}

impl DrillHarness {
    pub fn new(plan: StagePlan) -> Self {
        Self {
            plan: Arc::new(plan),
            config: DrillConfig::default(),
            runner: GuardRunner::new(),
        }
    }

    pub fn with_config(mut self, config: DrillConfig) -> Self {
        self.config = config;
        self
    }

    /// Record guard metrics for every stage run into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<GuardMetrics>) -> Self {
        self.runner = GuardRunner::new().with_metrics(metrics);
        self
    }

    pub fn plan(&self) -> &StagePlan {
        &self.plan
    }

    /// Start the stub host, run every stage against it, tear it down
    pub async fn run(&self) -> Result<DrillReport> {
        let host = StubHost::start(Arc::clone(&self.plan)).await?;
        let report = self.run_against(&host.base_url()).await;
        host.shutdown().await;
        Ok(report)
    }

    /// Run every stage against an already-running ops API
    pub async fn run_against(&self, base_url: &str) -> DrillReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut phases = vec![DrillPhase::NotStarted];

        info!(%run_id, %base_url, stages = self.plan.ramp.len(), "starting gray drill");

        let mut ramp = Vec::with_capacity(self.plan.ramp.len());
        for (index, stage) in self.plan.ramp.iter().enumerate() {
            advance(&mut phases, DrillPhase::RunningStage(index));
            let outcome = self.runner.run(&self.options(base_url, &stage.id)).await;

            advance(&mut phases, DrillPhase::Evaluating(index));
            let result = StageResult::new(
                &stage.id,
                Some(stage.traffic_ratio.as_str()),
                GuardStatus::Pass,
                outcome.status,
                outcome.combined_output(),
            );
            log_stage(&result);
            ramp.push(result);
        }

        advance(&mut phases, DrillPhase::RollbackCheck);
        let rollback_id = &self.plan.rollback.id;
        let outcome = self.runner.run(&self.options(base_url, rollback_id)).await;
        let rollback = StageResult::new(
            rollback_id,
            None,
            GuardStatus::ThresholdBreach,
            outcome.status,
            outcome.combined_output(),
        );
        log_stage(&rollback);

        advance(&mut phases, DrillPhase::Done);
        let report = DrillReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            ramp,
            rollback,
            phases,
        };

        info!(
            %run_id,
            ramp_passed = report.ramp_passed(),
            rollback_triggered = report.rollback_triggered(),
            passed = report.passed(),
            "gray drill finished"
        );
        report
    }

    fn options(&self, base_url: &str, stage_id: &str) -> GuardOptions {
        GuardOptions::new(base_url)
            .with_platform(&self.config.platform)
            .with_time_range(&self.config.time_range)
            .with_group_id(stage_id)
            .with_timeout(self.config.timeout)
    }
}

fn advance(phases: &mut Vec<DrillPhase>, next: DrillPhase) {
    debug!(?next, "drill phase");
    phases.push(next);
}

fn log_stage(result: &StageResult) {
    if result.passed {
        info!(
            stage = %result.stage_id,
            exit_code = result.exit_code(),
            "stage met expectation"
        );
    } else {
        warn!(
            stage = %result.stage_id,
            exit_code = result.exit_code(),
            expected = result.expected.code(),
            "stage missed expectation"
        );
    }
}
