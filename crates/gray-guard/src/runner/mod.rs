//! Guard runner
//!
//! Fetch thresholds, fetch the snapshot, evaluate, and map the outcome to
//! one of three terminal states. The runner never exits the process; the
//! binary turns [`GuardOutcome::exit_code`] into the process status.

mod output;

pub use output::Console;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::client::{Endpoint, OpsClient, SnapshotQuery, DEFAULT_TIMEOUT};
use crate::contracts::{
    DecisionScope, GuardDecision, GuardStatus, MetricsSnapshot, ThresholdSet, Violation,
};
use crate::engine::{evaluate, unjudged};
use crate::error::GuardError;
use crate::telemetry::GuardMetrics;

/// Default platform filter
pub const DEFAULT_PLATFORM: &str = "openai";

/// Default time window token
pub const DEFAULT_TIME_RANGE: &str = "30m";

/// Inputs for one guard run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardOptions {
    pub base_url: String,
    pub admin_token: Option<String>,
    pub platform: String,
    pub time_range: String,
    pub group_id: Option<String>,
    pub timeout: Duration,
}

impl Default for GuardOptions {
    /// Documented defaults with no base URL; running it fails as invalid input
    fn default() -> Self {
        Self::new("")
    }
}

impl GuardOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            admin_token: None,
            platform: DEFAULT_PLATFORM.to_string(),
            time_range: DEFAULT_TIME_RANGE.to_string(),
            group_id: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn with_time_range(mut self, time_range: impl Into<String>) -> Self {
        self.time_range = time_range.into();
        self
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn query(&self) -> SnapshotQuery {
        let query = SnapshotQuery::new(&self.platform, &self.time_range);
        match &self.group_id {
            Some(group_id) => query.with_group_id(group_id),
            None => query,
        }
    }

    fn scope(&self) -> DecisionScope {
        let query = self.query();
        DecisionScope {
            platform: query.platform,
            time_range: query.time_range,
            group_id: query.group_id,
        }
    }
}

/// Structured result of one guard run
#[derive(Debug, Clone)]
pub struct GuardOutcome {
    pub status: GuardStatus,
    /// Text destined for standard output
    pub stdout: String,
    /// Text destined for the error stream
    pub stderr: String,
    pub decision: GuardDecision,
}

impl GuardOutcome {
    pub fn exit_code(&self) -> i32 {
        self.status.code()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.decision.violations
    }

    /// Stdout followed by stderr, trimmed
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr).trim().to_string()
    }
}

/// Runs the gate against an ops API
#[derive(Default)]
pub struct GuardRunner {
    metrics: Option<Arc<GuardMetrics>>,
}

impl GuardRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(mut self, metrics: Arc<GuardMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Execute one guard run. Never fails: operational problems become
    /// [`GuardStatus::OperationalFailure`].
    pub async fn run(&self, options: &GuardOptions) -> GuardOutcome {
        let scope = options.scope();
        let mut console = Console::new();

        let decision = match self.fetch(options).await {
            Ok((thresholds, snapshot)) => {
                console.snapshot(&snapshot);
                console.thresholds(&thresholds);

                let skipped = unjudged(&snapshot, &thresholds);
                if !skipped.is_empty() {
                    let keys: Vec<&str> = skipped.iter().map(|m| m.key()).collect();
                    debug!(metrics = ?keys, "readings unknown, metrics not judged");
                }

                let violations = evaluate(&snapshot, &thresholds);
                if violations.is_empty() {
                    console.passed();
                } else {
                    console.violations(&violations);
                }
                GuardDecision::evaluated(&scope, thresholds, snapshot, violations)
            }
            Err(diagnostic) => {
                warn!(error = %diagnostic, "guard could not be evaluated");
                console.failure(&diagnostic);
                GuardDecision::failed(&scope, diagnostic)
            }
        };

        info!(run_id = %decision.run_id, "guard decision: {}", decision.summary());

        if let Some(metrics) = &self.metrics {
            metrics.record_verdict(decision.status);
            for violation in &decision.violations {
                metrics.record_violation(violation.metric);
            }
        }

        let (stdout, stderr) = console.into_parts();
        GuardOutcome {
            status: decision.status,
            stdout,
            stderr,
            decision,
        }
    }

    /// Thresholds first, then the snapshot; the first failure wins and
    /// the remaining fetch is not attempted.
    async fn fetch(
        &self,
        options: &GuardOptions,
    ) -> Result<(ThresholdSet, MetricsSnapshot), String> {
        let client = OpsClient::new(&options.base_url)
            .map_err(|e| e.to_string())?
            .with_timeout(options.timeout);
        let client = match &options.admin_token {
            Some(token) => client.with_token(token),
            None => client,
        };

        let thresholds = self
            .timed(Endpoint::Thresholds, client.fetch_thresholds())
            .await?;
        let snapshot = self
            .timed(Endpoint::Overview, client.fetch_snapshot(&options.query()))
            .await?;

        Ok((thresholds, snapshot))
    }

    async fn timed<T>(
        &self,
        endpoint: Endpoint,
        fetch: impl Future<Output = Result<T, GuardError>>,
    ) -> Result<T, String> {
        let start = Instant::now();
        let result = fetch.await;

        if let Some(metrics) = &self.metrics {
            metrics.observe_fetch(endpoint, start.elapsed().as_secs_f64());
            if let Err(e) = &result {
                metrics.record_fetch_failure(endpoint, e.kind());
            }
        }

        result.map_err(|e| format!("{} fetch failed: {}", endpoint.as_str(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let options = GuardOptions::new("http://127.0.0.1:5231");
        assert_eq!(options.platform, "openai");
        assert_eq!(options.time_range, "30m");
        assert_eq!(options.timeout, Duration::from_secs(15));
        assert!(options.group_id.is_none());
        assert!(options.admin_token.is_none());
        assert_eq!(GuardOptions::default(), GuardOptions::new(""));
    }

    #[test]
    fn test_blank_group_id_is_dropped_from_scope() {
        let options = GuardOptions::new("http://localhost").with_group_id("  ");
        assert!(options.scope().group_id.is_none());
    }

    #[tokio::test]
    async fn test_invalid_base_url_is_operational_failure() {
        let metrics = Arc::new(GuardMetrics::new().unwrap());
        let runner = GuardRunner::new().with_metrics(Arc::clone(&metrics));

        let outcome = runner.run(&GuardOptions::new("not a url")).await;

        assert_eq!(outcome.status, GuardStatus::OperationalFailure);
        assert_eq!(outcome.exit_code(), 1);
        assert!(outcome.stdout.is_empty());
        assert!(outcome.stderr.contains("invalid base URL"));
        assert_eq!(metrics.evaluations(GuardStatus::OperationalFailure), 1);
    }

    #[test]
    fn test_combined_output() {
        let outcome = GuardOutcome {
            status: GuardStatus::OperationalFailure,
            stdout: String::new(),
            stderr: "[Gray Guard] Execution failed: boom\n".to_string(),
            decision: GuardDecision::failed(&DecisionScope::default(), "boom"),
        };
        assert_eq!(outcome.combined_output(), "[Gray Guard] Execution failed: boom");
    }
}
