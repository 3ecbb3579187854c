//! CLI module for the gray guard
//!
//! # Exit Codes
//!
//! - 0: Metrics passed
//! - 1: Request failed or invalid arguments
//! - 2: Threshold breached (halt the ramp and roll back)

use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::contracts::GuardStatus;
use crate::runner::{GuardOptions, GuardOutcome, GuardRunner, DEFAULT_PLATFORM, DEFAULT_TIME_RANGE};

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Operator-readable console text
    #[default]
    Text,
    /// Single JSON decision document
    Json,
}

/// Gray-release metric guard
///
/// Compares the live ops dashboard overview against the configured metric
/// thresholds and reports pass (0), operational failure (1) or threshold
/// breach (2) through the exit status.
#[derive(Parser, Debug)]
#[command(name = "gray-guard")]
#[command(
    about = "Gray-release metric guard - gate a traffic ramp on live ops metrics",
    long_about = None
)]
#[command(version)]
pub struct GuardCli {
    /// Service address, for example http://127.0.0.1:5231
    #[arg(long, env = "GRAY_GUARD_BASE_URL")]
    pub base_url: String,

    /// Admin bearer token (optional, depends on deployment)
    #[arg(long, env = "GRAY_GUARD_ADMIN_TOKEN", default_value = "", hide_env_values = true)]
    pub admin_token: String,

    /// Platform filter
    #[arg(long, env = "GRAY_GUARD_PLATFORM", default_value = DEFAULT_PLATFORM)]
    pub platform: String,

    /// Time window: 5m/30m/1h/6h/24h/7d/30d
    #[arg(long, env = "GRAY_GUARD_TIME_RANGE", default_value = DEFAULT_TIME_RANGE)]
    pub time_range: String,

    /// Optional group (rollout stage) identifier
    #[arg(long, env = "GRAY_GUARD_GROUP_ID", default_value = "")]
    pub group_id: String,

    /// Per-request timeout in seconds
    #[arg(
        long,
        env = "GRAY_GUARD_TIMEOUT_SECS",
        default_value_t = 15,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl GuardCli {
    pub fn to_options(&self) -> GuardOptions {
        GuardOptions::new(&self.base_url)
            .with_admin_token(&self.admin_token)
            .with_platform(&self.platform)
            .with_time_range(&self.time_range)
            .with_group_id(&self.group_id)
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// Run the guard and print its output; returns the terminal status
pub async fn run(cli: GuardCli) -> GuardStatus {
    let outcome = GuardRunner::new().run(&cli.to_options()).await;
    print_outcome(&outcome, cli.format);
    outcome.status
}

/// Exit status for an argument parsing failure.
///
/// `--help` and `--version` are not failures; any usage error is an
/// operational failure so it can never read as a threshold breach.
pub fn parse_failure_status(err: &clap::Error) -> GuardStatus {
    if err.use_stderr() {
        GuardStatus::OperationalFailure
    } else {
        GuardStatus::Pass
    }
}

/// Standard output for `format`: the console text, or one JSON decision
/// document
pub fn render_stdout(outcome: &GuardOutcome, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(outcome.stdout.clone()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&outcome.decision).map(|json| json + "\n")
        }
    }
}

fn print_outcome(outcome: &GuardOutcome, format: OutputFormat) {
    match render_stdout(outcome, format) {
        Ok(text) => print!("{}", text),
        Err(e) => eprintln!("[Gray Guard] Failed to render decision: {}", e),
    }
    eprint!("{}", outcome.stderr);
}
