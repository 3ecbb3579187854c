//! Gray Drill CLI
//!
//! ```bash
//! gray-drill --report docs/perf/gray-drill-report.md
//! gray-drill --plan stages.yaml --metrics-out guard.prom --log-json
//! ```
//!
//! Exit status 0 when every ramp stage passes and the rollback stage
//! breaches, 1 otherwise (including Ctrl-C and harness errors).

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gray_drill::{
    render_markdown, write_report, DrillConfig, DrillError, DrillHarness, DrillReport,
    StagePlan, StageResult, DEFAULT_EXCERPT_LINES,
};
use gray_guard::runner::{DEFAULT_PLATFORM, DEFAULT_TIME_RANGE};
use gray_guard::GuardMetrics;

#[derive(Parser, Debug)]
#[command(name = "gray-drill")]
#[command(author, version, about = "Rehearse the gray-release guard against a stub ops host")]
struct DrillCli {
    /// Markdown report destination
    #[arg(long, default_value = "docs/perf/gray-drill-report.md")]
    report: PathBuf,

    /// Stage plan overriding the built-in one (.yaml/.yml, otherwise JSON)
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Guard output lines quoted for the rollback stage
    #[arg(long, default_value_t = DEFAULT_EXCERPT_LINES)]
    excerpt_lines: usize,

    /// Write guard metrics in Prometheus text format
    #[arg(long)]
    metrics_out: Option<PathBuf>,

    /// Emit JSON log lines
    #[arg(long)]
    log_json: bool,

    #[arg(long, default_value = DEFAULT_PLATFORM)]
    platform: String,

    #[arg(long, default_value = DEFAULT_TIME_RANGE)]
    time_range: String,

    /// Per-request guard timeout in seconds
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    let cli = DrillCli::parse();
    init_tracing(cli.log_json);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "drill failed:".red().bold(), e);
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: DrillCli) -> anyhow::Result<i32> {
    let plan = match &cli.plan {
        Some(path) => StagePlan::load(path)?,
        None => StagePlan::builtin(),
    };

    let metrics = Arc::new(GuardMetrics::new().map_err(DrillError::from)?);
    let harness = DrillHarness::new(plan)
        .with_config(DrillConfig {
            platform: cli.platform.clone(),
            time_range: cli.time_range.clone(),
            timeout: Duration::from_secs(cli.timeout_secs),
        })
        .with_metrics(Arc::clone(&metrics));
    info!(
        ramp_stages = harness.plan().ramp.len(),
        rollback = %harness.plan().rollback.id,
        "drill plan ready"
    );

    // Dropping the drill future drops the stub host, which stops it
    let report = tokio::select! {
        report = harness.run() => report?,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, remaining stages cancelled");
            eprintln!("{}", "drill interrupted, no report written".yellow());
            return Ok(1);
        }
    };

    print_summary(&report);

    let markdown = render_markdown(&report, cli.excerpt_lines);
    write_report(&cli.report, &markdown)?;
    println!("drill report generated: {}", cli.report.display());

    if let Some(path) = &cli.metrics_out {
        let text = metrics.encode_text().map_err(DrillError::from)?;
        std::fs::write(path, text)
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
        info!(path = %path.display(), "guard metrics written");
    }

    Ok(report.exit_code())
}

fn print_summary(report: &DrillReport) {
    println!("{}", "Gray drill results".cyan().bold());
    for stage in &report.ramp {
        print_stage(stage);
    }
    print_stage(&report.rollback);

    let verdict = if report.passed() {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    println!("Verdict: {}", verdict);
}

fn print_stage(stage: &StageResult) {
    let mark = if stage.passed { "ok".green() } else { "x".red() };
    println!(
        "  {} {:<10} {:>5}  exit={} expected={}",
        mark,
        stage.stage_id,
        stage.traffic_ratio.as_deref().unwrap_or("-"),
        stage.exit_code(),
        stage.expected.code()
    );
}
