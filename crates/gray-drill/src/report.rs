//! Markdown rendering of a drill report

use std::fmt::Write as _;
use std::path::Path;

use crate::drill::DrillReport;
use crate::error::{DrillError, Result};

/// Guard output lines quoted for the rollback stage
pub const DEFAULT_EXCERPT_LINES: usize = 8;

/// Render `report` as a Markdown audit document
pub fn render_markdown(report: &DrillReport, excerpt_lines: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Gray Release Guard Drill Report");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "> Type: local stub drill (verifies the metric guard and the rollback trigger)"
    );
    let _ = writeln!(
        out,
        "> Generated by: `gray-drill` at {}, run `{}`",
        report.finished_at.to_rfc3339(),
        report.run_id
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## 1. Ramp stages");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Stage | Traffic ratio | Guard exit code | Result |");
    let _ = writeln!(out, "|---|---:|---:|---|");
    for stage in &report.ramp {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            stage.stage_id,
            stage.traffic_ratio.as_deref().unwrap_or("-"),
            stage.exit_code(),
            pass_fail(stage.passed)
        );
    }
    let _ = writeln!(out);

    let rollback = &report.rollback;
    let _ = writeln!(out, "## 2. Rollback trigger");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Stage: `{}`", rollback.stage_id);
    let _ = writeln!(out, "- Injected fault exit code: `{}`", rollback.exit_code());
    let _ = writeln!(
        out,
        "- Rollback condition triggered: `{}`",
        if report.rollback_triggered() { "yes" } else { "no" }
    );
    let _ = writeln!(out, "- Guard output excerpt:");
    let _ = writeln!(out, "```text");
    for line in rollback.output.lines().take(excerpt_lines) {
        let _ = writeln!(out, "{}", line);
    }
    let _ = writeln!(out, "```");
    let _ = writeln!(out);

    let _ = writeln!(out, "## 3. Verdict");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Ramp stages: `{}`", pass_fail(report.ramp_passed()));
    let _ = writeln!(
        out,
        "- Rollback trigger: `{}`",
        pass_fail(report.rollback_triggered())
    );
    let _ = writeln!(
        out,
        "- Conclusion: `{}`",
        if report.passed() {
            "PASS (ready for a production gray release)"
        } else {
            "FAIL (fix and re-run the drill)"
        }
    );

    out
}

/// Write the rendered report, creating parent directories
pub fn write_report(path: &Path, content: &str) -> Result<()> {
    let to_err = |source| DrillError::ReportWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(to_err)?;
    }
    std::fs::write(path, content).map_err(to_err)
}

fn pass_fail(ok: bool) -> &'static str {
    if ok {
        "pass"
    } else {
        "fail"
    }
}
