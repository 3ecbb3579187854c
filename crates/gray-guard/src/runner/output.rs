//! Console text for a guard run
//!
//! Built into strings rather than printed so an in-process caller (the
//! drill) can capture it verbatim.

use serde::Serialize;
use std::fmt::Write;

use crate::contracts::{MetricsSnapshot, ThresholdSet, Violation};

const PREFIX: &str = "[Gray Guard]";

/// Captured stdout/stderr text of one run
#[derive(Debug, Default, Clone)]
pub struct Console {
    stdout: String,
    stderr: String,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&mut self, snapshot: &MetricsSnapshot) {
        self.line(format!("{} Current snapshot:", PREFIX));
        self.line(pretty(snapshot));
    }

    pub fn thresholds(&mut self, thresholds: &ThresholdSet) {
        self.line(format!("{} Threshold configuration:", PREFIX));
        self.line(pretty(thresholds));
    }

    pub fn violations(&mut self, violations: &[Violation]) {
        self.line(format!("{} Threshold violations detected:", PREFIX));
        for (index, violation) in violations.iter().enumerate() {
            self.line(format!("  {}. {}", index + 1, violation));
        }
        self.line(format!(
            "{} Recommendation: halt the traffic ramp and roll back.",
            PREFIX
        ));
    }

    pub fn passed(&mut self) {
        self.line(format!(
            "{} Metrics passed; keep observing or continue the ramp as planned.",
            PREFIX
        ));
    }

    pub fn failure(&mut self, diagnostic: &str) {
        let _ = writeln!(self.stderr, "{} Execution failed: {}", PREFIX, diagnostic);
    }

    pub fn into_parts(self) -> (String, String) {
        (self.stdout, self.stderr)
    }

    fn line(&mut self, text: String) {
        self.stdout.push_str(&text);
        self.stdout.push('\n');
    }
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("<unrenderable: {}>", e))
}
