//! Threshold evaluation
//!
//! Pure comparison of a snapshot against the configured limits. A metric
//! is only judged when both its limit and its observation are known, so
//! missing telemetry fails open.

use crate::contracts::{Metric, MetricsSnapshot, ThresholdSet, Violation};

/// Compare `snapshot` against `thresholds` in [`Metric::ALL`] order.
///
/// Equality with a limit is never a breach. Returns an empty list on pass.
pub fn evaluate(snapshot: &MetricsSnapshot, thresholds: &ThresholdSet) -> Vec<Violation> {
    Metric::ALL
        .iter()
        .filter_map(|&metric| {
            let actual = snapshot.reading(metric).value()?;
            let limit = thresholds.limit(metric).value()?;
            metric
                .bound()
                .is_breached(actual, limit)
                .then(|| Violation::new(metric, actual, limit))
        })
        .collect()
}

/// Metrics skipped by [`evaluate`] because a limit or observation is unknown
pub fn unjudged(snapshot: &MetricsSnapshot, thresholds: &ThresholdSet) -> Vec<Metric> {
    Metric::ALL
        .into_iter()
        .filter(|&metric| {
            !(snapshot.reading(metric).is_known() && thresholds.limit(metric).is_known())
        })
        .collect()
}
