//! Gray Guard Contracts
//!
//! Typed view of the two ops reads the guard depends on: the configured
//! metric thresholds and the dashboard overview snapshot.

mod decision;
mod envelope;

pub use decision::*;
pub use envelope::*;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// A single numeric observation or limit.
///
/// `Unknown` covers a missing key, `null`, a non-numeric value and NaN.
/// It never takes part in a comparison. Infinities are observed values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Reading {
    Known(f64),
    #[default]
    Unknown,
}

impl Reading {
    /// Decode one payload field, accepting JSON numbers and numeric strings
    /// (including `"inf"` and `"Infinity"`)
    pub fn from_value(value: Option<&Value>) -> Self {
        let parsed = match value {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };

        Reading::from(parsed)
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Reading::Known(v) => Some(v),
            Reading::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, Reading::Known(_))
    }
}

impl From<f64> for Reading {
    fn from(v: f64) -> Self {
        Reading::from(Some(v))
    }
}

impl From<Option<f64>> for Reading {
    fn from(v: Option<f64>) -> Self {
        match v {
            Some(v) if !v.is_nan() => Reading::Known(v),
            _ => Reading::Unknown,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Known(v) => write!(f, "{}", v),
            Reading::Unknown => write!(f, "unknown"),
        }
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reading::Known(v) => serializer.serialize_f64(*v),
            Reading::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|value| Reading::from_value(Some(&value)))
    }
}

/// Direction in which a limit is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Breached when the observation is strictly below the limit
    Minimum,
    /// Breached when the observation is strictly above the limit
    Maximum,
}

impl Bound {
    pub fn is_breached(self, actual: f64, limit: f64) -> bool {
        match self {
            Bound::Minimum => actual < limit,
            Bound::Maximum => actual > limit,
        }
    }
}

/// Gated metrics, declared in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// SLA availability percentage
    Availability,
    /// P99 time to first token in milliseconds
    TtftP99,
    /// Request error rate percentage
    RequestErrorRate,
    /// Upstream error rate percentage
    UpstreamErrorRate,
}

impl Metric {
    /// Fixed evaluation order; violation lists follow it.
    pub const ALL: [Metric; 4] = [
        Metric::Availability,
        Metric::TtftP99,
        Metric::RequestErrorRate,
        Metric::UpstreamErrorRate,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Metric::Availability => "availability",
            Metric::TtftP99 => "ttft_p99",
            Metric::RequestErrorRate => "request_error_rate",
            Metric::UpstreamErrorRate => "upstream_error_rate",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Availability => "SLA",
            Metric::TtftP99 => "TTFT P99",
            Metric::RequestErrorRate => "Request error rate",
            Metric::UpstreamErrorRate => "Upstream error rate",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::TtftP99 => "ms",
            _ => "%",
        }
    }

    pub fn bound(self) -> Bound {
        match self {
            Metric::Availability => Bound::Minimum,
            _ => Bound::Maximum,
        }
    }
}

/// Configured gate limits, as served by the metric-thresholds endpoint
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThresholdSet {
    #[serde(rename = "sla_percent_min", default)]
    pub availability_min: Reading,

    #[serde(rename = "ttft_p99_ms_max", default)]
    pub ttft_p99_ms_max: Reading,

    #[serde(rename = "request_error_rate_percent_max", default)]
    pub request_error_rate_max: Reading,

    #[serde(rename = "upstream_error_rate_percent_max", default)]
    pub upstream_error_rate_max: Reading,
}

impl ThresholdSet {
    pub const KEY_AVAILABILITY_MIN: &'static str = "sla_percent_min";
    pub const KEY_TTFT_P99_MAX: &'static str = "ttft_p99_ms_max";
    pub const KEY_REQUEST_ERROR_RATE_MAX: &'static str = "request_error_rate_percent_max";
    pub const KEY_UPSTREAM_ERROR_RATE_MAX: &'static str = "upstream_error_rate_percent_max";

    /// Decode the `data` object of a thresholds envelope field by field
    pub fn from_payload(data: &Map<String, Value>) -> Self {
        Self {
            availability_min: Reading::from_value(data.get(Self::KEY_AVAILABILITY_MIN)),
            ttft_p99_ms_max: Reading::from_value(data.get(Self::KEY_TTFT_P99_MAX)),
            request_error_rate_max: Reading::from_value(data.get(Self::KEY_REQUEST_ERROR_RATE_MAX)),
            upstream_error_rate_max: Reading::from_value(
                data.get(Self::KEY_UPSTREAM_ERROR_RATE_MAX),
            ),
        }
    }

    pub fn limit(&self, metric: Metric) -> Reading {
        match metric {
            Metric::Availability => self.availability_min,
            Metric::TtftP99 => self.ttft_p99_ms_max,
            Metric::RequestErrorRate => self.request_error_rate_max,
            Metric::UpstreamErrorRate => self.upstream_error_rate_max,
        }
    }
}

/// Point-in-time health observations from the dashboard overview
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    #[serde(rename = "sla", default)]
    pub availability: Reading,

    #[serde(default)]
    pub ttft_p99_ms: Reading,

    #[serde(rename = "request_error_rate_percent", default)]
    pub request_error_rate: Reading,

    #[serde(rename = "upstream_error_rate_percent", default)]
    pub upstream_error_rate: Reading,
}

impl MetricsSnapshot {
    pub const KEY_AVAILABILITY: &'static str = "sla";
    pub const KEY_TTFT: &'static str = "ttft";
    pub const KEY_TTFT_P99: &'static str = "p99_ms";
    pub const KEY_REQUEST_ERROR_RATE: &'static str = "error_rate";
    pub const KEY_UPSTREAM_ERROR_RATE: &'static str = "upstream_error_rate";

    /// Decode the `data` object of an overview envelope field by field.
    ///
    /// The latency reading lives under a nested `ttft` object; when that
    /// key is not an object only the latency reading becomes unknown.
    pub fn from_payload(data: &Map<String, Value>) -> Self {
        let ttft_p99 = data
            .get(Self::KEY_TTFT)
            .and_then(Value::as_object)
            .and_then(|ttft| ttft.get(Self::KEY_TTFT_P99));

        Self {
            availability: Reading::from_value(data.get(Self::KEY_AVAILABILITY)),
            ttft_p99_ms: Reading::from_value(ttft_p99),
            request_error_rate: Reading::from_value(data.get(Self::KEY_REQUEST_ERROR_RATE)),
            upstream_error_rate: Reading::from_value(data.get(Self::KEY_UPSTREAM_ERROR_RATE)),
        }
    }

    pub fn reading(&self, metric: Metric) -> Reading {
        match metric {
            Metric::Availability => self.availability,
            Metric::TtftP99 => self.ttft_p99_ms,
            Metric::RequestErrorRate => self.request_error_rate,
            Metric::UpstreamErrorRate => self.upstream_error_rate,
        }
    }
}

/// One breached metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub metric: Metric,
    pub actual: f64,
    pub threshold: f64,
}

impl Violation {
    pub fn new(metric: Metric, actual: f64, threshold: f64) -> Self {
        Self {
            metric,
            actual,
            threshold,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.metric.bound() {
            Bound::Minimum => "below",
            Bound::Maximum => "above",
        };
        let unit = self.metric.unit();
        write!(
            f,
            "{} {} threshold: actual={:.2}{} threshold={:.2}{}",
            self.metric.label(),
            direction,
            self.actual,
            unit,
            self.threshold,
            unit
        )
    }
}
