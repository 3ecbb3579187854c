//! Client for the admin ops API
//!
//! Reads the configured metric thresholds and the dashboard overview
//! snapshot. One request per call, no retries.

use reqwest::header::ACCEPT;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

use crate::contracts::{Envelope, MetricsSnapshot, ThresholdSet};
use crate::error::{GuardError, Result};

/// Metric threshold settings path
pub const THRESHOLDS_PATH: &str = "/api/v1/admin/ops/settings/metric-thresholds";

/// Dashboard overview path
pub const OVERVIEW_PATH: &str = "/api/v1/admin/ops/dashboard/overview";

/// Per-request deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// The two ops reads the guard performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Thresholds,
    Overview,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Thresholds => THRESHOLDS_PATH,
            Endpoint::Overview => OVERVIEW_PATH,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::Thresholds => "thresholds",
            Endpoint::Overview => "overview",
        }
    }
}

/// Filters forwarded to the overview endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotQuery {
    pub platform: String,
    pub time_range: String,
    pub group_id: Option<String>,
}

impl SnapshotQuery {
    pub fn new(platform: impl Into<String>, time_range: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            time_range: time_range.into(),
            group_id: None,
        }
    }

    /// Set the stage/group filter; blank identifiers are dropped
    pub fn with_group_id(mut self, group_id: impl AsRef<str>) -> Self {
        let trimmed = group_id.as_ref().trim();
        self.group_id = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    fn to_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            ("platform", self.platform.as_str()),
            ("time_range", self.time_range.as_str()),
        ];
        if let Some(group_id) = &self.group_id {
            pairs.push(("group_id", group_id.as_str()));
        }
        pairs
    }
}

/// Admin ops API client
pub struct OpsClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl OpsClient {
    /// Create new client; trailing slashes on the base address are dropped
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = base_url.as_ref().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(GuardError::invalid_input("base URL must not be empty"));
        }
        reqwest::Url::parse(&base_url).map_err(|e| {
            GuardError::invalid_input(format!("invalid base URL {}: {}", base_url, e))
        })?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| GuardError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            token: None,
            client,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the bearer credential; blank tokens send no Authorization header
    pub fn with_token(mut self, token: impl AsRef<str>) -> Self {
        let trimmed = token.as_ref().trim();
        self.token = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the configured gate limits
    pub async fn fetch_thresholds(&self) -> Result<ThresholdSet> {
        let payload = self.get_payload(Endpoint::Thresholds, &[]).await?;
        Ok(ThresholdSet::from_payload(&payload))
    }

    /// Fetch the dashboard overview snapshot
    pub async fn fetch_snapshot(&self, query: &SnapshotQuery) -> Result<MetricsSnapshot> {
        let payload = self
            .get_payload(Endpoint::Overview, &query.to_pairs())
            .await?;
        Ok(MetricsSnapshot::from_payload(&payload))
    }

    async fn get_payload(
        &self,
        endpoint: Endpoint,
        query: &[(&'static str, &str)],
    ) -> Result<Map<String, Value>> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        debug!(endpoint = endpoint.as_str(), %url, "fetching ops data");

        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .timeout(self.timeout);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GuardError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        Envelope::decode(&body)?.into_payload()
    }
}
