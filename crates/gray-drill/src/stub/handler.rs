//! HTTP handlers for the stub ops API
//!
//! Implements exactly the two reads the guard performs.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

use gray_guard::client::{OVERVIEW_PATH, THRESHOLDS_PATH};

use crate::plan::StagePlan;

/// Create the router
pub fn create_router(plan: Arc<StagePlan>) -> Router {
    Router::new()
        .route(THRESHOLDS_PATH, get(metric_thresholds))
        .route(OVERVIEW_PATH, get(dashboard_overview))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(plan)
}

/// Ops API envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i64,
    pub message: String,
    pub data: Value,
}

impl Envelope {
    fn success(data: Value) -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data,
        }
    }
}

/// Overview filters; only `group_id` selects data
#[derive(Debug, Default, Deserialize)]
pub struct OverviewQuery {
    pub platform: Option<String>,
    pub time_range: Option<String>,
    pub group_id: Option<String>,
}

async fn metric_thresholds(State(plan): State<Arc<StagePlan>>) -> Json<Envelope> {
    Json(Envelope::success(
        serde_json::to_value(plan.thresholds).unwrap_or(Value::Null),
    ))
}

async fn dashboard_overview(
    State(plan): State<Arc<StagePlan>>,
    Query(query): Query<OverviewQuery>,
) -> Json<Envelope> {
    debug!(
        platform = query.platform.as_deref().unwrap_or("-"),
        time_range = query.time_range.as_deref().unwrap_or("-"),
        group_id = query.group_id.as_deref().unwrap_or("-"),
        "stub overview request"
    );

    match plan.snapshot_for(query.group_id.as_deref()) {
        Some(snapshot) => Json(Envelope::success(snapshot.to_payload())),
        None => Json(Envelope {
            code: 404,
            message: "no stage data".to_string(),
            data: Value::Null,
        }),
    }
}

async fn not_found() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}
