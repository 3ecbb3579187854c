//! Integration tests for the gray guard
//!
//! Drives the runner against wiremock ops endpoints and checks the exit
//! status contract:
//! - pass / breach / operational failure mapping
//! - fetch ordering and short-circuit on the first failure
//! - filter and credential forwarding

use gray_guard::client::{OVERVIEW_PATH, THRESHOLDS_PATH};
use gray_guard::{GuardMetrics, GuardOptions, GuardRunner, GuardStatus, Metric};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn envelope(data: Value) -> Value {
    json!({"code": 0, "message": "success", "data": data})
}

fn standard_thresholds() -> Value {
    envelope(json!({
        "sla_percent_min": 99.5,
        "ttft_p99_ms_max": 900,
        "request_error_rate_percent_max": 2.0,
        "upstream_error_rate_percent_max": 2.0
    }))
}

fn overview(sla: f64, ttft: f64, err: f64, upstream: f64) -> Value {
    envelope(json!({
        "sla": sla,
        "error_rate": err,
        "upstream_error_rate": upstream,
        "ttft": {"p99_ms": ttft}
    }))
}

async fn mount_thresholds(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path(THRESHOLDS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_overview(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path(OVERVIEW_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_healthy_snapshot_passes() {
    let server = MockServer::start().await;
    mount_thresholds(&server, standard_thresholds()).await;
    mount_overview(&server, overview(99.78, 780.0, 1.20, 1.05)).await;

    let outcome = GuardRunner::new()
        .run(&GuardOptions::new(server.uri()).with_group_id("A"))
        .await;

    assert_eq!(outcome.status, GuardStatus::Pass);
    assert_eq!(outcome.exit_code(), 0);
    assert!(outcome.violations().is_empty());
    assert!(outcome.stdout.contains("Current snapshot"));
    assert!(outcome.stdout.contains("Threshold configuration"));
    assert!(outcome.stdout.contains("Metrics passed"));
    assert!(outcome.stderr.is_empty());
    assert!(outcome.decision.inputs_hash.is_some());
}

#[tokio::test]
async fn test_rollback_snapshot_breaches_all_metrics() {
    let server = MockServer::start().await;
    mount_thresholds(&server, standard_thresholds()).await;
    mount_overview(&server, overview(97.10, 1550.0, 6.30, 5.60)).await;

    let metrics = Arc::new(GuardMetrics::new().unwrap());
    let outcome = GuardRunner::new()
        .with_metrics(Arc::clone(&metrics))
        .run(&GuardOptions::new(server.uri()).with_group_id("rollback"))
        .await;

    assert_eq!(outcome.status, GuardStatus::ThresholdBreach);
    assert_eq!(outcome.exit_code(), 2);

    let order: Vec<Metric> = outcome.violations().iter().map(|v| v.metric).collect();
    assert_eq!(order, Metric::ALL.to_vec());

    assert!(outcome.stdout.contains("  1. SLA below threshold: actual=97.10% threshold=99.50%"));
    assert!(outcome
        .stdout
        .contains("  2. TTFT P99 above threshold: actual=1550.00ms threshold=900.00ms"));
    assert!(outcome
        .stdout
        .contains("  4. Upstream error rate above threshold: actual=5.60% threshold=2.00%"));
    assert!(outcome.stdout.contains("roll back"));

    assert_eq!(metrics.evaluations(GuardStatus::ThresholdBreach), 1);
    assert!(metrics.encode_text().unwrap().contains("metric=\"availability\""));
}

#[tokio::test]
async fn test_threshold_api_error_skips_snapshot_fetch() {
    let server = MockServer::start().await;
    mount_thresholds(
        &server,
        json!({"code": 500, "message": "settings unavailable", "data": null}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(OVERVIEW_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(overview(99.9, 500.0, 0.1, 0.1)))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = GuardRunner::new()
        .run(&GuardOptions::new(server.uri()))
        .await;

    assert_eq!(outcome.status, GuardStatus::OperationalFailure);
    assert_eq!(outcome.exit_code(), 1);
    assert!(outcome.stdout.is_empty());
    assert!(outcome.stderr.contains("thresholds fetch failed"));
    assert!(outcome.stderr.contains("code=500 message=settings unavailable"));
}

#[tokio::test]
async fn test_http_error_is_operational_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(THRESHOLDS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let outcome = GuardRunner::new()
        .run(&GuardOptions::new(server.uri()))
        .await;

    assert_eq!(outcome.status, GuardStatus::OperationalFailure);
    assert!(outcome.stderr.contains("HTTP 401: unauthorized"));
}

#[tokio::test]
async fn test_snapshot_with_non_object_data_is_operational_failure() {
    let server = MockServer::start().await;
    mount_thresholds(&server, standard_thresholds()).await;
    mount_overview(&server, json!({"code": 0, "message": "success", "data": "n/a"})).await;

    let outcome = GuardRunner::new()
        .run(&GuardOptions::new(server.uri()))
        .await;

    assert_eq!(outcome.status, GuardStatus::OperationalFailure);
    assert!(outcome.stderr.contains("overview fetch failed: invalid response data"));
}

#[tokio::test]
async fn test_malformed_json_is_operational_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(THRESHOLDS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let outcome = GuardRunner::new()
        .run(&GuardOptions::new(server.uri()))
        .await;

    assert_eq!(outcome.status, GuardStatus::OperationalFailure);
    assert!(outcome.stderr.contains("malformed JSON"));
}

#[tokio::test]
async fn test_timeout_is_operational_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(THRESHOLDS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(standard_thresholds())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let metrics = Arc::new(GuardMetrics::new().unwrap());
    let outcome = GuardRunner::new()
        .with_metrics(Arc::clone(&metrics))
        .run(&GuardOptions::new(server.uri()).with_timeout(Duration::from_millis(200)))
        .await;

    assert_eq!(outcome.status, GuardStatus::OperationalFailure);
    assert!(metrics
        .encode_text()
        .unwrap()
        .contains("kind=\"timeout\""));
}

#[tokio::test]
async fn test_unreachable_host_is_operational_failure() {
    // Bind then drop to get a port with nothing listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let outcome = GuardRunner::new()
        .run(&GuardOptions::new(format!("http://{}", addr)).with_timeout(Duration::from_secs(2)))
        .await;

    assert_eq!(outcome.status, GuardStatus::OperationalFailure);
    assert!(outcome.stderr.contains("thresholds fetch failed"));
}

#[tokio::test]
async fn test_missing_telemetry_fails_open() {
    let server = MockServer::start().await;
    mount_thresholds(&server, standard_thresholds()).await;
    mount_overview(
        &server,
        envelope(json!({"sla": null, "error_rate": "n/a", "ttft": {}})),
    )
    .await;

    let outcome = GuardRunner::new()
        .run(&GuardOptions::new(server.uri()))
        .await;

    assert_eq!(outcome.status, GuardStatus::Pass);
    assert!(outcome.stdout.contains("\"sla\": null"));
}

#[tokio::test]
async fn test_infinite_latency_string_breaches() {
    let server = MockServer::start().await;
    mount_thresholds(&server, standard_thresholds()).await;
    mount_overview(
        &server,
        envelope(json!({
            "sla": 99.9,
            "error_rate": 0.5,
            "upstream_error_rate": 0.5,
            "ttft": {"p99_ms": "inf"}
        })),
    )
    .await;

    let outcome = GuardRunner::new()
        .run(&GuardOptions::new(server.uri()))
        .await;

    assert_eq!(outcome.status, GuardStatus::ThresholdBreach);
    assert_eq!(outcome.violations().len(), 1);
    assert_eq!(outcome.violations()[0].metric, Metric::TtftP99);
    assert!(outcome.stdout.contains("TTFT P99 above threshold: actual=infms"));
}

#[tokio::test]
async fn test_filters_and_credentials_are_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(THRESHOLDS_PATH))
        .and(header("authorization", "Bearer admin-jwt"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(standard_thresholds()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(OVERVIEW_PATH))
        .and(query_param("platform", "openai"))
        .and(query_param("time_range", "1h"))
        .and(query_param("group_id", "C"))
        .and(header("authorization", "Bearer admin-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(overview(99.86, 680.0, 0.88, 0.80)))
        .expect(1)
        .mount(&server)
        .await;

    let options = GuardOptions::new(format!("{}/", server.uri()))
        .with_admin_token(" admin-jwt ")
        .with_time_range("1h")
        .with_group_id("C");
    let outcome = GuardRunner::new().run(&options).await;

    assert_eq!(outcome.status, GuardStatus::Pass);
}

#[tokio::test]
async fn test_blank_group_id_is_not_forwarded() {
    let server = MockServer::start().await;
    mount_thresholds(&server, standard_thresholds()).await;
    mount_overview(&server, overview(99.9, 500.0, 0.1, 0.1)).await;

    let outcome = GuardRunner::new()
        .run(&GuardOptions::new(server.uri()).with_group_id(""))
        .await;
    assert_eq!(outcome.status, GuardStatus::Pass);

    let requests = server.received_requests().await.unwrap();
    let overview_request = requests
        .iter()
        .find(|r| r.url.path() == OVERVIEW_PATH)
        .unwrap();
    assert!(!overview_request.url.query_pairs().any(|(k, _)| k == "group_id"));

    // Thresholds are always read before the snapshot
    assert_eq!(requests[0].url.path(), THRESHOLDS_PATH);
}
