//! Health Check API Tests

use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::common::{online, TestApp};

#[tokio::test]
async fn test_root_banner() {
    let app = TestApp::new().await;
    let response = app.server.get("/").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "Realtime gateway is running");
}

#[tokio::test]
async fn test_health_check_returns_json() {
    let app = TestApp::new().await;
    let response = app.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::new().await;
    let response = app.server.get("/health/live").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "alive");
}

#[tokio::test]
async fn test_readiness_reports_gateway_counts() {
    let app = TestApp::new().await;
    let _u1 = online(&app.state.gateway, "u1").await;
    let _u2 = online(&app.state.gateway, "u2").await;

    let response = app.server.get("/health/ready").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["environment"], "test");
    assert_eq!(body["websocket"]["active_connections"], 2);
    assert_eq!(body["websocket"]["online_users"], 2);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_prometheus_text() {
    let app = TestApp::new().await;
    app.server.get("/health").await.assert_status_ok();

    let response = app.server.get("/metrics").await;
    response.assert_status_ok();
    assert!(response.text().contains("chat_realtime_http_requests_total"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::new().await;
    let response = app.server.get("/api/v1/users").await;
    response.assert_status_not_found();
}
