//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::http::StatusCode;
use common::{backend_with, body_json, build_test_app, get};

#[tokio::test]
async fn health_check_reports_registry_reachable() {
    let backend = backend_with(&[]);
    let response = get(build_test_app(&backend), "/health", &[]).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["registry_healthy"], true);
}

#[tokio::test]
async fn health_check_is_degraded_when_registry_is_down() {
    let backend = backend_with(&[]);
    backend.set_registry_down(true);

    let response = get(build_test_app(&backend), "/health", &[]).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["registry_healthy"], false);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let backend = backend_with(&[]);
    let response = get(build_test_app(&backend), "/this-route-does-not-exist", &[]).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let backend = backend_with(&[]);
    let response = get(build_test_app(&backend), "/health", &[]).await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}
