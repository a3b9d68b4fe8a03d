#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use hotelier_api::config::{LogFormat, ServerConfig};
use hotelier_api::router::build_app_router;
use hotelier_api::state::AppState;
use hotelier_reconcile::{Reconciler, ReconciliationScheduler, SchedulerConfig};
use hotelier_tenancy::memory::{self, MemoryBackend};
use hotelier_tenancy::{ConnectionManager, DirectoryConfig, TenantDirectory};
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        log_format: LogFormat::Text,
    }
}

/// A backend with one active hotel per subdomain.
pub fn backend_with(subdomains: &[&str]) -> MemoryBackend {
    let backend = MemoryBackend::new();
    for subdomain in subdomains {
        backend.add_tenant(memory::tenant(subdomain));
    }
    backend
}

/// Application state over the in-memory backend. The scheduler is built
/// but its tickers are not started.
pub fn test_state(backend: &MemoryBackend) -> AppState {
    let manager = Arc::new(ConnectionManager::new(Arc::new(backend.clone())));
    let directory = Arc::new(TenantDirectory::new(manager, DirectoryConfig::default()));
    let scheduler = ReconciliationScheduler::new(
        Reconciler::new(Arc::clone(&directory)),
        SchedulerConfig {
            enabled: false,
            ..SchedulerConfig::default()
        },
    );

    AppState {
        directory,
        scheduler,
        config: Arc::new(test_config()),
    }
}

/// Build the full application router, mirroring the production binary.
pub fn build_test_app(backend: &MemoryBackend) -> Router {
    build_app_router(test_state(backend))
}

/// Send a request with the given method, URI and headers.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
) -> Response<Body> {
    let mut request = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    app.oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: Router, uri: &str, headers: &[(&str, &str)]) -> Response<Body> {
    send(app, Method::GET, uri, headers).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, &[]).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
