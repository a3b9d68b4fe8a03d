use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the registry database is reachable.
    pub registry_healthy: bool,
}

/// GET /health -- returns service and registry health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry_healthy = match state.connections().main_connection().await {
        Ok(registry) => registry.ping().await.is_ok(),
        Err(_) => false,
    };

    let status = if registry_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        registry_healthy,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
