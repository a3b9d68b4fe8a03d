//! Operational endpoints: connection stats and reconciliation control.

use axum::extract::{Path, State};
use axum::Json;
use hotelier_reconcile::{PassReport, TaskStatus};
use hotelier_tenancy::ConnectionStats;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/ops/connections
pub async fn connection_stats(
    State(state): State<AppState>,
) -> Json<DataResponse<ConnectionStats>> {
    let stats = state.connections().stats().await;
    Json(DataResponse { data: stats })
}

/// Result of dropping a tenant's directory entry.
#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub tenant: String,
    /// Whether an entry was cached.
    pub evicted: bool,
}

/// POST /api/v1/ops/tenants/{tenant}/invalidate
///
/// Forces the next request for `tenant` to re-read its registry record,
/// e.g. after its policy was edited.
pub async fn invalidate_tenant(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> Json<DataResponse<InvalidateResponse>> {
    let evicted = state.directory.invalidate(&tenant).await;
    tracing::info!(tenant = %tenant, evicted, "Tenant directory entry invalidated");
    Json(DataResponse {
        data: InvalidateResponse { tenant, evicted },
    })
}

/// POST /api/v1/ops/reconcile
///
/// Runs the full recompute synchronously and returns its report. Responds
/// 409 when a full recompute is already running.
pub async fn trigger_reconciliation(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<PassReport>>> {
    let report = state.scheduler.trigger_manual_reconciliation().await?;
    Ok(Json(DataResponse { data: report }))
}

/// GET /api/v1/ops/scheduler
pub async fn scheduler_status(
    State(state): State<AppState>,
) -> Json<DataResponse<Vec<TaskStatus>>> {
    let status = state.scheduler.status().await;
    Json(DataResponse { data: status })
}
