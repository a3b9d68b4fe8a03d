use axum::routing::{get, post};
use axum::Router;

use crate::handlers::ops;
use crate::state::AppState;

/// Operational routes, mounted at `/api/v1/ops`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/connections", get(ops::connection_stats))
        .route("/reconcile", post(ops::trigger_reconciliation))
        .route("/scheduler", get(ops::scheduler_status))
        .route("/tenants/{tenant}/invalidate", post(ops::invalidate_tenant))
}
