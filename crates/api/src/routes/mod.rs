pub mod health;
pub mod hotel;
pub mod ops;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /hotel                 hotel addressed by the request host (GET)
///
/// /ops/connections       open database connections (GET)
/// /ops/reconcile         run a full recompute now (POST)
/// /ops/scheduler         reconciliation task states (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(hotel::router())
        .nest("/ops", ops::router())
}
