use std::sync::Arc;

use hotelier_reconcile::ReconciliationScheduler;
use hotelier_tenancy::{ConnectionManager, TenantDirectory};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Tenant identifier -> hotel record and connection.
    pub directory: Arc<TenantDirectory>,
    pub scheduler: Arc<ReconciliationScheduler>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn connections(&self) -> &Arc<ConnectionManager> {
        self.directory.manager()
    }
}
