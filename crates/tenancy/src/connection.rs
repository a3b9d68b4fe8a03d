//! Registry and per-tenant connection manager.
//!
//! [`ConnectionManager`] owns the single registry connection and a keyed
//! table of tenant connections. Each tenant's connection is opened on first
//! use and reused for the life of the process. Opening is single-flight per
//! tenant: concurrent callers for the same tenant wait on one open, while
//! different tenants open in parallel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use hotelier_core::tenant::{normalize_tenant_id, tenant_database_name};
use hotelier_core::types::Timestamp;
use serde::Serialize;
use tokio::sync::{OnceCell, RwLock};

use crate::error::TenancyError;
use crate::store::{Connector, Registry, TenantStore};

/// An open connection to one tenant database plus its model set.
pub struct TenantHandle {
    tenant_id: String,
    database: String,
    store: Arc<dyn TenantStore>,
    opened_at: Timestamp,
}

impl TenantHandle {
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Logical database name (`tenant_<id>`).
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn store(&self) -> &Arc<dyn TenantStore> {
        &self.store
    }

    pub fn opened_at(&self) -> Timestamp {
        self.opened_at
    }

    fn is_live(&self) -> bool {
        !self.store.is_closed()
    }
}

impl std::fmt::Debug for TenantHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantHandle")
            .field("tenant_id", &self.tenant_id)
            .field("database", &self.database)
            .field("opened_at", &self.opened_at)
            .finish()
    }
}

/// Snapshot of the connections currently held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStats {
    pub main_connected: bool,
    pub tenant_connections: usize,
    /// Identifiers of tenants with an open connection, sorted.
    pub tenants: Vec<String>,
}

/// A tenant's slot in the handle table. Empty until the first successful
/// open; a failed open leaves it empty so the next caller retries.
type Slot = Arc<OnceCell<Arc<TenantHandle>>>;

/// Owns every database connection the process holds.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    registry: OnceCell<Arc<dyn Registry>>,
    tenants: RwLock<HashMap<String, Slot>>,
    closed: AtomicBool,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            registry: OnceCell::new(),
            tenants: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// The registry connection, opened on first call.
    pub async fn main_connection(&self) -> Result<Arc<dyn Registry>, TenancyError> {
        self.ensure_open()?;

        let registry = self
            .registry
            .get_or_try_init(|| async {
                let registry = self.connector.connect_registry().await.map_err(|e| {
                    tracing::error!(error = %e, "Failed to open registry connection");
                    TenancyError::Unavailable(format!("registry: {e}"))
                })?;
                tracing::info!("Registry connection opened");
                Ok::<_, TenancyError>(registry)
            })
            .await?;

        Ok(Arc::clone(registry))
    }

    /// The connection for `tenant_id`, opened on first call.
    ///
    /// Returns the same handle for every call until the process shuts down,
    /// unless the underlying pool has been closed, in which case a new
    /// connection is opened.
    pub async fn tenant_connection(
        &self,
        tenant_id: &str,
    ) -> Result<Arc<TenantHandle>, TenancyError> {
        self.ensure_open()?;

        let tenant_id = normalize_tenant_id(tenant_id)
            .ok_or_else(|| TenancyError::NotFound(tenant_id.to_string()))?;

        let mut slot = self.slot(&tenant_id).await;
        if let Some(handle) = slot.get() {
            if handle.is_live() {
                return Ok(Arc::clone(handle));
            }
            tracing::warn!(tenant = %tenant_id, "Tenant connection closed, reopening");
            self.evict(&tenant_id, &slot).await;
            slot = self.slot(&tenant_id).await;
        }

        let handle = slot
            .get_or_try_init(|| self.open_tenant(&tenant_id))
            .await?;
        let handle = Arc::clone(handle);

        // close_all() may have drained the table while this open was in flight.
        if self.closed.load(Ordering::Acquire) {
            handle.store.close().await;
            return Err(shut_down());
        }

        Ok(handle)
    }

    /// Current connection counts.
    pub async fn stats(&self) -> ConnectionStats {
        let mut tenants: Vec<String> = self
            .tenants
            .read()
            .await
            .iter()
            .filter(|(_, slot)| slot.get().is_some_and(|h| h.is_live()))
            .map(|(id, _)| id.clone())
            .collect();
        tenants.sort();

        ConnectionStats {
            main_connected: self.registry.get().is_some_and(|r| !r.is_closed()),
            tenant_connections: tenants.len(),
            tenants,
        }
    }

    /// Close every tenant connection, then the registry connection.
    ///
    /// Afterwards every accessor fails with [`TenancyError::Unavailable`].
    pub async fn close_all(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let slots: Vec<(String, Slot)> = self.tenants.write().await.drain().collect();
        for (tenant_id, slot) in slots {
            if let Some(handle) = slot.get() {
                handle.store.close().await;
                tracing::info!(tenant = %tenant_id, "Tenant connection closed");
            }
        }

        if let Some(registry) = self.registry.get() {
            registry.close().await;
            tracing::info!("Registry connection closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // ---- private helpers ----

    fn ensure_open(&self) -> Result<(), TenancyError> {
        if self.is_closed() {
            Err(shut_down())
        } else {
            Ok(())
        }
    }

    /// Get or insert the slot for `tenant_id`.
    async fn slot(&self, tenant_id: &str) -> Slot {
        if let Some(slot) = self.tenants.read().await.get(tenant_id) {
            return Arc::clone(slot);
        }

        let mut tenants = self.tenants.write().await;
        Arc::clone(tenants.entry(tenant_id.to_string()).or_default())
    }

    /// Remove `slot` from the table unless it has already been replaced.
    async fn evict(&self, tenant_id: &str, slot: &Slot) {
        let mut tenants = self.tenants.write().await;
        if tenants.get(tenant_id).is_some_and(|s| Arc::ptr_eq(s, slot)) {
            tenants.remove(tenant_id);
        }
    }

    async fn open_tenant(&self, tenant_id: &str) -> Result<Arc<TenantHandle>, TenancyError> {
        let database = tenant_database_name(tenant_id);

        let store = self
            .connector
            .connect_tenant(&database)
            .await
            .map_err(|e| {
                tracing::error!(
                    tenant = %tenant_id,
                    database = %database,
                    error = %e,
                    "Failed to open tenant connection",
                );
                TenancyError::Unavailable(format!("{database}: {e}"))
            })?;

        tracing::info!(tenant = %tenant_id, database = %database, "Tenant connection opened");

        Ok(Arc::new(TenantHandle {
            tenant_id: tenant_id.to_string(),
            database,
            store,
            opened_at: Utc::now(),
        }))
    }
}

fn shut_down() -> TenancyError {
    TenancyError::Unavailable("connection manager is shut down".to_string())
}
