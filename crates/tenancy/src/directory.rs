//! Tenant directory: identifier -> (hotel record, connection handle).
//!
//! Lookups are served from a TTL cache. On a miss the directory queries the
//! registry, opens (or reuses) the tenant connection through the
//! [`ConnectionManager`], and caches the pair. Population is single-flight
//! per identifier; cached entries are read without waiting on any
//! population in progress.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use hotelier_core::config::{env_or, ConfigError};
use hotelier_core::tenant::normalize_tenant_id;
use hotelier_db::models::tenant::Tenant;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::connection::{ConnectionManager, TenantHandle};
use crate::error::TenancyError;

/// Default lifetime of a cache entry.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Directory settings.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryConfig {
    pub cache_ttl: Duration,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl DirectoryConfig {
    /// Reads `TENANT_CACHE_TTL_SECS` (default `300`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let secs = env_or("TENANT_CACHE_TTL_SECS", DEFAULT_CACHE_TTL.as_secs())?;
        Ok(Self {
            cache_ttl: Duration::from_secs(secs),
        })
    }
}

/// A resolved tenant: its registry record and its connection handle.
#[derive(Debug, Clone)]
pub struct ResolvedTenant {
    pub tenant: Arc<Tenant>,
    pub handle: Arc<TenantHandle>,
}

struct CacheEntry {
    resolved: ResolvedTenant,
    inserted_at: Instant,
}

/// Cached mapping from tenant identifiers to hotel metadata and connections.
pub struct TenantDirectory {
    manager: Arc<ConnectionManager>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Per-identifier population locks.
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TenantDirectory {
    pub fn new(manager: Arc<ConnectionManager>, config: DirectoryConfig) -> Self {
        Self {
            manager,
            ttl: config.cache_ttl,
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Resolve a tenant identifier.
    ///
    /// Returns [`TenancyError::NotFound`] when no active tenant matches (no
    /// connection is opened in that case) and [`TenancyError::Unavailable`]
    /// when the registry or the tenant database cannot be reached.
    pub async fn resolve(&self, tenant_id: &str) -> Result<ResolvedTenant, TenancyError> {
        let key = normalize_tenant_id(tenant_id)
            .ok_or_else(|| TenancyError::NotFound(tenant_id.to_string()))?;

        if let Some(hit) = self.lookup(&key).await {
            tracing::debug!(tenant = %key, "Tenant directory cache hit");
            return Ok(hit);
        }

        let gate = self.gate(&key).await;
        let result = {
            let _guard = gate.lock().await;
            // Another caller may have populated the entry while we waited.
            match self.lookup(&key).await {
                Some(hit) => Ok(hit),
                None => self.load(&key).await,
            }
        };
        self.release_gate(&key, &gate).await;

        result
    }

    /// All active tenants from the registry.
    pub async fn list_active_tenants(&self) -> Result<Vec<Tenant>, TenancyError> {
        let registry = self.manager.main_connection().await?;
        registry.list_active_tenants().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to list active tenants");
            TenancyError::Unavailable(format!("registry: {e}"))
        })
    }

    /// Drop the cached entry for `tenant_id`, forcing the next resolution to
    /// re-read the registry.
    pub async fn invalidate(&self, tenant_id: &str) -> bool {
        let Some(key) = normalize_tenant_id(tenant_id) else {
            return false;
        };
        self.entries.write().await.remove(&key).is_some()
    }

    /// Evict every expired entry. Returns how many were removed.
    ///
    /// Reconciliation passes call this, so entries of tenants that are no
    /// longer resolved do not outlive their TTL by much.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Expired tenant directory entries purged");
        }
        evicted
    }

    /// Number of cached entries, expired or not.
    pub async fn cached_len(&self) -> usize {
        self.entries.read().await.len()
    }

    // ---- private helpers ----

    /// A live cache entry for `key`. Expired entries and entries whose
    /// connection has been closed count as absent.
    async fn lookup(&self, key: &str) -> Option<ResolvedTenant> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        let fresh = entry.inserted_at.elapsed() < self.ttl;
        let live = !entry.resolved.handle.store().is_closed();
        (fresh && live).then(|| entry.resolved.clone())
    }

    async fn load(&self, key: &str) -> Result<ResolvedTenant, TenancyError> {
        let registry = self.manager.main_connection().await?;

        let found = registry
            .find_active_tenant(key)
            .await
            .map_err(|e| {
                tracing::error!(tenant = %key, error = %e, "Registry lookup failed");
                TenancyError::Unavailable(format!("registry: {e}"))
            })?
            .filter(Tenant::is_active);
        let Some(tenant) = found else {
            // Drop the stale entry of a tenant that is no longer active.
            if self.invalidate(key).await {
                tracing::info!(tenant = %key, "Inactive tenant evicted from directory");
            }
            return Err(TenancyError::NotFound(key.to_string()));
        };

        let handle = self.manager.tenant_connection(key).await?;

        let resolved = ResolvedTenant {
            tenant: Arc::new(tenant),
            handle,
        };
        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                resolved: resolved.clone(),
                inserted_at: Instant::now(),
            },
        );
        tracing::debug!(tenant = %key, "Tenant directory entry refreshed");

        Ok(resolved)
    }

    async fn gate(&self, key: &str) -> Arc<Mutex<()>> {
        let mut inflight = self.inflight.lock().await;
        Arc::clone(inflight.entry(key.to_string()).or_default())
    }

    /// Drop the population lock for `key` once no other caller holds it.
    async fn release_gate(&self, key: &str, gate: &Arc<Mutex<()>>) {
        let mut inflight = self.inflight.lock().await;
        let unused = inflight
            .get(key)
            .is_some_and(|g| Arc::ptr_eq(g, gate) && Arc::strong_count(gate) <= 2);
        if unused {
            inflight.remove(key);
        }
    }
}
