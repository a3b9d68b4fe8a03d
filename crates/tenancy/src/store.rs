//! Storage seams between tenancy/reconciliation logic and the databases.
//!
//! Handles are trait objects so the connection manager can hold sqlx pools
//! in production and in-memory stores in tests behind the same type.

use std::sync::Arc;

use async_trait::async_trait;
use hotelier_core::bill::Bill;
use hotelier_core::error::CoreError;
use hotelier_core::types::{DbId, Money, Timestamp};
use hotelier_db::models::room::Room;
use hotelier_db::models::stay::Stay;
use hotelier_db::models::tenant::Tenant;

/// Errors raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be mapped to its domain type.
    #[error(transparent)]
    InvalidRecord(#[from] CoreError),
}

/// Read-only access to the central tenant registry.
#[async_trait]
pub trait Registry: Send + Sync {
    /// The active tenant with this subdomain, if any.
    async fn find_active_tenant(&self, subdomain: &str) -> Result<Option<Tenant>, StoreError>;

    /// All active tenants.
    async fn list_active_tenants(&self) -> Result<Vec<Tenant>, StoreError>;

    /// Round-trip to the registry database.
    async fn ping(&self) -> Result<(), StoreError>;

    fn is_closed(&self) -> bool;

    async fn close(&self);
}

impl std::fmt::Debug for dyn Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}

/// The typed model set of one tenant database.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Stays whose guest is currently checked in.
    async fn list_checked_in_stays(&self) -> Result<Vec<Stay>, StoreError>;

    /// Checked-in stays whose expected check-out is before `now`.
    async fn list_overdue_stays(&self, now: Timestamp) -> Result<Vec<Stay>, StoreError>;

    async fn find_room(&self, room_id: DbId) -> Result<Option<Room>, StoreError>;

    /// The open bill of a stay, with its items.
    async fn find_open_bill(&self, stay_id: DbId) -> Result<Option<Bill>, StoreError>;

    /// Persist the bill's system charges, replacing the stored ones, and
    /// return the new stored total.
    async fn save_system_charges(&self, bill: &Bill) -> Result<Money, StoreError>;

    fn is_closed(&self) -> bool;

    async fn close(&self);
}

/// Opens connections to the registry and to tenant databases.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect_registry(&self) -> Result<Arc<dyn Registry>, StoreError>;

    /// Open the logical database `database` and bind the tenant models to it.
    async fn connect_tenant(&self, database: &str) -> Result<Arc<dyn TenantStore>, StoreError>;
}
