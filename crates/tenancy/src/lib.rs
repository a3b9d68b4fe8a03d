//! Tenant resolution and per-tenant connection lifecycle.
//!
//! - [`ConnectionManager`] owns the registry connection and one lazily
//!   opened connection per tenant database.
//! - [`TenantDirectory`] maps a tenant identifier to its registry record and
//!   connection handle, caching the result for a short TTL.
//! - [`store`] defines the storage seams; [`postgres`] implements them on
//!   sqlx and [`memory`] (feature `test-util`) in memory.

pub mod connection;
pub mod directory;
pub mod error;
pub mod postgres;
pub mod store;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use connection::{ConnectionManager, ConnectionStats, TenantHandle};
pub use directory::{DirectoryConfig, ResolvedTenant, TenantDirectory};
pub use error::TenancyError;
pub use postgres::{ConnectorConfig, PgConnector};
pub use store::{Connector, Registry, StoreError, TenantStore};
