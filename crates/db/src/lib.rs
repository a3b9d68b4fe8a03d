//! Database access for the registry and per-tenant databases.
//!
//! The registry database holds one [`models::tenant::Tenant`] row per hotel.
//! Every hotel's rooms, stays and bills live in their own logical database
//! (`tenant_<subdomain>`), which shares the schema in `migrations/tenant`.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Pool sizing applied to every connection the platform opens.
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Open a pool for explicit connect options.
///
/// Establishes one connection eagerly so an unreachable server or a missing
/// database is reported here rather than on first query.
pub async fn connect_with(
    options: PgConnectOptions,
    settings: PoolSettings,
) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect_with(options)
        .await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the registry schema.
pub async fn run_registry_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations/registry").run(pool).await
}

/// Apply the tenant schema to one tenant database.
pub async fn run_tenant_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations/tenant").run(pool).await
}
