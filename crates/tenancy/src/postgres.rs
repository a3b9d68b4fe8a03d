//! sqlx/Postgres implementation of the storage seams.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hotelier_core::bill::Bill;
use hotelier_core::config::{env_or, require_env, ConfigError};
use hotelier_core::types::{DbId, Money, Timestamp};
use hotelier_db::models::room::Room;
use hotelier_db::models::stay::Stay;
use hotelier_db::models::tenant::Tenant;
use hotelier_db::repositories::{BillRepo, RoomRepo, StayRepo, TenantRepo};
use hotelier_db::{DbPool, PoolSettings};
use sqlx::postgres::PgConnectOptions;

use crate::store::{Connector, Registry, StoreError, TenantStore};

/// Connection settings for the registry and tenant databases.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// URL of the registry database.
    pub registry_url: String,
    /// URL whose database name is replaced by `tenant_<id>` for each tenant.
    pub tenant_base_url: String,
    pub registry_pool: PoolSettings,
    pub tenant_pool: PoolSettings,
    /// Apply pending migrations when the registry or a tenant database is
    /// first opened.
    pub auto_migrate: bool,
}

impl ConnectorConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                     | Default          |
    /// |-----------------------------|------------------|
    /// | `DATABASE_URL`              | (required)       |
    /// | `TENANT_DATABASE_URL`       | `DATABASE_URL`   |
    /// | `DB_MAX_CONNECTIONS`        | `10`             |
    /// | `TENANT_DB_MAX_CONNECTIONS` | `5`              |
    /// | `DB_CONNECT_TIMEOUT_SECS`   | `5`              |
    /// | `DB_AUTO_MIGRATE`           | `true`           |
    pub fn from_env() -> Result<Self, ConfigError> {
        let registry_url = require_env("DATABASE_URL")?;
        let tenant_base_url =
            std::env::var("TENANT_DATABASE_URL").unwrap_or_else(|_| registry_url.clone());
        let acquire_timeout = Duration::from_secs(env_or("DB_CONNECT_TIMEOUT_SECS", 5)?);

        Ok(Self {
            registry_url,
            tenant_base_url,
            registry_pool: PoolSettings {
                max_connections: env_or("DB_MAX_CONNECTIONS", 10)?,
                acquire_timeout,
            },
            tenant_pool: PoolSettings {
                max_connections: env_or("TENANT_DB_MAX_CONNECTIONS", 5)?,
                acquire_timeout,
            },
            auto_migrate: env_or("DB_AUTO_MIGRATE", true)?,
        })
    }
}

/// Opens sqlx pools against Postgres.
pub struct PgConnector {
    config: ConnectorConfig,
}

impl PgConnector {
    pub fn new(config: ConnectorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect_registry(&self) -> Result<Arc<dyn Registry>, StoreError> {
        let options = PgConnectOptions::from_str(&self.config.registry_url)?;
        let pool = hotelier_db::connect_with(options, self.config.registry_pool).await?;

        if self.config.auto_migrate {
            if let Err(e) = hotelier_db::run_registry_migrations(&pool).await {
                pool.close().await;
                return Err(e.into());
            }
        }

        Ok(Arc::new(PgRegistry { pool }))
    }

    async fn connect_tenant(&self, database: &str) -> Result<Arc<dyn TenantStore>, StoreError> {
        let options = PgConnectOptions::from_str(&self.config.tenant_base_url)?.database(database);
        let pool = hotelier_db::connect_with(options, self.config.tenant_pool).await?;

        if self.config.auto_migrate {
            if let Err(e) = hotelier_db::run_tenant_migrations(&pool).await {
                pool.close().await;
                return Err(e.into());
            }
        }

        Ok(Arc::new(PgTenantStore::new(pool)))
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The registry database behind a pool.
pub struct PgRegistry {
    pool: DbPool,
}

#[async_trait]
impl Registry for PgRegistry {
    async fn find_active_tenant(&self, subdomain: &str) -> Result<Option<Tenant>, StoreError> {
        Ok(TenantRepo::find_active_by_subdomain(&self.pool, subdomain).await?)
    }

    async fn list_active_tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        Ok(TenantRepo::list_active(&self.pool).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(hotelier_db::health_check(&self.pool).await?)
    }

    fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

// ---------------------------------------------------------------------------
// Tenant models
// ---------------------------------------------------------------------------

/// The tenant model set bound to one tenant database pool.
///
/// Built once per tenant by [`PgConnector::connect_tenant`]; every method
/// runs the corresponding repository query against that pool only.
pub struct PgTenantStore {
    pool: DbPool,
}

impl PgTenantStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantStore for PgTenantStore {
    async fn list_checked_in_stays(&self) -> Result<Vec<Stay>, StoreError> {
        Ok(StayRepo::list_checked_in(&self.pool).await?)
    }

    async fn list_overdue_stays(&self, now: Timestamp) -> Result<Vec<Stay>, StoreError> {
        Ok(StayRepo::list_overdue(&self.pool, now).await?)
    }

    async fn find_room(&self, room_id: DbId) -> Result<Option<Room>, StoreError> {
        Ok(RoomRepo::find_by_id(&self.pool, room_id).await?)
    }

    async fn find_open_bill(&self, stay_id: DbId) -> Result<Option<Bill>, StoreError> {
        let Some(row) = BillRepo::find_open_by_stay(&self.pool, stay_id).await? else {
            return Ok(None);
        };
        let items = BillRepo::list_items(&self.pool, row.id).await?;
        Ok(Some(row.into_bill(items)?))
    }

    async fn save_system_charges(&self, bill: &Bill) -> Result<Money, StoreError> {
        let items: Vec<_> = bill.system_charges().cloned().collect();
        Ok(BillRepo::replace_system_charges(&self.pool, bill.id, &items).await?)
    }

    fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
