//! Repository for the registry `tenants` table.

use sqlx::PgPool;

use crate::models::tenant::{Tenant, TENANT_STATUS_ACTIVE};

/// Column list for `tenants` queries.
const COLUMNS: &str = "\
    id, subdomain, name, status, \
    standard_check_in_hour, standard_check_out_hour, \
    early_check_in_policy, late_check_out_policy, utc_offset_minutes, \
    created_at, updated_at";

/// Read-only queries over the tenant registry.
pub struct TenantRepo;

impl TenantRepo {
    /// Find an active tenant by its (lowercase) subdomain.
    pub async fn find_active_by_subdomain(
        pool: &PgPool,
        subdomain: &str,
    ) -> Result<Option<Tenant>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM tenants WHERE subdomain = $1 AND status = $2");
        sqlx::query_as::<_, Tenant>(&query)
            .bind(subdomain)
            .bind(TENANT_STATUS_ACTIVE)
            .fetch_optional(pool)
            .await
    }

    /// List all active tenants ordered by subdomain.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Tenant>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM tenants WHERE status = $1 ORDER BY subdomain ASC");
        sqlx::query_as::<_, Tenant>(&query)
            .bind(TENANT_STATUS_ACTIVE)
            .fetch_all(pool)
            .await
    }
}
