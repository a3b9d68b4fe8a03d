//! Registry repository tests. Require a Postgres server (`DATABASE_URL`).

use hotelier_db::repositories::TenantRepo;
use sqlx::PgPool;

async fn insert_tenant(pool: &PgPool, subdomain: &str, status: &str) {
    sqlx::query("INSERT INTO tenants (subdomain, name, status) VALUES ($1, $2, $3)")
        .bind(subdomain)
        .bind(format!("Hotel {subdomain}"))
        .bind(status)
        .execute(pool)
        .await
        .unwrap();
}

#[sqlx::test(migrations = "migrations/registry")]
async fn finds_only_active_tenants(pool: PgPool) {
    insert_tenant(&pool, "grand", "active").await;
    insert_tenant(&pool, "closed", "inactive").await;

    let grand = TenantRepo::find_active_by_subdomain(&pool, "grand")
        .await
        .unwrap()
        .expect("active tenant should be found");
    assert_eq!(grand.name, "Hotel grand");
    assert!(grand.policy().is_ok());

    let closed = TenantRepo::find_active_by_subdomain(&pool, "closed")
        .await
        .unwrap();
    assert!(closed.is_none());
}

#[sqlx::test(migrations = "migrations/registry")]
async fn lists_active_tenants_in_subdomain_order(pool: PgPool) {
    insert_tenant(&pool, "seaside", "active").await;
    insert_tenant(&pool, "alpine", "active").await;
    insert_tenant(&pool, "closed", "inactive").await;

    let tenants = TenantRepo::list_active(&pool).await.unwrap();
    let names: Vec<_> = tenants.iter().map(|t| t.subdomain.as_str()).collect();
    assert_eq!(names, ["alpine", "seaside"]);
}

#[sqlx::test(migrations = "migrations/registry")]
async fn rejects_uppercase_subdomain(pool: PgPool) {
    let result = sqlx::query("INSERT INTO tenants (subdomain, name) VALUES ('Grand', 'Grand')")
        .execute(&pool)
        .await;
    assert!(result.is_err());
}
