//! Connection manager lifecycle tests against the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use hotelier_tenancy::memory::MemoryBackend;
use hotelier_tenancy::{ConnectionManager, TenancyError};

fn manager(backend: &MemoryBackend) -> Arc<ConnectionManager> {
    Arc::new(ConnectionManager::new(Arc::new(backend.clone())))
}

// ---------------------------------------------------------------------------
// Registry connection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn main_connection_is_opened_once() {
    let backend = MemoryBackend::new();
    let manager = manager(&backend);

    let first = manager.main_connection().await.unwrap();
    let second = manager.main_connection().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(backend.registry_opens(), 1);
}

#[tokio::test]
async fn failed_registry_open_is_retried() {
    let backend = MemoryBackend::new();
    let manager = manager(&backend);

    backend.set_registry_down(true);
    assert_matches!(
        manager.main_connection().await,
        Err(TenancyError::Unavailable(_))
    );

    backend.set_registry_down(false);
    assert!(manager.main_connection().await.is_ok());
    assert_eq!(backend.registry_opens(), 2);
}

// ---------------------------------------------------------------------------
// Tenant connections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tenant_connection_is_reused() {
    let backend = MemoryBackend::new();
    let manager = manager(&backend);

    let first = manager.tenant_connection("grand").await.unwrap();
    let second = manager.tenant_connection("GRAND").await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.database(), "tenant_grand");
    assert_eq!(first.tenant_id(), "grand");
    assert_eq!(backend.tenant_opens(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_opens_for_one_tenant_are_single_flight() {
    let backend = MemoryBackend::new();
    backend.set_open_delay(Duration::from_millis(50));
    let manager = manager(&backend);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.tenant_connection("grand").await })
        })
        .collect();

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap().unwrap());
    }

    assert_eq!(backend.tenant_opens(), 1);
    assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
}

#[tokio::test]
async fn each_tenant_gets_its_own_connection() {
    let backend = MemoryBackend::new();
    let manager = manager(&backend);

    let grand = manager.tenant_connection("grand").await.unwrap();
    let seaside = manager.tenant_connection("seaside").await.unwrap();

    assert!(!Arc::ptr_eq(&grand, &seaside));
    assert_eq!(backend.tenant_opens(), 2);

    let stats = manager.stats().await;
    assert_eq!(stats.tenant_connections, 2);
    assert_eq!(stats.tenants, ["grand", "seaside"]);
}

#[tokio::test]
async fn failed_tenant_open_is_not_cached() {
    let backend = MemoryBackend::new();
    let manager = manager(&backend);

    backend.fail_tenant_opens("grand");
    assert_matches!(
        manager.tenant_connection("grand").await,
        Err(TenancyError::Unavailable(_))
    );
    assert_eq!(manager.stats().await.tenant_connections, 0);

    backend.restore_tenant_opens("grand");
    assert!(manager.tenant_connection("grand").await.is_ok());
    assert_eq!(backend.tenant_opens(), 2);
}

#[tokio::test]
async fn closed_handle_is_replaced() {
    let backend = MemoryBackend::new();
    let manager = manager(&backend);

    let first = manager.tenant_connection("grand").await.unwrap();
    first.store().close().await;

    let second = manager.tenant_connection("grand").await.unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!second.store().is_closed());
    assert_eq!(backend.tenant_opens(), 2);
}

#[tokio::test]
async fn invalid_identifier_never_opens_a_connection() {
    let backend = MemoryBackend::new();
    let manager = manager(&backend);

    assert_matches!(
        manager.tenant_connection("bad_name").await,
        Err(TenancyError::NotFound(_))
    );
    assert_eq!(backend.tenant_opens(), 0);
}

// ---------------------------------------------------------------------------
// Shutdown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn close_all_closes_every_connection() {
    let backend = MemoryBackend::new();
    let manager = manager(&backend);

    let registry = manager.main_connection().await.unwrap();
    let grand = manager.tenant_connection("grand").await.unwrap();

    manager.close_all().await;

    assert!(registry.is_closed());
    assert!(grand.store().is_closed());

    let stats = manager.stats().await;
    assert!(!stats.main_connected);
    assert_eq!(stats.tenant_connections, 0);

    assert_matches!(
        manager.tenant_connection("grand").await,
        Err(TenancyError::Unavailable(_))
    );
    assert_matches!(
        manager.main_connection().await,
        Err(TenancyError::Unavailable(_))
    );
}
