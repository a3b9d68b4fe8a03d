#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use hotelier_core::types::{DbId, Money, Timestamp};
use hotelier_reconcile::Reconciler;
use hotelier_tenancy::memory::{self, MemoryBackend, MemoryTenantDb};
use hotelier_tenancy::{ConnectionManager, DirectoryConfig, TenantDirectory};
use rust_decimal_macros::dec;

pub const ROOM_PRICE: Money = dec!(5000);

/// `hour:00` UTC on day `day` of March 2026.
pub fn at(day: u32, hour: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
}

/// A backend with one active tenant per subdomain.
pub fn backend_with(subdomains: &[&str]) -> MemoryBackend {
    let backend = MemoryBackend::new();
    for subdomain in subdomains {
        backend.add_tenant(memory::tenant(subdomain));
    }
    backend
}

pub fn directory(backend: &MemoryBackend) -> Arc<TenantDirectory> {
    let manager = Arc::new(ConnectionManager::new(Arc::new(backend.clone())));
    Arc::new(TenantDirectory::new(manager, DirectoryConfig::default()))
}

pub fn reconciler(backend: &MemoryBackend) -> Reconciler {
    Reconciler::new(directory(backend))
}

/// A checked-in stay with an open bill in a room at [`ROOM_PRICE`].
pub fn seed_stay(db: &MemoryTenantDb, check_in: Timestamp, check_out: Timestamp) -> DbId {
    let room = db.add_room("101", ROOM_PRICE);
    let stay = db.add_stay(room, check_in, check_out);
    db.open_bill(stay);
    stay
}
