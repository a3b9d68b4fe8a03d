//! In-memory registry and tenant databases.
//!
//! Used by tests across the workspace in place of Postgres. A
//! [`MemoryBackend`] plays the database server: it holds the registry rows
//! and one [`MemoryTenantDb`] per logical database, counts connection opens,
//! and can be told to fail specific opens or queries.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hotelier_core::bill::{Bill, BillItem, ItemOrigin, ItemType};
use hotelier_core::tenant::tenant_database_name;
use hotelier_core::types::{round_money, DbId, Money, Timestamp, MONEY_SCALE};
use hotelier_db::models::room::Room;
use hotelier_db::models::stay::{Stay, STAY_STATUS_CHECKED_IN, STAY_STATUS_CHECKED_OUT};
use hotelier_db::models::tenant::{Tenant, TENANT_STATUS_ACTIVE};
use rust_decimal::Decimal;

use crate::store::{Connector, Registry, StoreError, TenantStore};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// An amount as a `NUMERIC(12,2)` column returns it.
fn stored(amount: Money) -> Money {
    let mut amount = round_money(amount);
    amount.rescale(MONEY_SCALE);
    amount
}

fn unavailable() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

/// An active tenant with a 14:00 / 12:00 half-rate policy in UTC.
pub fn tenant(subdomain: &str) -> Tenant {
    static NEXT_ID: AtomicI64 = AtomicI64::new(1);
    let now = Utc::now();
    Tenant {
        id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        subdomain: subdomain.to_string(),
        name: format!("Hotel {subdomain}"),
        status: TENANT_STATUS_ACTIVE.to_string(),
        standard_check_in_hour: 14,
        standard_check_out_hour: 12,
        early_check_in_policy: "half_rate".to_string(),
        late_check_out_policy: "half_rate".to_string(),
        utc_offset_minutes: 0,
        created_at: now,
        updated_at: now,
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// The in-memory "server" shared by every connection it hands out.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<BackendState>,
}

#[derive(Default)]
struct BackendState {
    tenants: Mutex<Vec<Tenant>>,
    databases: Mutex<HashMap<String, Arc<MemoryTenantDb>>>,
    failing_databases: Mutex<HashSet<String>>,
    registry_down: AtomicBool,
    registry_opens: AtomicUsize,
    tenant_opens: AtomicUsize,
    open_delay: Mutex<Option<Duration>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tenant in the registry.
    pub fn add_tenant(&self, tenant: Tenant) {
        lock(&self.inner.tenants).push(tenant);
    }

    /// Change a registered tenant's status.
    pub fn set_tenant_status(&self, subdomain: &str, status: &str) {
        for tenant in lock(&self.inner.tenants).iter_mut() {
            if tenant.subdomain == subdomain {
                tenant.status = status.to_string();
            }
        }
    }

    /// The database of tenant `subdomain`, created empty on first access.
    pub fn tenant_db(&self, subdomain: &str) -> Arc<MemoryTenantDb> {
        self.database(&tenant_database_name(subdomain))
    }

    /// Make every open of this tenant's database fail.
    pub fn fail_tenant_opens(&self, subdomain: &str) {
        lock(&self.inner.failing_databases).insert(tenant_database_name(subdomain));
    }

    /// Let opens of this tenant's database succeed again.
    pub fn restore_tenant_opens(&self, subdomain: &str) {
        lock(&self.inner.failing_databases).remove(&tenant_database_name(subdomain));
    }

    /// Make registry opens and queries fail.
    pub fn set_registry_down(&self, down: bool) {
        self.inner.registry_down.store(down, Ordering::SeqCst);
    }

    /// Delay every tenant open, to widen race windows in tests.
    pub fn set_open_delay(&self, delay: Duration) {
        *lock(&self.inner.open_delay) = Some(delay);
    }

    pub fn registry_opens(&self) -> usize {
        self.inner.registry_opens.load(Ordering::SeqCst)
    }

    /// Number of tenant database opens attempted, including failed ones.
    pub fn tenant_opens(&self) -> usize {
        self.inner.tenant_opens.load(Ordering::SeqCst)
    }

    fn database(&self, name: &str) -> Arc<MemoryTenantDb> {
        Arc::clone(lock(&self.inner.databases).entry(name.to_string()).or_default())
    }
}

#[async_trait]
impl Connector for MemoryBackend {
    async fn connect_registry(&self) -> Result<Arc<dyn Registry>, StoreError> {
        self.inner.registry_opens.fetch_add(1, Ordering::SeqCst);
        if self.inner.registry_down.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(Arc::new(MemoryRegistry {
            backend: self.clone(),
            closed: AtomicBool::new(false),
        }))
    }

    async fn connect_tenant(&self, database: &str) -> Result<Arc<dyn TenantStore>, StoreError> {
        self.inner.tenant_opens.fetch_add(1, Ordering::SeqCst);

        let delay = *lock(&self.inner.open_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if lock(&self.inner.failing_databases).contains(database) {
            return Err(unavailable());
        }

        Ok(Arc::new(MemoryConnection {
            db: self.database(database),
            closed: AtomicBool::new(false),
        }))
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

struct MemoryRegistry {
    backend: MemoryBackend,
    closed: AtomicBool,
}

impl MemoryRegistry {
    fn check(&self) -> Result<(), StoreError> {
        let down = self.backend.inner.registry_down.load(Ordering::SeqCst);
        if down || self.closed.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn find_active_tenant(&self, subdomain: &str) -> Result<Option<Tenant>, StoreError> {
        self.check()?;
        Ok(lock(&self.backend.inner.tenants)
            .iter()
            .find(|t| t.subdomain == subdomain && t.is_active())
            .cloned())
    }

    async fn list_active_tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        self.check()?;
        let mut tenants: Vec<Tenant> = lock(&self.backend.inner.tenants)
            .iter()
            .filter(|t| t.is_active())
            .cloned()
            .collect();
        tenants.sort_by(|a, b| a.subdomain.cmp(&b.subdomain));
        Ok(tenants)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Tenant databases
// ---------------------------------------------------------------------------

/// One tenant's rooms, stays and bills.
#[derive(Default)]
pub struct MemoryTenantDb {
    next_id: AtomicI64,
    rooms: Mutex<HashMap<DbId, Room>>,
    stays: Mutex<Vec<Stay>>,
    /// Open bills keyed by stay id.
    bills: Mutex<HashMap<DbId, Bill>>,
    fail_stay_queries: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryTenantDb {
    fn next_id(&self) -> DbId {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn add_room(&self, number: &str, price: Money) -> DbId {
        let id = self.next_id();
        let now = Utc::now();
        lock(&self.rooms).insert(
            id,
            Room {
                id,
                number: number.to_string(),
                price: stored(price),
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn remove_room(&self, room_id: DbId) {
        lock(&self.rooms).remove(&room_id);
    }

    /// Add a checked-in stay whose actual check-in equals `check_in`.
    pub fn add_stay(&self, room_id: DbId, check_in: Timestamp, check_out: Timestamp) -> DbId {
        let id = self.next_id();
        let now = Utc::now();
        lock(&self.stays).push(Stay {
            id,
            room_id,
            guest_name: format!("Guest {id}"),
            check_in_date: check_in,
            actual_check_in_date: Some(check_in),
            check_out_date: check_out,
            actual_check_out_date: None,
            status: STAY_STATUS_CHECKED_IN.to_string(),
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn stay(&self, stay_id: DbId) -> Option<Stay> {
        lock(&self.stays).iter().find(|s| s.id == stay_id).cloned()
    }

    /// Record the guest's departure.
    pub fn check_out(&self, stay_id: DbId, at: Timestamp) {
        for stay in lock(&self.stays).iter_mut() {
            if stay.id == stay_id {
                stay.actual_check_out_date = Some(at);
                stay.status = STAY_STATUS_CHECKED_OUT.to_string();
            }
        }
    }

    /// Open an empty bill for a stay.
    pub fn open_bill(&self, stay_id: DbId) -> DbId {
        let id = self.next_id();
        lock(&self.bills).insert(
            stay_id,
            Bill {
                id,
                stay_id,
                items: Vec::new(),
                total: Decimal::ZERO,
            },
        );
        id
    }

    /// Add a manual service charge to a stay's open bill.
    pub fn add_manual_item(&self, stay_id: DbId, code: &str, amount: Money) {
        let id = self.next_id();
        if let Some(bill) = lock(&self.bills).get_mut(&stay_id) {
            bill.items.push(BillItem {
                id: Some(id),
                origin: ItemOrigin::Manual,
                item_type: ItemType::ServiceCharge,
                code: code.to_string(),
                description: code.to_string(),
                quantity: 1,
                unit_price: stored(amount),
                amount: stored(amount),
            });
            bill.total = bill.items_total();
        }
    }

    /// The stored open bill of a stay.
    pub fn bill(&self, stay_id: DbId) -> Option<Bill> {
        lock(&self.bills).get(&stay_id).cloned()
    }

    /// Make stay listing queries fail.
    pub fn fail_stay_queries(&self, fail: bool) {
        self.fail_stay_queries.store(fail, Ordering::SeqCst);
    }

    /// Number of bill writes performed.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn stays_matching(&self, keep: impl Fn(&Stay) -> bool) -> Result<Vec<Stay>, StoreError> {
        if self.fail_stay_queries.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(lock(&self.stays).iter().filter(|s| keep(s)).cloned().collect())
    }
}

/// A connection to a [`MemoryTenantDb`]. Closing it does not affect the data.
struct MemoryConnection {
    db: Arc<MemoryTenantDb>,
    closed: AtomicBool,
}

impl MemoryConnection {
    fn check(&self) -> Result<&MemoryTenantDb, StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        } else {
            Ok(&self.db)
        }
    }
}

#[async_trait]
impl TenantStore for MemoryConnection {
    async fn list_checked_in_stays(&self) -> Result<Vec<Stay>, StoreError> {
        self.check()?.stays_matching(|s| s.status == STAY_STATUS_CHECKED_IN)
    }

    async fn list_overdue_stays(&self, now: Timestamp) -> Result<Vec<Stay>, StoreError> {
        self.check()?.stays_matching(|s| s.is_overdue(now))
    }

    async fn find_room(&self, room_id: DbId) -> Result<Option<Room>, StoreError> {
        Ok(lock(&self.check()?.rooms).get(&room_id).cloned())
    }

    async fn find_open_bill(&self, stay_id: DbId) -> Result<Option<Bill>, StoreError> {
        Ok(lock(&self.check()?.bills).get(&stay_id).cloned())
    }

    async fn save_system_charges(&self, bill: &Bill) -> Result<Money, StoreError> {
        let db = self.check()?;
        let mut bills = lock(&db.bills);
        let stored = bills
            .get_mut(&bill.stay_id)
            .filter(|b| b.id == bill.id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;

        stored.items.retain(|i| !i.is_reconciled_charge());
        for item in bill.system_charges() {
            let mut item = item.clone();
            item.id = Some(db.next_id());
            item.unit_price = self::stored(item.unit_price);
            item.amount = self::stored(item.amount);
            stored.items.push(item);
        }
        stored.total = stored.items_total();
        db.saves.fetch_add(1, Ordering::SeqCst);

        Ok(stored.total)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
