//! Write-back of a single stay's charges.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use hotelier_core::bill::{ItemOrigin, CODE_EARLY_CHECK_IN, CODE_LATE_CHECK_OUT, CODE_NIGHTLY};
use hotelier_core::billing::{ChargePolicy, HotelPolicy};
use hotelier_core::types::DbId;
use hotelier_db::models::stay::Stay;
use hotelier_reconcile::stay::reconcile_stay;
use hotelier_reconcile::StayError;
use hotelier_tenancy::memory::MemoryTenantDb;
use hotelier_tenancy::TenantStore;
use rust_decimal_macros::dec;

use common::{at, backend_with, directory, seed_stay};

fn half_rate() -> HotelPolicy {
    HotelPolicy::new(14, 12, ChargePolicy::HalfRate, ChargePolicy::HalfRate, 0).unwrap()
}

async fn stay(store: &dyn TenantStore, stay_id: DbId) -> Stay {
    store
        .list_checked_in_stays()
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.id == stay_id)
        .unwrap()
}

struct Fixture {
    db: Arc<MemoryTenantDb>,
    store: Arc<dyn TenantStore>,
}

async fn fixture() -> Fixture {
    let backend = backend_with(&["grand"]);
    let resolved = directory(&backend).resolve("grand").await.unwrap();
    Fixture {
        db: backend.tenant_db("grand"),
        store: resolved.handle.store().clone(),
    }
}

#[tokio::test]
async fn writes_nightly_and_early_charges() {
    let f = fixture().await;
    let stay_id = seed_stay(&f.db, at(1, 10), at(2, 12));
    let stay = stay(f.store.as_ref(), stay_id).await;

    let outcome = reconcile_stay(f.store.as_ref(), &stay, &half_rate(), at(2, 11))
        .await
        .unwrap();

    assert!(outcome.written);
    assert_eq!(outcome.charges.nights, 1);
    assert_eq!(outcome.total, dec!(7500));

    let bill = f.db.bill(stay_id).unwrap();
    let mut codes: Vec<_> = bill.items.iter().map(|i| i.code.as_str()).collect();
    codes.sort();
    assert_eq!(codes, [CODE_EARLY_CHECK_IN, CODE_NIGHTLY]);
    assert_eq!(bill.total, dec!(7500));
}

#[tokio::test]
async fn second_run_on_unchanged_stay_does_not_write() {
    let f = fixture().await;
    let stay_id = seed_stay(&f.db, at(1, 10), at(2, 12));
    let stay = stay(f.store.as_ref(), stay_id).await;
    let policy = half_rate();

    reconcile_stay(f.store.as_ref(), &stay, &policy, at(2, 11)).await.unwrap();
    let first = f.db.bill(stay_id).unwrap();

    let outcome = reconcile_stay(f.store.as_ref(), &stay, &policy, at(2, 11))
        .await
        .unwrap();
    let second = f.db.bill(stay_id).unwrap();

    assert!(!outcome.written);
    assert_eq!(f.db.saves(), 1);
    assert_eq!(first.total, second.total);
    assert_eq!(first.items.len(), second.items.len());
}

#[tokio::test]
async fn sub_cent_half_rate_settles_after_one_write() {
    let f = fixture().await;
    let room = f.db.add_room("202", dec!(99.99));
    let stay_id = f.db.add_stay(room, at(1, 10), at(2, 12));
    f.db.open_bill(stay_id);
    let stay = stay(f.store.as_ref(), stay_id).await;
    let policy = half_rate();

    let first = reconcile_stay(f.store.as_ref(), &stay, &policy, at(2, 11))
        .await
        .unwrap();
    let second = reconcile_stay(f.store.as_ref(), &stay, &policy, at(2, 11))
        .await
        .unwrap();

    assert_eq!(first.charges.early_check_in_charge, dec!(50.00));
    assert_eq!(first.charges.total, dec!(149.99));
    assert_eq!(first.total, first.charges.total);
    assert!(!second.written);
    assert_eq!(f.db.saves(), 1);
    assert_eq!(f.db.bill(stay_id).unwrap().total, dec!(149.99));
}

#[tokio::test]
async fn ongoing_stay_accrues_as_time_passes() {
    let f = fixture().await;
    let stay_id = seed_stay(&f.db, at(1, 15), at(2, 12));
    let stay = stay(f.store.as_ref(), stay_id).await;
    let policy = half_rate();

    let before = reconcile_stay(f.store.as_ref(), &stay, &policy, at(2, 11))
        .await
        .unwrap();
    let after = reconcile_stay(f.store.as_ref(), &stay, &policy, at(4, 11))
        .await
        .unwrap();

    assert_eq!(before.total, dec!(5000));
    assert_eq!(after.charges.nights, 3);
    assert_eq!(after.total, dec!(15000));
    assert_eq!(f.db.saves(), 2);
}

#[tokio::test]
async fn late_check_out_is_charged_once_checked_out() {
    let f = fixture().await;
    let stay_id = seed_stay(&f.db, at(1, 15), at(2, 12));
    f.db.check_out(stay_id, at(2, 20));
    let stay = f.db.stay(stay_id).unwrap();

    let outcome = reconcile_stay(f.store.as_ref(), &stay, &half_rate(), at(9, 0))
        .await
        .unwrap();

    // 20:00 is past the 18:00 limit: a full night regardless of policy.
    assert_eq!(outcome.charges.late_check_out_charge, dec!(5000));
    assert_eq!(outcome.total, dec!(10000));
    let bill = f.db.bill(stay_id).unwrap();
    assert!(bill.items.iter().any(|i| i.code == CODE_LATE_CHECK_OUT));
}

#[tokio::test]
async fn manual_items_survive_reconciliation() {
    let f = fixture().await;
    let stay_id = seed_stay(&f.db, at(1, 15), at(2, 12));
    f.db.add_manual_item(stay_id, "minibar", dec!(320));
    let stay = stay(f.store.as_ref(), stay_id).await;

    let outcome = reconcile_stay(f.store.as_ref(), &stay, &half_rate(), at(2, 11))
        .await
        .unwrap();

    assert_eq!(outcome.total, dec!(5320));
    let bill = f.db.bill(stay_id).unwrap();
    let manual: Vec<_> = bill
        .items
        .iter()
        .filter(|i| i.origin == ItemOrigin::Manual)
        .collect();
    assert_eq!(manual.len(), 1);
    assert_eq!(manual[0].amount, dec!(320));
}

#[tokio::test]
async fn missing_room_is_reported() {
    let f = fixture().await;
    let stay_id = seed_stay(&f.db, at(1, 15), at(2, 12));
    let stay = stay(f.store.as_ref(), stay_id).await;
    f.db.remove_room(stay.room_id);

    let result = reconcile_stay(f.store.as_ref(), &stay, &half_rate(), at(2, 11)).await;

    assert_matches!(result, Err(StayError::MissingRoom { stay_id: id, .. }) if id == stay_id);
    assert_eq!(f.db.saves(), 0);
}

#[tokio::test]
async fn missing_bill_is_reported() {
    let f = fixture().await;
    let room = f.db.add_room("102", common::ROOM_PRICE);
    let stay_id = f.db.add_stay(room, at(1, 15), at(2, 12));
    let stay = stay(f.store.as_ref(), stay_id).await;

    let result = reconcile_stay(f.store.as_ref(), &stay, &half_rate(), at(2, 11)).await;

    assert_matches!(result, Err(StayError::MissingBill { stay_id: id }) if id == stay_id);
}
