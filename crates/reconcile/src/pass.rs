//! One reconciliation pass across every active tenant.
//!
//! Failures are contained at the narrowest scope: a stay that cannot be
//! reconciled is counted against its tenant, and a tenant that cannot be
//! reached or read is counted once and skipped. A pass never aborts because
//! of a single tenant.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use hotelier_core::types::{Money, Timestamp};
use hotelier_db::models::stay::Stay;
use hotelier_db::models::tenant::Tenant;
use hotelier_tenancy::{TenancyError, TenantDirectory, TenantStore};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::StayError;
use crate::scheduler::ReconcileTask;
use crate::stay::reconcile_stay;

/// Per-tenant snapshot produced by the daily summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantSummary {
    pub tenant: String,
    pub checked_in: usize,
    pub overdue: usize,
    /// Sum of the open bill totals of checked-in stays.
    pub open_balance: Money,
}

/// Outcome of one pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub task: ReconcileTask,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub tenants_seen: usize,
    pub tenants_processed: usize,
    pub tenant_errors: usize,
    pub stays_reconciled: usize,
    /// Failed stays per tenant. Tenants without failures are absent.
    pub stay_errors: BTreeMap<String, usize>,
    /// Set when the tenant list could not be read at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_error: Option<String>,
    /// The pass stopped early because of shutdown.
    pub cancelled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub summaries: Vec<TenantSummary>,
}

impl PassReport {
    fn new(task: ReconcileTask, started_at: Timestamp) -> Self {
        Self {
            task,
            started_at,
            finished_at: started_at,
            tenants_seen: 0,
            tenants_processed: 0,
            tenant_errors: 0,
            stays_reconciled: 0,
            stay_errors: BTreeMap::new(),
            registry_error: None,
            cancelled: false,
            summaries: Vec::new(),
        }
    }

    /// Total number of failed stays across all tenants.
    pub fn stay_error_count(&self) -> usize {
        self.stay_errors.values().sum()
    }

    /// Whether some tenants or stays failed during the pass.
    pub fn is_partial_failure(&self) -> bool {
        self.registry_error.is_some() || self.tenant_errors > 0 || self.stay_error_count() > 0
    }
}

/// A tenant-level failure: the tenant is skipped for this pass.
#[derive(Debug, thiserror::Error)]
enum TenantError {
    #[error(transparent)]
    Resolve(#[from] TenancyError),

    #[error(transparent)]
    Policy(hotelier_core::error::CoreError),

    #[error("Failed to list stays: {0}")]
    Stays(hotelier_tenancy::StoreError),
}

/// Counters for a single tenant.
#[derive(Default)]
struct TenantOutcome {
    reconciled: usize,
    failed: usize,
    /// Stays were left unprocessed because of cancellation.
    interrupted: bool,
    summary: Option<TenantSummary>,
}

/// Runs reconciliation passes over the tenants known to a directory.
pub struct Reconciler {
    directory: Arc<TenantDirectory>,
}

impl Reconciler {
    pub fn new(directory: Arc<TenantDirectory>) -> Self {
        Self { directory }
    }

    /// Run `task` once over every active tenant, evaluating ongoing stays
    /// at `now`.
    ///
    /// `cancel` is checked between tenants and between stays; the stay in
    /// progress is always finished.
    pub async fn run(
        &self,
        task: ReconcileTask,
        now: Timestamp,
        cancel: &CancellationToken,
    ) -> PassReport {
        let mut report = PassReport::new(task, Utc::now());
        self.directory.purge_expired().await;

        let tenants = match self.directory.list_active_tenants().await {
            Ok(tenants) => tenants,
            Err(e) => {
                tracing::error!(task = %task, error = %e, "Failed to list tenants");
                report.registry_error = Some(e.to_string());
                report.finished_at = Utc::now();
                return report;
            }
        };
        report.tenants_seen = tenants.len();

        for tenant in &tenants {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            match self.run_tenant(task, tenant, now, cancel).await {
                Ok(outcome) => {
                    report.tenants_processed += 1;
                    report.stays_reconciled += outcome.reconciled;
                    if outcome.failed > 0 {
                        report
                            .stay_errors
                            .insert(tenant.subdomain.clone(), outcome.failed);
                    }
                    report.summaries.extend(outcome.summary);
                    report.cancelled |= outcome.interrupted;
                }
                Err(e) => {
                    tracing::error!(
                        task = %task,
                        tenant = %tenant.subdomain,
                        error = %e,
                        "Tenant skipped",
                    );
                    report.tenant_errors += 1;
                }
            }
        }

        report.finished_at = Utc::now();
        log_report(&report);
        report
    }

    // ---- private helpers ----

    async fn run_tenant(
        &self,
        task: ReconcileTask,
        tenant: &Tenant,
        now: Timestamp,
        cancel: &CancellationToken,
    ) -> Result<TenantOutcome, TenantError> {
        let resolved = self.directory.resolve(&tenant.subdomain).await?;
        let store = resolved.handle.store().as_ref();

        if task == ReconcileTask::DailySummary {
            let stays = store
                .list_checked_in_stays()
                .await
                .map_err(TenantError::Stays)?;
            return Ok(summarize(&tenant.subdomain, store, &stays, now).await);
        }

        // The listed record is fresher than a cached directory entry.
        let policy = tenant.policy().map_err(TenantError::Policy)?;

        let stays = if task == ReconcileTask::LateCheckoutSweep {
            store.list_overdue_stays(now).await
        } else {
            store.list_checked_in_stays().await
        }
        .map_err(TenantError::Stays)?;

        let mut outcome = TenantOutcome::default();
        for stay in &stays {
            if cancel.is_cancelled() {
                outcome.interrupted = true;
                break;
            }
            match reconcile_stay(store, stay, &policy, now).await {
                Ok(_) => outcome.reconciled += 1,
                Err(e) => {
                    log_stay_error(task, &tenant.subdomain, &e);
                    outcome.failed += 1;
                }
            }
        }

        tracing::debug!(
            task = %task,
            tenant = %tenant.subdomain,
            reconciled = outcome.reconciled,
            failed = outcome.failed,
            "Tenant reconciled",
        );
        Ok(outcome)
    }
}

/// Occupancy and open balance of a tenant. Does not modify any bill.
async fn summarize(
    tenant: &str,
    store: &dyn TenantStore,
    stays: &[Stay],
    now: Timestamp,
) -> TenantOutcome {
    let mut outcome = TenantOutcome::default();
    let mut open_balance = Decimal::ZERO;

    for stay in stays {
        match store.find_open_bill(stay.id).await {
            Ok(Some(bill)) => open_balance += bill.total,
            Ok(None) => {
                let e = StayError::MissingBill { stay_id: stay.id };
                log_stay_error(ReconcileTask::DailySummary, tenant, &e);
                outcome.failed += 1;
            }
            Err(e) => {
                let e = StayError::from_store(stay.id, e);
                log_stay_error(ReconcileTask::DailySummary, tenant, &e);
                outcome.failed += 1;
            }
        }
    }

    let summary = TenantSummary {
        tenant: tenant.to_string(),
        checked_in: stays.len(),
        overdue: stays.iter().filter(|s| s.is_overdue(now)).count(),
        open_balance,
    };
    tracing::info!(
        tenant = %summary.tenant,
        checked_in = summary.checked_in,
        overdue = summary.overdue,
        open_balance = %summary.open_balance,
        "Daily summary",
    );

    outcome.summary = Some(summary);
    outcome
}

fn log_stay_error(task: ReconcileTask, tenant: &str, e: &StayError) {
    tracing::error!(
        task = %task,
        tenant = %tenant,
        stay_id = e.stay_id(),
        error = %e,
        "Stay reconciliation failed",
    );
}

fn log_report(report: &PassReport) {
    let elapsed_ms = (report.finished_at - report.started_at).num_milliseconds();
    if report.is_partial_failure() {
        tracing::warn!(
            task = %report.task,
            tenants_seen = report.tenants_seen,
            tenants_processed = report.tenants_processed,
            tenant_errors = report.tenant_errors,
            stays_reconciled = report.stays_reconciled,
            stay_errors = report.stay_error_count(),
            cancelled = report.cancelled,
            elapsed_ms,
            "Reconciliation pass finished with failures",
        );
    } else {
        tracing::info!(
            task = %report.task,
            tenants_processed = report.tenants_processed,
            stays_reconciled = report.stays_reconciled,
            cancelled = report.cancelled,
            elapsed_ms,
            "Reconciliation pass finished",
        );
    }
}
