//! Background reconciliation of policy-driven stay charges.
//!
//! [`stay::reconcile_stay`] recomputes and persists the system charges of a
//! single stay. [`Reconciler`] fans that out over every active tenant, and
//! [`ReconciliationScheduler`] drives the passes on fixed intervals.

pub mod config;
pub mod error;
pub mod pass;
pub mod scheduler;
pub mod stay;

pub use config::SchedulerConfig;
pub use error::{SchedulerError, StayError};
pub use pass::{PassReport, Reconciler, TenantSummary};
pub use scheduler::{ReconcileTask, ReconciliationScheduler, TaskState, TaskStatus};
