use hotelier_core::error::CoreError;
use hotelier_core::types::DbId;
use hotelier_tenancy::StoreError;

use crate::scheduler::ReconcileTask;

/// Failure to reconcile one stay. Counted against its tenant; the pass
/// moves on to the next stay.
#[derive(Debug, thiserror::Error)]
pub enum StayError {
    #[error("Stay {stay_id} references missing room {room_id}")]
    MissingRoom { stay_id: DbId, room_id: DbId },

    #[error("Stay {stay_id} has no open bill")]
    MissingBill { stay_id: DbId },

    #[error("Stay {stay_id} has an invalid record: {source}")]
    InvalidRecord { stay_id: DbId, source: CoreError },

    #[error("Stay {stay_id}: {source}")]
    Store { stay_id: DbId, source: StoreError },
}

impl StayError {
    /// Attribute a storage failure to a stay. Rows that fail domain
    /// validation are reported as invalid records rather than I/O errors.
    pub fn from_store(stay_id: DbId, err: StoreError) -> Self {
        match err {
            StoreError::InvalidRecord(source) => Self::InvalidRecord { stay_id, source },
            source => Self::Store { stay_id, source },
        }
    }

    pub fn stay_id(&self) -> DbId {
        match self {
            Self::MissingRoom { stay_id, .. }
            | Self::MissingBill { stay_id }
            | Self::InvalidRecord { stay_id, .. }
            | Self::Store { stay_id, .. } => *stay_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// The task is already running; overlapping runs are refused.
    #[error("Task {0} is already running")]
    TaskBusy(ReconcileTask),

    #[error("Scheduler is shut down")]
    ShutDown,
}
