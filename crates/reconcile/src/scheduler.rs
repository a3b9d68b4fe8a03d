//! Periodic reconciliation tasks.
//!
//! [`ReconciliationScheduler`] owns three independently ticking tasks. Each
//! task carries a running flag: a tick (or a manual trigger) that finds its
//! task already running is skipped instead of overlapping. Shutdown cancels
//! the tickers and waits, bounded by the configured timeout, for in-flight
//! passes to finish their current stay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::pass::{PassReport, Reconciler};

/// The scheduler's periodic tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileTask {
    /// Recompute every checked-in stay.
    FullRecompute,
    /// Recompute checked-in stays past their expected check-out.
    LateCheckoutSweep,
    /// Log per-tenant occupancy and open balances.
    DailySummary,
}

impl ReconcileTask {
    pub const ALL: [ReconcileTask; 3] = [
        ReconcileTask::FullRecompute,
        ReconcileTask::LateCheckoutSweep,
        ReconcileTask::DailySummary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullRecompute => "full_recompute",
            Self::LateCheckoutSweep => "late_checkout_sweep",
            Self::DailySummary => "daily_summary",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::FullRecompute => 0,
            Self::LateCheckoutSweep => 1,
            Self::DailySummary => 2,
        }
    }
}

impl std::fmt::Display for ReconcileTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Idle,
    Running,
}

/// State of one task, as reported to operators.
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatus {
    pub task: ReconcileTask,
    pub state: TaskState,
    pub interval_secs: u64,
    pub last_report: Option<PassReport>,
}

#[derive(Default)]
struct TaskSlot {
    running: AtomicBool,
    last_report: RwLock<Option<PassReport>>,
}

/// Clears a task's running flag when the run ends, however it ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives reconciliation passes on fixed intervals.
pub struct ReconciliationScheduler {
    reconciler: Reconciler,
    config: SchedulerConfig,
    slots: [TaskSlot; 3],
    cancel: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ReconciliationScheduler {
    pub fn new(reconciler: Reconciler, config: SchedulerConfig) -> Arc<Self> {
        Arc::new(Self {
            reconciler,
            config,
            slots: Default::default(),
            cancel: CancellationToken::new(),
            handles: Mutex::new(Vec::new()),
        })
    }

    /// Spawn the three tickers. Does nothing when the scheduler is disabled.
    ///
    /// Each task first runs one full interval after start.
    pub async fn start(self: &Arc<Self>) {
        if !self.config.enabled {
            tracing::info!("Reconciliation scheduler disabled");
            return;
        }

        let mut handles = self.handles.lock().await;
        for task in ReconcileTask::ALL {
            let period = self.interval(task);
            let scheduler = Arc::clone(self);
            handles.push(tokio::spawn(async move {
                scheduler.tick_loop(task, period).await;
            }));
            tracing::info!(task = %task, interval_secs = period.as_secs(), "Task scheduled");
        }
    }

    /// Run the full recompute now, outside its schedule.
    ///
    /// Fails with [`SchedulerError::TaskBusy`] when a full recompute is
    /// already running.
    pub async fn trigger_manual_reconciliation(&self) -> Result<PassReport, SchedulerError> {
        tracing::info!("Manual reconciliation triggered");
        self.run_task(ReconcileTask::FullRecompute).await
    }

    /// Run `task` once, unless it is already running.
    pub async fn run_task(&self, task: ReconcileTask) -> Result<PassReport, SchedulerError> {
        if self.cancel.is_cancelled() {
            return Err(SchedulerError::ShutDown);
        }

        let slot = &self.slots[task.index()];
        if slot
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SchedulerError::TaskBusy(task));
        }
        let _running = RunningGuard(&slot.running);

        let report = self.reconciler.run(task, Utc::now(), &self.cancel).await;
        *slot.last_report.write().await = Some(report.clone());

        Ok(report)
    }

    pub fn task_state(&self, task: ReconcileTask) -> TaskState {
        if self.slots[task.index()].running.load(Ordering::Acquire) {
            TaskState::Running
        } else {
            TaskState::Idle
        }
    }

    /// The report of the most recent completed run of `task`.
    pub async fn last_report(&self, task: ReconcileTask) -> Option<PassReport> {
        self.slots[task.index()].last_report.read().await.clone()
    }

    /// State, interval and last report of every task.
    pub async fn status(&self) -> Vec<TaskStatus> {
        let mut status = Vec::with_capacity(ReconcileTask::ALL.len());
        for task in ReconcileTask::ALL {
            status.push(TaskStatus {
                task,
                state: self.task_state(task),
                interval_secs: self.interval(task).as_secs(),
                last_report: self.last_report(task).await,
            });
        }
        status
    }

    /// Stop the tickers and wait for in-flight passes.
    ///
    /// Running passes stop after their current stay. Waiting is bounded by
    /// the configured shutdown timeout.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down reconciliation scheduler");
        self.cancel.cancel();

        let deadline = Instant::now() + self.config.shutdown_timeout;
        let handles: Vec<_> = self.handles.lock().await.drain(..).collect();
        for handle in handles {
            if tokio::time::timeout_at(deadline, handle).await.is_err() {
                tracing::warn!("Reconciliation task did not stop before the shutdown timeout");
            }
        }

        tracing::info!("Reconciliation scheduler shut down complete");
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // ---- private helpers ----

    fn interval(&self, task: ReconcileTask) -> Duration {
        match task {
            ReconcileTask::FullRecompute => self.config.reconcile_interval,
            ReconcileTask::LateCheckoutSweep => self.config.late_checkout_interval,
            ReconcileTask::DailySummary => self.config.daily_summary_interval,
        }
    }

    async fn tick_loop(&self, task: ReconcileTask, period: Duration) {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!(task = %task, "Task stopping");
                    break;
                }
                _ = interval.tick() => {
                    match self.run_task(task).await {
                        Ok(_) => {}
                        Err(SchedulerError::TaskBusy(_)) => {
                            tracing::warn!(
                                task = %task,
                                "Previous run still in progress, tick skipped"
                            );
                        }
                        Err(SchedulerError::ShutDown) => break,
                    }
                }
            }
        }
    }
}
