//! Interval scheduler for the order reconciliation sweep.
//!
//! Runs [`ScheduledSweep::run_sweep`] once per interval on a background task.
//! A sweep is never interrupted by `stop`; cancellation is observed between
//! ticks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use recreviews_core::ScheduledSweep;
use recreviews_domain::{SweepOutcome, SyncConfig};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the sync scheduler
#[derive(Debug, Clone)]
pub struct SyncSchedulerConfig {
    /// Time between two sweeps
    pub interval: Duration,
    /// Run a sweep as soon as the scheduler starts
    pub run_on_start: bool,
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(3600), run_on_start: false }
    }
}

impl From<&SyncConfig> for SyncSchedulerConfig {
    fn from(config: &SyncConfig) -> Self {
        Self { interval: Duration::from_secs(config.interval_secs.max(1)), run_on_start: false }
    }
}

/// Periodic driver for the reconciliation sweep
pub struct SyncScheduler {
    sweep: Arc<dyn ScheduledSweep>,
    config: SyncSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl SyncScheduler {
    pub fn new(sweep: Arc<dyn ScheduledSweep>, config: SyncSchedulerConfig) -> Self {
        Self {
            sweep,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the scheduler
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is already running
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(interval_secs = self.config.interval.as_secs(), "Starting sync scheduler");

        // New token so the scheduler can restart after stop
        self.cancellation_token = CancellationToken::new();

        let sweep = Arc::clone(&self.sweep);
        let config = self.config.clone();
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::sweep_loop(sweep, config, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);
        Ok(())
    }

    /// Stop the scheduler gracefully
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is not running, or the background task does
    /// not finish within five seconds
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping sync scheduler");
        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            tokio::time::timeout(STOP_TIMEOUT, handle)
                .await
                .map_err(|_| SchedulerError::Timeout { seconds: STOP_TIMEOUT.as_secs() })?
                .map_err(|e| SchedulerError::TaskJoinFailed(e.to_string()))?;
        }

        info!("Sync scheduler stopped");
        Ok(())
    }

    /// A scheduler is running while its background task has not finished.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    async fn sweep_loop(
        sweep: Arc<dyn ScheduledSweep>,
        config: SyncSchedulerConfig,
        cancel: CancellationToken,
    ) {
        let start = if config.run_on_start {
            tokio::time::Instant::now()
        } else {
            tokio::time::Instant::now() + config.interval
        };
        let mut ticker = tokio::time::interval_at(start, config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Sweep loop cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    Self::run_once(sweep.as_ref()).await;
                }
            }
        }
    }

    async fn run_once(sweep: &dyn ScheduledSweep) {
        let started = Instant::now();
        match sweep.run_sweep().await {
            Ok(SweepOutcome::Ran(summary)) => info!(
                completed = summary.completed,
                sent = summary.sent,
                ignored = summary.ignored,
                failed = summary.failed,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "scheduled sweep finished"
            ),
            Ok(SweepOutcome::Skipped(reason)) => debug!(?reason, "scheduled sweep skipped"),
            Err(err) => error!(error_kind = err.label(), error = %err, "scheduled sweep failed"),
        }
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("SyncScheduler dropped while running; cancelling background task");
            self.cancellation_token.cancel();
        }
    }
}
