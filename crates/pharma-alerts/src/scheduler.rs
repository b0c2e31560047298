//! # Alert Scheduler
//!
//! Keeps the alert scan running in the background for the life of the
//! process.
//!
//! ## Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Alert Scheduler Loop                             │
//! │                                                                         │
//! │   start() ──► spawn ──► scan ──┬── Ok  ──► sleep scan_interval (5m) ─┐ │
//! │                          ▲     └── Err ──► sleep retry_interval (1m) ─┤ │
//! │                          │                                            │ │
//! │                          └────────────────────────────────────────────┘ │
//! │                                                                         │
//! │   shutdown() ──► mpsc ──► select! wakes the sleep ──► loop exits        │
//! │                                                                         │
//! │   • The first scan runs as soon as the loop starts                      │
//! │   • A pass always finishes before the next sleep begins                 │
//! │   • A failed pass is logged; the loop never exits on its own            │
//! │   • start() succeeds once; later calls get AlreadyRunning               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::AlertSettings;
use crate::engine::{AlertEngine, ScanReport};
use crate::error::{AlertError, AlertResult};

// =============================================================================
// Scan Job
// =============================================================================

/// One unit of scheduled work.
#[async_trait]
pub trait ScanJob: Send + Sync {
    async fn run_scan(&self) -> AlertResult<ScanReport>;
}

#[async_trait]
impl ScanJob for AlertEngine {
    async fn run_scan(&self) -> AlertResult<ScanReport> {
        self.scan().await
    }
}

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Default)]
struct Counters {
    passes: AtomicU64,
    failures: AtomicU64,
}

/// Snapshot of scheduler activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub running: bool,
    /// Completed passes, successful or not.
    pub passes: u64,
    pub failures: u64,
}

// =============================================================================
// Scheduler
// =============================================================================

struct LoopHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

/// Owns the single background scan loop.
pub struct AlertScheduler {
    job: Arc<dyn ScanJob>,
    scan_interval: Duration,
    retry_interval: Duration,
    started: AtomicBool,
    handle: Mutex<Option<LoopHandle>>,
    counters: Arc<Counters>,
}

impl std::fmt::Debug for AlertScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertScheduler")
            .field("scan_interval", &self.scan_interval)
            .field("retry_interval", &self.retry_interval)
            .field("started", &self.started.load(Ordering::SeqCst))
            .finish()
    }
}

impl AlertScheduler {
    pub fn new(job: Arc<dyn ScanJob>, settings: &AlertSettings) -> Self {
        Self::with_intervals(job, settings.scan_interval(), settings.retry_interval())
    }

    pub fn with_intervals(job: Arc<dyn ScanJob>, scan_interval: Duration, retry_interval: Duration) -> Self {
        AlertScheduler {
            job,
            scan_interval,
            retry_interval,
            started: AtomicBool::new(false),
            handle: Mutex::new(None),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Spawns the loop. Fails with `AlreadyRunning` if it is already up.
    ///
    /// The handle slot stays locked from the flag flip until the handle is
    /// stored, so a concurrent `shutdown` always finds what it has to stop.
    /// Must be called from within a Tokio runtime.
    pub async fn start(&self) -> AlertResult<()> {
        let mut slot = self.handle.lock().await;

        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AlertError::AlreadyRunning);
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let join = tokio::spawn(run_loop(
            self.job.clone(),
            self.scan_interval,
            self.retry_interval,
            self.counters.clone(),
            shutdown_rx,
        ));

        *slot = Some(LoopHandle { shutdown_tx, join });

        info!(
            scan_interval_secs = self.scan_interval.as_secs(),
            retry_interval_secs = self.retry_interval.as_secs(),
            "Alert scheduler started"
        );
        Ok(())
    }

    /// Starts the loop unless it is already running.
    ///
    /// Returns true only for the call that actually started it.
    pub async fn ensure_started(&self) -> bool {
        match self.start().await {
            Ok(()) => true,
            Err(_) => {
                debug!("Alert scheduler already running");
                false
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.is_running(),
            passes: self.counters.passes.load(Ordering::SeqCst),
            failures: self.counters.failures.load(Ordering::SeqCst),
        }
    }

    /// Stops the loop and waits for it to exit. A pass in progress finishes
    /// first. No-op if the loop is not running.
    pub async fn shutdown(&self) -> AlertResult<()> {
        let mut slot = self.handle.lock().await;
        let Some(handle) = slot.take() else {
            return Ok(());
        };

        info!("Stopping alert scheduler");

        // A closed channel means the loop already exited
        let _ = handle.shutdown_tx.send(()).await;

        let result = handle
            .join
            .await
            .map_err(|e| AlertError::ChannelError(format!("scheduler task failed: {}", e)));

        self.started.store(false, Ordering::SeqCst);
        result
    }
}

async fn run_loop(
    job: Arc<dyn ScanJob>,
    scan_interval: Duration,
    retry_interval: Duration,
    counters: Arc<Counters>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    info!("Alert scan loop running");

    loop {
        let delay = match job.run_scan().await {
            Ok(report) => {
                debug!(
                    inserted = report.inserted(),
                    duplicates = report.duplicates,
                    "Scheduled alert scan finished"
                );
                scan_interval
            }
            Err(e) => {
                counters.failures.fetch_add(1, Ordering::SeqCst);
                error!(
                    error = %e,
                    retry_secs = retry_interval.as_secs(),
                    "Scheduled alert scan failed, retrying sooner"
                );
                retry_interval
            }
        };
        counters.passes.fetch_add(1, Ordering::SeqCst);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown_rx.recv() => {
                info!("Alert scan loop shutting down");
                break;
            }
        }
    }

    info!("Alert scan loop stopped");
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pharma_db::DbError;
    use std::sync::atomic::AtomicUsize;

    const SCAN: Duration = Duration::from_secs(300);
    const RETRY: Duration = Duration::from_secs(60);

    /// Counts calls; the first `fail_first` calls fail.
    #[derive(Default)]
    struct FakeJob {
        calls: AtomicUsize,
        fail_first: usize,
    }

    #[async_trait]
    impl ScanJob for FakeJob {
        async fn run_scan(&self) -> AlertResult<ScanReport> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(AlertError::Database(DbError::PoolExhausted));
            }
            Ok(ScanReport::default())
        }
    }

    fn scheduler(job: Arc<FakeJob>) -> AlertScheduler {
        AlertScheduler::with_intervals(job, SCAN, RETRY)
    }

    #[tokio::test(start_paused = true)]
    async fn test_scans_immediately_then_on_interval() {
        let job = Arc::new(FakeJob::default());
        let scheduler = scheduler(job.clone());
        scheduler.start().await.unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(job.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(200)).await;
        assert_eq!(job.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(job.calls.load(Ordering::SeqCst), 2);

        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_retries_sooner_and_keeps_running() {
        let job = Arc::new(FakeJob {
            fail_first: 1,
            ..FakeJob::default()
        });
        let scheduler = scheduler(job.clone());
        scheduler.start().await.unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(job.calls.load(Ordering::SeqCst), 1);

        // Retry after one minute, not five
        tokio::time::sleep(RETRY).await;
        assert_eq!(job.calls.load(Ordering::SeqCst), 2);

        // Back to the normal cadence
        tokio::time::sleep(RETRY).await;
        assert_eq!(job.calls.load(Ordering::SeqCst), 2);
        tokio::time::sleep(SCAN).await;
        assert_eq!(job.calls.load(Ordering::SeqCst), 3);

        let status = scheduler.status();
        assert!(status.running);
        assert_eq!(status.passes, 3);
        assert_eq!(status.failures, 1);

        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let job = Arc::new(FakeJob::default());
        let scheduler = Arc::new(scheduler(job));

        let mut tasks = Vec::new();
        for _ in 0..10 {
            let scheduler = scheduler.clone();
            tasks.push(tokio::spawn(async move { scheduler.ensure_started().await }));
        }

        let mut started = 0;
        for task in tasks {
            if task.await.unwrap() {
                started += 1;
            }
        }
        assert_eq!(started, 1);
        assert!(matches!(scheduler.start().await, Err(AlertError::AlreadyRunning)));

        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_the_loop() {
        let job = Arc::new(FakeJob::default());
        let scheduler = scheduler(job.clone());
        scheduler.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        scheduler.shutdown().await.unwrap();
        assert!(!scheduler.is_running());

        tokio::time::sleep(SCAN * 3).await;
        assert_eq!(job.calls.load(Ordering::SeqCst), 1);

        // Shutting down twice is harmless
        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_racing_start_stops_the_loop() {
        for _ in 0..50 {
            let scheduler = Arc::new(scheduler(Arc::new(FakeJob::default())));

            let starter = {
                let scheduler = scheduler.clone();
                tokio::spawn(async move { scheduler.start().await })
            };
            let stopper = {
                let scheduler = scheduler.clone();
                tokio::spawn(async move {
                    // Stop as soon as the running flag is visible
                    while !scheduler.is_running() {
                        tokio::task::yield_now().await;
                    }
                    scheduler.shutdown().await
                })
            };

            starter.await.unwrap().unwrap();
            stopper.await.unwrap().unwrap();

            assert!(!scheduler.is_running());
            assert!(scheduler.handle.lock().await.is_none());
        }
    }
}
