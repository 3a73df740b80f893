use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, error, info};

use crate::args::HttpMethod;
use crate::error::{AppError, AppResult};
use crate::http::{RequestExecutor, WorkerContext};
use crate::metrics::{Reporter, ReporterConfig, ReportSummary, StatsAggregator, StatsSnapshot};
use crate::shutdown::{ShutdownReceiver, ShutdownSender, shutdown_requested};

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub worker_num: u64,
    pub batch_size: u64,
    pub target: Url,
    pub method: HttpMethod,
}

impl PoolConfig {
    #[must_use]
    pub const fn total_expected(&self) -> u64 {
        self.worker_num.saturating_mul(self.batch_size)
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub snapshot: StatsSnapshot,
    /// `None` when the reporter was disabled (nothing expected).
    pub report: Option<ReportSummary>,
    /// A shutdown request cut at least one batch short.
    pub interrupted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerExit {
    Completed,
    Interrupted,
}

/// Marks a worker started on creation and stopped on drop, so an aborted
/// worker still leaves `started == stopped` behind.
struct WorkerGuard<'stats> {
    stats: &'stats StatsAggregator,
    worker_id: u64,
}

impl<'stats> WorkerGuard<'stats> {
    fn start(stats: &'stats StatsAggregator, worker_id: u64) -> Self {
        stats.report_worker_started();
        debug!("Worker {} started", worker_id);
        Self { stats, worker_id }
    }
}

impl Drop for WorkerGuard<'_> {
    fn drop(&mut self) {
        self.stats.report_worker_stopped();
        debug!("Worker {} stopped", self.worker_id);
    }
}

pub struct WorkerPool {
    executor: RequestExecutor,
    stats: Arc<StatsAggregator>,
    reporter: ReporterConfig,
}

impl WorkerPool {
    #[must_use]
    pub const fn new(
        executor: RequestExecutor,
        stats: Arc<StatsAggregator>,
        reporter: ReporterConfig,
    ) -> Self {
        Self {
            executor,
            stats,
            reporter,
        }
    }

    /// Runs every worker to completion (or shutdown), then stops the
    /// reporter and waits for its summary.
    ///
    /// # Errors
    ///
    /// Returns the first fatal worker error once the reporter has flushed,
    /// or an error when the stats log cannot be written.
    pub async fn run(self, config: &PoolConfig, shutdown_tx: &ShutdownSender) -> AppResult<RunReport> {
        let total_expected = config.total_expected();
        let reporter = Reporter::new(Arc::clone(&self.stats), self.reporter)
            .start(total_expected)
            .await?;
        info!(
            "Starting {} workers x {} requests against {} {}",
            config.worker_num, config.batch_size, config.method, config.target
        );

        let mut handles =
            Vec::with_capacity(usize::try_from(config.worker_num).unwrap_or_default());
        for worker_id in 1..=config.worker_num {
            let worker = WorkerContext {
                worker_id,
                batch_size: config.batch_size,
                target: config.target.clone(),
                method: config.method.clone(),
            };
            handles.push(tokio::spawn(run_worker(
                worker,
                self.executor.clone(),
                Arc::clone(&self.stats),
                shutdown_tx.subscribe(),
                shutdown_tx.clone(),
            )));
        }

        let mut first_error: Option<AppError> = None;
        let mut interrupted = false;
        for handle in handles {
            match handle.await {
                Ok(Ok(WorkerExit::Completed)) => {}
                Ok(Ok(WorkerExit::Interrupted)) => interrupted = true,
                Ok(Err(err)) => {
                    if first_error.is_none() {
                        error!("Worker aborted: {}", err);
                        first_error = Some(err);
                    }
                }
                Err(err) => {
                    if first_error.is_none() {
                        error!("Worker task failed: {}", err);
                        first_error = Some(AppError::from(err));
                    }
                }
            }
        }

        reporter.stop();
        let report = reporter.wait().await?;
        if let Some(err) = first_error {
            return Err(err);
        }

        let snapshot = self.stats.snapshot();
        info!(
            "Run finished: {} success, {} failed",
            snapshot.total_success, snapshot.total_failed
        );
        Ok(RunReport {
            snapshot,
            report,
            interrupted,
        })
    }
}

async fn run_worker(
    worker: WorkerContext,
    executor: RequestExecutor,
    stats: Arc<StatsAggregator>,
    mut shutdown_rx: ShutdownReceiver,
    shutdown_tx: ShutdownSender,
) -> AppResult<WorkerExit> {
    let _guard = WorkerGuard::start(&stats, worker.worker_id);
    for batch_index in 0..worker.batch_size {
        if shutdown_requested(&mut shutdown_rx) {
            debug!(
                "Worker {} interrupted after {} requests",
                worker.worker_id, batch_index
            );
            return Ok(WorkerExit::Interrupted);
        }
        if let Err(err) = executor.execute(batch_index, &worker).await {
            drop(shutdown_tx.send(()));
            return Err(err);
        }
    }
    Ok(WorkerExit::Completed)
}
