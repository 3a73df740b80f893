//! Tick-driven statistics log (`stat-<timestamp>.log`).
//!
//! The reporter moves through `Idle -> Running -> Stopped`. Each tick it
//! snapshots the aggregator, appends one row, and clears the tick counters.
//! A stop request is only a flag plus a timestamp; the loop notices it after
//! the row in flight is written and then appends the trailing summary.
pub(crate) mod format;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::error::{AppError, AppResult, MetricsError};

use super::stats::StatsAggregator;
use super::types::ReportSummary;

use format::{format_header, format_row, format_summary, log_file_name};

const STATE_IDLE: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_STOPPED: u8 = 2;

#[derive(Debug, Clone)]
pub struct ReporterConfig {
    pub tick_interval: Duration,
    pub log_dir: PathBuf,
    /// Full command line, echoed into the log header.
    pub invocation: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy)]
struct Timestamp {
    instant: Instant,
    wall: DateTime<Local>,
}

impl Timestamp {
    fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall: Local::now(),
        }
    }
}

#[derive(Debug)]
struct ReporterControl {
    state: AtomicU8,
    stop_requested: AtomicBool,
    stopped_at: OnceLock<Timestamp>,
    wake: Notify,
}

impl ReporterControl {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(STATE_IDLE),
            stop_requested: AtomicBool::new(false),
            stopped_at: OnceLock::new(),
            wake: Notify::new(),
        }
    }

    fn request_stop(&self) {
        // First stop wins; later calls keep the first end time.
        drop(self.stopped_at.set(Timestamp::now()));
        self.stop_requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    fn set_state(&self, state: u8) {
        self.state.store(state, Ordering::Release);
    }

    fn state(&self) -> ReporterState {
        match self.state.load(Ordering::Acquire) {
            STATE_RUNNING => ReporterState::Running,
            STATE_STOPPED => ReporterState::Stopped,
            _ => ReporterState::Idle,
        }
    }
}

/// Cloneable stop trigger that can be handed to other threads.
#[derive(Debug, Clone)]
pub struct StopSignal {
    control: Arc<ReporterControl>,
}

impl StopSignal {
    /// Records a stop request and returns immediately.
    pub fn stop(&self) {
        self.control.request_stop();
    }
}

pub struct Reporter {
    stats: Arc<StatsAggregator>,
    config: ReporterConfig,
}

impl Reporter {
    #[must_use]
    pub const fn new(stats: Arc<StatsAggregator>, config: ReporterConfig) -> Self {
        Self { stats, config }
    }

    /// Opens the log, writes its header, and spawns the tick loop.
    ///
    /// With `total_expected == 0` nothing is written and no task is spawned;
    /// the returned handle stays `Idle` and `wait` yields `None`.
    ///
    /// # Errors
    ///
    /// Returns an error when the log file cannot be created or written.
    pub async fn start(self, total_expected: u64) -> AppResult<ReporterHandle> {
        let control = Arc::new(ReporterControl::new());
        if total_expected == 0 {
            debug!("No expected request volume; statistics log disabled.");
            return Ok(ReporterHandle {
                control,
                task: None,
            });
        }

        let started = Timestamp::now();
        let path = self.config.log_dir.join(log_file_name(&started.wall));
        let file = File::create(&path).await.map_err(|err| {
            AppError::metrics(MetricsError::CreateLog {
                path: path.clone(),
                source: err,
            })
        })?;
        let mut log = StatLog {
            path,
            writer: BufWriter::new(file),
        };
        log.append(&format_header(
            &started.wall,
            self.config.tick_interval,
            &self.config.invocation,
        ))
        .await?;
        info!("Writing statistics to {}", log.path.display());

        control.set_state(STATE_RUNNING);
        let task = tokio::spawn(run_ticks(
            self.stats,
            self.config.tick_interval,
            total_expected,
            started,
            log,
            Arc::clone(&control),
        ));

        Ok(ReporterHandle {
            control,
            task: Some(task),
        })
    }
}

pub struct ReporterHandle {
    control: Arc<ReporterControl>,
    task: Option<JoinHandle<AppResult<ReportSummary>>>,
}

impl ReporterHandle {
    /// Records a stop request and returns immediately; never blocks.
    pub fn stop(&self) {
        self.control.request_stop();
    }

    #[must_use]
    pub fn stop_signal(&self) -> StopSignal {
        StopSignal {
            control: Arc::clone(&self.control),
        }
    }

    #[must_use]
    pub fn state(&self) -> ReporterState {
        self.control.state()
    }

    /// Waits for the trailing summary to be flushed.
    ///
    /// # Errors
    ///
    /// Returns an error when the log could not be written or the task panicked.
    pub async fn wait(self) -> AppResult<Option<ReportSummary>> {
        match self.task {
            Some(task) => Ok(Some(task.await??)),
            None => Ok(None),
        }
    }
}

struct StatLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl StatLog {
    async fn append(&mut self, text: &str) -> AppResult<()> {
        self.writer
            .write_all(text.as_bytes())
            .await
            .map_err(|err| self.write_error(err))?;
        self.writer.flush().await.map_err(|err| self.write_error(err))
    }

    fn write_error(&self, source: std::io::Error) -> AppError {
        AppError::metrics(MetricsError::WriteLog {
            path: self.path.clone(),
            source,
        })
    }
}

async fn run_ticks(
    stats: Arc<StatsAggregator>,
    tick_interval: Duration,
    total_expected: u64,
    started: Timestamp,
    mut log: StatLog,
    control: Arc<ReporterControl>,
) -> AppResult<ReportSummary> {
    let mut ticker = interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            () = control.wake.notified() => {}
        }
        let snapshot = stats.snapshot();
        log.append(&format_row(tick, &snapshot, total_expected))
            .await?;
        stats.clear_tick();
        tick = tick.saturating_add(1);

        if control.stop_requested() {
            break;
        }
    }

    let stopped = control
        .stopped_at
        .get()
        .copied()
        .unwrap_or_else(Timestamp::now);
    let snapshot = stats.snapshot();
    let elapsed_secs = stopped
        .instant
        .saturating_duration_since(started.instant)
        .as_secs()
        .max(1);
    let tick_ms = u64::try_from(tick_interval.as_millis())
        .unwrap_or(u64::MAX)
        .max(1);
    let summary = ReportSummary {
        log_path: log.path.clone(),
        started_at: started.wall,
        stopped_at: stopped.wall,
        elapsed: Duration::from_secs(elapsed_secs),
        ticks: tick,
        total_success: snapshot.total_success,
        total_failed: snapshot.total_failed,
        avg_qps: snapshot
            .total_success
            .checked_div(elapsed_secs)
            .unwrap_or(0),
        max_qps: snapshot
            .max_tick_success
            .saturating_mul(1000)
            .checked_div(tick_ms)
            .unwrap_or(0),
        errors: stats.error_histogram(),
    };
    log.append(&format_summary(&summary)).await?;
    control.set_state(STATE_STOPPED);
    debug!("Statistics log closed after {} ticks", summary.ticks);

    Ok(summary)
}
