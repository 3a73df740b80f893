use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};

/// Point-in-time view of the counters. Fields are read one by one, so values
/// from concurrent writers may be skewed by a few requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub tick_success: u64,
    pub tick_failed: u64,
    pub total_success: u64,
    pub total_failed: u64,
    pub max_tick_success: u64,
    pub started: u64,
    pub stopped: u64,
}

impl StatsSnapshot {
    /// Workers that reported started but not yet stopped.
    #[must_use]
    pub const fn running(&self) -> u64 {
        self.started.saturating_sub(self.stopped)
    }

    #[must_use]
    pub const fn completed(&self) -> u64 {
        self.total_success.saturating_add(self.total_failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCount {
    pub message: String,
    pub count: u64,
}

/// Trailing summary written by the reporter when it stops.
#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub log_path: PathBuf,
    pub started_at: DateTime<Local>,
    pub stopped_at: DateTime<Local>,
    /// Whole seconds, never below one.
    pub elapsed: Duration,
    pub ticks: u64,
    pub total_success: u64,
    pub total_failed: u64,
    pub avg_qps: u64,
    pub max_qps: u64,
    pub errors: Vec<ErrorCount>,
}
