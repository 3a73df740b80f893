use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use super::types::{ErrorCount, StatsSnapshot};

/// Shared counter bank written by every worker and read by the reporter.
///
/// Numeric counters are lock-free. The error histogram needs a
/// lookup-then-increment keyed by message and sits behind its own mutex,
/// which is never taken together with anything else.
///
/// Writers bump the lifetime counter before the tick counter and `started`
/// before `stopped`; [`StatsAggregator::snapshot`] reads in the opposite
/// order, so a snapshot always has `total >= tick` and `started >= stopped`.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    tick_success: AtomicU64,
    tick_failed: AtomicU64,
    total_success: AtomicU64,
    total_failed: AtomicU64,
    max_tick_success: AtomicU64,
    started: AtomicU64,
    stopped: AtomicU64,
    errors: Mutex<HashMap<String, u64>>,
}

impl StatsAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report_success(&self) {
        self.total_success.fetch_add(1, Ordering::AcqRel);
        self.tick_success.fetch_add(1, Ordering::AcqRel);
    }

    /// Counts a failure and files `message` (trimmed) in the error histogram.
    pub fn report_failed(&self, message: &str) {
        self.total_failed.fetch_add(1, Ordering::AcqRel);
        self.tick_failed.fetch_add(1, Ordering::AcqRel);

        let key = message.trim();
        let mut errors = self.errors.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(count) = errors.get_mut(key) {
            *count = count.saturating_add(1);
        } else {
            errors.insert(key.to_owned(), 1);
        }
    }

    pub fn report_worker_started(&self) {
        self.started.fetch_add(1, Ordering::AcqRel);
    }

    pub fn report_worker_stopped(&self) {
        self.stopped.fetch_add(1, Ordering::AcqRel);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let tick_success = self.tick_success.load(Ordering::Acquire);
        let tick_failed = self.tick_failed.load(Ordering::Acquire);
        let stopped = self.stopped.load(Ordering::Acquire);
        StatsSnapshot {
            tick_success,
            tick_failed,
            total_success: self.total_success.load(Ordering::Acquire),
            total_failed: self.total_failed.load(Ordering::Acquire),
            max_tick_success: self.max_tick_success.load(Ordering::Acquire),
            started: self.started.load(Ordering::Acquire),
            stopped,
        }
    }

    /// Starts a new tick: folds the outgoing success count into the per-tick
    /// maximum and zeroes both tick counters. Lifetime totals are untouched.
    pub fn clear_tick(&self) {
        let success = self.tick_success.swap(0, Ordering::AcqRel);
        self.tick_failed.store(0, Ordering::Release);
        self.max_tick_success.fetch_max(success, Ordering::AcqRel);
    }

    /// Zeroes every counter and empties the error histogram.
    pub fn reset_all(&self) {
        self.tick_success.store(0, Ordering::Release);
        self.tick_failed.store(0, Ordering::Release);
        self.total_success.store(0, Ordering::Release);
        self.total_failed.store(0, Ordering::Release);
        self.max_tick_success.store(0, Ordering::Release);
        self.started.store(0, Ordering::Release);
        self.stopped.store(0, Ordering::Release);
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Distinct error messages, most frequent first (ties by message).
    #[must_use]
    pub fn error_histogram(&self) -> Vec<ErrorCount> {
        let mut entries: Vec<ErrorCount> = self
            .errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(message, count)| ErrorCount {
                message: message.clone(),
                count: *count,
            })
            .collect();
        entries.sort_by(|left, right| {
            right
                .count
                .cmp(&left.count)
                .then_with(|| left.message.cmp(&right.message))
        });
        entries
    }
}
