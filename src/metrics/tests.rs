use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, TimeZone};

use super::reporter::format::{
    format_percent, format_row, format_summary, log_file_name, percent_x100,
};
use super::*;
use crate::error::{AppError, AppResult};

fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::metrics(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

fn reporter_config(dir: &Path, tick_ms: u64) -> ReporterConfig {
    ReporterConfig {
        tick_interval: Duration::from_millis(tick_ms),
        log_dir: dir.to_path_buf(),
        invocation: vec!["swvbench".to_owned(), "-w".to_owned(), "2".to_owned()],
    }
}

fn log_entries(dir: &Path) -> AppResult<Vec<std::path::PathBuf>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        entries.push(entry?.path());
    }
    Ok(entries)
}

fn single_log(dir: &Path) -> AppResult<String> {
    let entries = log_entries(dir)?;
    match entries.as_slice() {
        [path] => Ok(std::fs::read_to_string(path)?),
        _ => Err(AppError::metrics(format!(
            "Expected exactly one log file, found {}",
            entries.len()
        ))),
    }
}

#[test]
fn concurrent_reports_sum_exactly() -> AppResult<()> {
    let stats = StatsAggregator::new();
    std::thread::scope(|scope| {
        for worker in 0..50_u32 {
            let stats = &stats;
            scope.spawn(move || {
                for _ in 0..1000 {
                    if worker % 2 == 0 {
                        stats.report_success();
                    } else {
                        stats.report_failed("Status code 503 unavailable");
                    }
                }
            });
        }
    });

    let snapshot = stats.snapshot();
    if snapshot.total_success != 25_000 || snapshot.total_failed != 25_000 {
        return Err(AppError::metrics(format!(
            "Unexpected totals: {:?}",
            snapshot
        )));
    }
    if snapshot.completed() != 50_000 {
        return Err(AppError::metrics("Expected 50000 completed requests"));
    }
    let histogram = stats.error_histogram();
    if histogram
        != vec![ErrorCount {
            message: "Status code 503 unavailable".to_owned(),
            count: 25_000,
        }]
    {
        return Err(AppError::metrics(format!(
            "Unexpected histogram: {:?}",
            histogram
        )));
    }
    Ok(())
}

#[test]
fn clear_tick_keeps_lifetime_totals() -> AppResult<()> {
    let stats = StatsAggregator::new();
    for _ in 0..5 {
        stats.report_success();
    }
    stats.report_failed("refused");
    stats.clear_tick();
    stats.report_success();
    stats.clear_tick();
    stats.clear_tick();

    let snapshot = stats.snapshot();
    if snapshot.tick_success != 0 || snapshot.tick_failed != 0 {
        return Err(AppError::metrics("Expected tick counters to be cleared"));
    }
    if snapshot.total_success != 6 || snapshot.total_failed != 1 {
        return Err(AppError::metrics(format!(
            "Lifetime totals changed: {:?}",
            snapshot
        )));
    }
    if snapshot.max_tick_success != 5 {
        return Err(AppError::metrics(format!(
            "Expected max tick success 5, got {}",
            snapshot.max_tick_success
        )));
    }
    Ok(())
}

#[test]
fn trimmed_messages_share_an_entry() -> AppResult<()> {
    let stats = StatsAggregator::new();
    stats.report_failed("  timeout  ");
    stats.report_failed("timeout");
    stats.report_failed("timeout\n");
    stats.report_failed("refused");

    let histogram = stats.error_histogram();
    let expected = vec![
        ErrorCount {
            message: "timeout".to_owned(),
            count: 3,
        },
        ErrorCount {
            message: "refused".to_owned(),
            count: 1,
        },
    ];
    if histogram != expected {
        return Err(AppError::metrics(format!(
            "Unexpected histogram: {:?}",
            histogram
        )));
    }
    Ok(())
}

#[test]
fn histogram_ties_are_ordered_by_message() -> AppResult<()> {
    let stats = StatsAggregator::new();
    stats.report_failed("b");
    stats.report_failed("a");
    let messages: Vec<String> = stats
        .error_histogram()
        .into_iter()
        .map(|entry| entry.message)
        .collect();
    if messages != ["a", "b"] {
        return Err(AppError::metrics(format!(
            "Unexpected order: {:?}",
            messages
        )));
    }
    Ok(())
}

#[test]
fn reset_all_clears_counters_and_histogram() -> AppResult<()> {
    let stats = StatsAggregator::new();
    stats.report_worker_started();
    stats.report_success();
    stats.report_failed("boom");
    stats.clear_tick();
    stats.report_worker_stopped();
    stats.reset_all();

    if stats.snapshot() != StatsSnapshot::default() {
        return Err(AppError::metrics(format!(
            "Expected zeroed snapshot, got {:?}",
            stats.snapshot()
        )));
    }
    if !stats.error_histogram().is_empty() {
        return Err(AppError::metrics("Expected empty histogram"));
    }
    Ok(())
}

#[test]
fn snapshot_invariants_hold_while_writers_run() -> AppResult<()> {
    let stats = StatsAggregator::new();
    let violation = std::thread::scope(|scope| {
        for _ in 0..8 {
            let stats = &stats;
            scope.spawn(move || {
                stats.report_worker_started();
                for step in 0..2000_u32 {
                    if step % 3 == 0 {
                        stats.report_failed("flaky");
                    } else {
                        stats.report_success();
                    }
                }
                stats.report_worker_stopped();
            });
        }
        let reader = scope.spawn(|| {
            for _ in 0..2000 {
                let snapshot = stats.snapshot();
                if snapshot.total_success < snapshot.tick_success
                    || snapshot.total_failed < snapshot.tick_failed
                    || snapshot.started < snapshot.stopped
                {
                    return Some(snapshot);
                }
                stats.clear_tick();
            }
            None
        });
        reader.join().ok().flatten()
    });

    if let Some(snapshot) = violation {
        return Err(AppError::metrics(format!(
            "Snapshot invariant violated: {:?}",
            snapshot
        )));
    }
    let snapshot = stats.snapshot();
    if snapshot.started != 8 || snapshot.stopped != 8 || snapshot.running() != 0 {
        return Err(AppError::metrics(format!(
            "Unexpected worker counts: {:?}",
            snapshot
        )));
    }
    Ok(())
}

#[test]
fn sequence_values_are_unique_under_contention() -> AppResult<()> {
    let sequence = SequenceGenerator::new();
    let batches: Vec<Vec<u64>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let sequence = &sequence;
                scope.spawn(move || (0..5000).map(|_| sequence.next()).collect::<Vec<u64>>())
            })
            .collect();
        handles
            .into_iter()
            .filter_map(|handle| handle.join().ok())
            .collect()
    });

    let mut seen = HashSet::new();
    for batch in &batches {
        let mut previous = 0;
        for value in batch {
            if *value <= previous {
                return Err(AppError::metrics("Sequence went backwards in one thread"));
            }
            previous = *value;
            if !seen.insert(*value) {
                return Err(AppError::metrics(format!("Duplicate sequence {}", value)));
            }
        }
    }
    if seen.len() != 80_000 || sequence.last() != 80_000 {
        return Err(AppError::metrics(format!(
            "Expected 80000 values, got {} (last {})",
            seen.len(),
            sequence.last()
        )));
    }
    if !seen.contains(&1) {
        return Err(AppError::metrics("Expected the first value to be 1"));
    }
    Ok(())
}

#[test]
fn reporter_with_zero_total_is_a_no_op() -> AppResult<()> {
    run_async_test(async {
        let dir = tempfile::tempdir()?;
        let stats = Arc::new(StatsAggregator::new());
        let handle = Reporter::new(stats, reporter_config(dir.path(), 10))
            .start(0)
            .await?;
        if handle.state() != ReporterState::Idle {
            return Err(AppError::metrics("Expected idle reporter"));
        }
        handle.stop();
        if handle.wait().await?.is_some() {
            return Err(AppError::metrics("Expected no summary"));
        }
        if !log_entries(dir.path())?.is_empty() {
            return Err(AppError::metrics("Expected no log file"));
        }
        Ok(())
    })
}

#[test]
fn stop_before_first_tick_writes_zero_summary() -> AppResult<()> {
    run_async_test(async {
        let dir = tempfile::tempdir()?;
        let stats = Arc::new(StatsAggregator::new());
        let handle = Reporter::new(stats, reporter_config(dir.path(), 60_000))
            .start(10)
            .await?;
        if handle.state() != ReporterState::Running {
            return Err(AppError::metrics("Expected running reporter"));
        }
        handle.stop();
        handle.stop();
        let summary = tokio::time::timeout(Duration::from_secs(5), handle.wait())
            .await
            .map_err(|_elapsed| AppError::metrics("Reporter did not stop"))??
            .ok_or_else(|| AppError::metrics("Expected a summary"))?;

        if summary.total_success != 0 || summary.total_failed != 0 || summary.max_qps != 0 {
            return Err(AppError::metrics(format!(
                "Expected zero summary: {:?}",
                summary
            )));
        }
        if summary.elapsed != Duration::from_secs(1) {
            return Err(AppError::metrics("Expected elapsed floor of one second"));
        }
        let log = single_log(dir.path())?;
        if !log.contains("0 success, 0 failed. 0 avg qps, 0 max qps") {
            return Err(AppError::metrics(format!("Missing summary in log: {}", log)));
        }
        if log.contains("Error messages statistics:") {
            return Err(AppError::metrics("Expected no error section"));
        }
        Ok(())
    })
}

#[test]
fn reporter_writes_rows_and_histogram() -> AppResult<()> {
    run_async_test(async {
        let dir = tempfile::tempdir()?;
        let stats = Arc::new(StatsAggregator::new());
        let handle = Reporter::new(Arc::clone(&stats), reporter_config(dir.path(), 20))
            .start(8)
            .await?;

        stats.report_worker_started();
        stats.report_success();
        stats.report_success();
        stats.report_success();
        stats.report_failed(" Status code 500 boom ");
        stats.report_worker_stopped();
        tokio::time::sleep(Duration::from_millis(70)).await;
        handle.stop();
        let summary = handle
            .wait()
            .await?
            .ok_or_else(|| AppError::metrics("Expected a summary"))?;

        if summary.total_success != 3 || summary.total_failed != 1 {
            return Err(AppError::metrics(format!(
                "Unexpected summary: {:?}",
                summary
            )));
        }
        if summary.ticks < 2 {
            return Err(AppError::metrics(format!(
                "Expected at least two ticks, got {}",
                summary.ticks
            )));
        }

        let log = single_log(dir.path())?;
        let mut lines = log.lines();
        let header = lines.next().unwrap_or_default();
        if !header.starts_with("Started at ") || !header.ends_with("Tick duration is 20ms") {
            return Err(AppError::metrics(format!("Unexpected header: {}", header)));
        }
        if lines.next() != Some("Arguments:") || lines.next() != Some("swvbench -w 2") {
            return Err(AppError::metrics("Expected argument block"));
        }
        if !log.contains("(50.00%)") {
            return Err(AppError::metrics(format!("Expected 50% row: {}", log)));
        }
        if !log.contains("3 success, 1 failed.") {
            return Err(AppError::metrics("Missing totals line"));
        }
        if !log.contains("Error messages statistics:")
            || !log.contains("1        | Status code 500 boom")
        {
            return Err(AppError::metrics(format!("Missing histogram: {}", log)));
        }
        Ok(())
    })
}

#[test]
fn stop_signal_works_from_another_thread() -> AppResult<()> {
    run_async_test(async {
        let dir = tempfile::tempdir()?;
        let stats = Arc::new(StatsAggregator::new());
        let handle = Reporter::new(stats, reporter_config(dir.path(), 10))
            .start(1)
            .await?;
        let signal = handle.stop_signal();
        std::thread::spawn(move || signal.stop())
            .join()
            .map_err(|_panic| AppError::metrics("Stop thread panicked"))?;
        let summary = tokio::time::timeout(Duration::from_secs(5), handle.wait())
            .await
            .map_err(|_elapsed| AppError::metrics("Reporter did not stop"))??;
        if summary.is_none() {
            return Err(AppError::metrics("Expected a summary"));
        }
        Ok(())
    })
}

#[test]
fn percent_rounds_half_up() -> AppResult<()> {
    let cases = [
        (1, 3, 3333, "33.33%"),
        (2, 3, 6667, "66.67%"),
        (5, 5, 10_000, "100.00%"),
        (0, 7, 0, "0.00%"),
        (3, 0, 0, "0.00%"),
    ];
    for (part, whole, expected, text) in cases {
        let value = percent_x100(part, whole);
        if value != expected || format_percent(value) != text {
            return Err(AppError::metrics(format!(
                "percent({}, {}) = {} ({})",
                part,
                whole,
                value,
                format_percent(value)
            )));
        }
    }
    Ok(())
}

#[test]
fn log_name_uses_timestamp_pattern() -> AppResult<()> {
    let started = Local
        .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
        .single()
        .ok_or_else(|| AppError::metrics("Ambiguous local time"))?;
    let name = log_file_name(&started);
    if name != "stat-2024-03-09_07_05_01.log" {
        return Err(AppError::metrics(format!("Unexpected log name {}", name)));
    }
    Ok(())
}

#[test]
fn row_reports_remaining_and_running() -> AppResult<()> {
    let snapshot = StatsSnapshot {
        tick_success: 4,
        tick_failed: 1,
        total_success: 6,
        total_failed: 2,
        max_tick_success: 4,
        started: 3,
        stopped: 1,
    };
    let row = format_row(7, &snapshot, 10);
    let expected = "7        4        1        3        2        6        2       (80.00%)\n";
    if row != expected {
        return Err(AppError::metrics(format!("Unexpected row: {:?}", row)));
    }
    Ok(())
}

#[test]
fn summary_omits_empty_histogram() -> AppResult<()> {
    let now = Local::now();
    let mut summary = ReportSummary {
        log_path: "stat.log".into(),
        started_at: now,
        stopped_at: now,
        elapsed: Duration::from_secs(2),
        ticks: 2,
        total_success: 10,
        total_failed: 0,
        avg_qps: 5,
        max_qps: 6,
        errors: Vec::new(),
    };
    let text = format_summary(&summary);
    if text.contains("Error messages statistics:") {
        return Err(AppError::metrics("Expected no histogram section"));
    }
    if !text.contains("10 success, 0 failed. 5 avg qps, 6 max qps") {
        return Err(AppError::metrics(format!("Unexpected summary: {}", text)));
    }

    summary.errors.push(ErrorCount {
        message: "refused".to_owned(),
        count: 2,
    });
    let text = format_summary(&summary);
    if !text.ends_with("Count    | Message\n2        | refused\n") {
        return Err(AppError::metrics(format!("Unexpected histogram: {}", text)));
    }
    Ok(())
}
