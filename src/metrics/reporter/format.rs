use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Local};

use super::super::types::{ReportSummary, StatsSnapshot};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %:z";

pub(crate) fn log_file_name(started: &DateTime<Local>) -> String {
    format!("stat-{}.log", started.format("%Y-%m-%d_%H_%M_%S"))
}

pub(crate) fn format_header(
    started: &DateTime<Local>,
    tick_interval: Duration,
    invocation: &[String],
) -> String {
    format!(
        "Started at {} (Unix {}). Tick duration is {}ms\nArguments:\n{}\n{:<8} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8}\n",
        started.format(TIME_FORMAT),
        started.timestamp(),
        tick_interval.as_millis(),
        invocation.join(" "),
        "Tick",
        "ReqSucc",
        "ReqFail",
        "Started",
        "Running",
        "TotSucc",
        "Remain"
    )
}

pub(crate) fn format_row(tick: u64, snapshot: &StatsSnapshot, total_expected: u64) -> String {
    let completed = snapshot.completed();
    let remain = total_expected.saturating_sub(completed);
    format!(
        "{:<8} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8}({})\n",
        tick,
        snapshot.tick_success,
        snapshot.tick_failed,
        snapshot.started,
        snapshot.running(),
        snapshot.total_success,
        remain,
        format_percent(percent_x100(completed, total_expected))
    )
}

pub(crate) fn format_summary(summary: &ReportSummary) -> String {
    let mut output = String::new();
    drop(writeln!(
        output,
        "Stopped at {} (Unix {}). Elapsed {}s",
        summary.stopped_at.format(TIME_FORMAT),
        summary.stopped_at.timestamp(),
        summary.elapsed.as_secs()
    ));
    drop(writeln!(output, "Summary:"));
    drop(writeln!(
        output,
        "{} success, {} failed. {} avg qps, {} max qps",
        summary.total_success, summary.total_failed, summary.avg_qps, summary.max_qps
    ));
    if !summary.errors.is_empty() {
        drop(writeln!(output, "Error messages statistics:"));
        drop(writeln!(output, "{:<8} | Message", "Count"));
        for entry in &summary.errors {
            drop(writeln!(output, "{:<8} | {}", entry.count, entry.message));
        }
    }
    output
}

/// `part / whole` in hundredths of a percent, rounded half up.
pub(crate) fn percent_x100(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        return 0;
    }
    let whole = u128::from(whole);
    let scaled = u128::from(part)
        .saturating_mul(10_000)
        .saturating_add(whole.checked_div(2).unwrap_or(0))
        .checked_div(whole)
        .unwrap_or(0);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

pub(crate) fn format_percent(value_x100: u64) -> String {
    let whole = value_x100.checked_div(100).unwrap_or(0);
    let fraction = value_x100.checked_rem(100).unwrap_or(0);
    format!("{whole}.{fraction:02}%")
}
