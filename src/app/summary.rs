use super::pool::RunReport;

/// How many histogram entries the console summary shows.
const TOP_ERRORS: usize = 5;

pub fn summary_lines(run: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();
    if run.interrupted {
        lines.push("Interrupted: workers stopped before finishing their batches.".to_owned());
    }
    lines.push(format!(
        "Requests: {} success, {} failed",
        run.snapshot.total_success, run.snapshot.total_failed
    ));

    let Some(report) = run.report.as_ref() else {
        return lines;
    };
    lines.push(format!("Elapsed: {}s", report.elapsed.as_secs()));
    lines.push(format!(
        "Throughput: {} avg qps, {} max qps",
        report.avg_qps, report.max_qps
    ));
    lines.push(format!("Stats log: {}", report.log_path.display()));
    if !report.errors.is_empty() {
        lines.push(format!(
            "Errors ({} distinct, top {} shown):",
            report.errors.len(),
            report.errors.len().min(TOP_ERRORS)
        ));
        for entry in report.errors.iter().take(TOP_ERRORS) {
            lines.push(format!("  {:<8} {}", entry.count, entry.message));
        }
    }
    lines
}

pub fn print_summary(run: &RunReport) {
    for line in summary_lines(run) {
        println!("{}", line);
    }
}
