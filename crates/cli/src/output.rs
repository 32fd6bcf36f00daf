use crate::error::CliError;
use engine_config::report::summary::{ItemStatus, RunReport};
use std::fmt::Write;

pub async fn write_report(report: &RunReport, path: &str) -> Result<(), CliError> {
    let report_json = report.to_json()?;
    tokio::fs::write(path, report_json).await?;
    Ok(())
}

pub fn print_report(report: &RunReport) {
    println!("{}", render_report(report));
}

pub fn render_report(report: &RunReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Migration run '{}'", report.run_id);
    let _ = writeln!(
        out,
        "{:<24} {:<10} {:>8} {:>9} {:>7} {:>10}  {}",
        "User", "Status", "Fetched", "Inserted", "Failed", "Duration", "Error"
    );
    let _ = writeln!(out, "{}", "-".repeat(80));

    for item in &report.items {
        let _ = writeln!(
            out,
            "{:<24} {:<10} {:>8} {:>9} {:>7} {:>8}ms  {}",
            item.user_id,
            item.status.as_str(),
            item.fetched,
            item.inserted,
            item.failed,
            item.duration_ms,
            item.error.as_deref().unwrap_or("")
        );
    }

    let _ = writeln!(out, "{}", "-".repeat(80));
    let _ = writeln!(
        out,
        "{:<24} {:<10} {:>8} {:>9} {:>7} {:>8}ms",
        format!("Total ({} users)", report.total_users),
        "",
        report.total_fetched,
        report.total_inserted,
        report.total_failed,
        report.duration().as_millis()
    );
    let _ = writeln!(
        out,
        "Completed: {}, skipped: {}, errors: {}, retries: {}",
        report.count(ItemStatus::Completed),
        report.count(ItemStatus::Skipped),
        report.count(ItemStatus::Error),
        report.metrics.retry_count
    );

    let mut failures = report.failures().peekable();
    if failures.peek().is_some() {
        let _ = writeln!(out, "\nFailed records:");
        for failure in failures {
            let _ = writeln!(
                out,
                "  {} / {} (#{}): {}",
                failure.user_id, failure.record_id, failure.row_index, failure.error
            );
        }
    }

    if report.cancelled {
        let _ = writeln!(out, "\nRun was cancelled before all records were attempted.");
    }

    out
}
