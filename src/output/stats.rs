//! Run summaries printed at the end of each stage

use crate::assets::DownloadSummary;
use crate::listing::ExportSummary;
use crate::pipeline::TaskFailure;
use crate::FailureClass;
use std::collections::HashMap;

/// Failures listed individually before the rest are elided
const MAX_LISTED_FAILURES: usize = 20;

/// Percentage of `part` in `total`, 0 when there is nothing to count
pub fn success_rate(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Prints the export summary to stdout
pub fn print_export_summary(summary: &ExportSummary) {
    println!("=== Listing Export ===\n");
    println!("  Listings enumerated: {}", summary.listing_count);
    println!("  Rows written: {}", summary.row_count);
    println!("  Failed: {}", summary.failure_count);
    println!("  Table: {}", summary.output_path.display());
    println!("  Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    print_failures(&summary.failures, &summary.failures_by_class);

    println!(
        "Success Rate: {:.1}% ({} / {} listings exported)",
        success_rate(summary.row_count, summary.listing_count),
        summary.row_count,
        summary.listing_count
    );
}

/// Prints the image download summary to stdout
pub fn print_download_summary(summary: &DownloadSummary) {
    println!("=== Image Download ===\n");
    println!("  Table rows: {}", summary.row_count);
    println!("  Images referenced: {}", summary.job_count);
    println!("  Downloaded: {}", summary.success_count);
    println!("  Failed: {}", summary.failure_count);
    println!("  Bytes written: {}", summary.bytes_written);
    println!("  Output: {}", summary.output_dir.display());
    println!("  Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    print_failures(&summary.failures, &summary.failures_by_class);

    println!(
        "Success Rate: {:.1}% ({} / {} images downloaded)",
        success_rate(summary.success_count, summary.job_count),
        summary.success_count,
        summary.job_count
    );
}

/// Per-class failure counts in a fixed order, e.g. `transient: 2, permanent: 1`
pub fn format_failure_classes(counts: &HashMap<FailureClass, usize>) -> String {
    [
        FailureClass::Transient,
        FailureClass::Permanent,
        FailureClass::Fatal,
    ]
    .iter()
    .filter_map(|class| {
        counts
            .get(class)
            .filter(|n| **n > 0)
            .map(|n| format!("{}: {}", class, n))
    })
    .collect::<Vec<_>>()
    .join(", ")
}

fn print_failures(failures: &[TaskFailure], by_class: &HashMap<FailureClass, usize>) {
    if failures.is_empty() {
        return;
    }

    println!(
        "Failures ({}; {}):",
        failures.len(),
        format_failure_classes(by_class)
    );
    for failure in failures.iter().take(MAX_LISTED_FAILURES) {
        println!("  - {} [{}]: {}", failure.key, failure.class, failure.message);
    }
    if failures.len() > MAX_LISTED_FAILURES {
        println!("  ... and {} more", failures.len() - MAX_LISTED_FAILURES);
    }
    println!();
}
