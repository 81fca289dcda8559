//! Image download (stage 2)
//!
//! Reads the listing table written by the export stage, derives one download
//! job per image URL, and stores every image under a brand/title directory
//! tree through the shared worker pool.

mod fetcher;
mod job;

pub use fetcher::{AssetFetcher, SavedAsset};
pub use job::{jobs_for_row, jobs_for_table, sanitize_component, AssetJob};

use crate::config::DownloadConfig;
use crate::http::build_http_client;
use crate::output::read_table;
use crate::pipeline::{Aggregator, RetryPolicy, TaskFailure, WorkerPool};
use crate::{FailureClass, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of one image download run
#[derive(Debug, Clone)]
pub struct DownloadSummary {
    /// Rows read from the table
    pub row_count: usize,

    /// Images referenced by those rows
    pub job_count: usize,

    pub success_count: usize,

    pub failure_count: usize,

    /// Total size of the images written
    pub bytes_written: u64,

    pub failures: Vec<TaskFailure>,

    /// Failure counts per classification
    pub failures_by_class: HashMap<FailureClass, usize>,

    pub output_dir: PathBuf,

    pub elapsed: Duration,
}

/// Downloads every image referenced by the listing table
///
/// An unreadable table is fatal. Individual downloads that fail are reported
/// in the summary and leave no file behind.
///
/// # Arguments
///
/// * `settings` - Table location, output directory, concurrency and retry settings
///
/// # Returns
///
/// * `Ok(DownloadSummary)` - The run finished, possibly with per-image failures
/// * `Err(HarvestError)` - The table could not be read or the client could not be built
pub async fn run_asset_download(settings: &DownloadConfig) -> Result<DownloadSummary> {
    let started = Instant::now();

    let rows = read_table(&settings.table_path)?;
    let jobs = jobs_for_table(&rows, &settings.output_dir);
    let job_count = jobs.len();
    tracing::info!(
        "Table {} lists {} images across {} rows",
        settings.table_path.display(),
        job_count,
        rows.len()
    );

    tokio::fs::create_dir_all(&settings.output_dir).await?;

    let client = build_http_client(Duration::from_secs(settings.timeout_secs))?;
    let fetcher = Arc::new(AssetFetcher::new(
        client,
        RetryPolicy::from_config(&settings.retry),
    ));

    let batch = WorkerPool::new(settings.max_concurrency)
        .with_label("images")
        .run(jobs, move |job| {
            let fetcher = Arc::clone(&fetcher);
            async move { fetcher.fetch_outcome(job).await }
        })
        .await;

    let aggregate = Aggregator::aggregate(batch);
    aggregate.ensure_no_fatal()?;
    let bytes_written = aggregate.rows.iter().map(|saved| saved.bytes).sum();

    tracing::info!(
        "Downloaded {} of {} images into {} ({} failed)",
        aggregate.row_count(),
        job_count,
        settings.output_dir.display(),
        aggregate.failure_count()
    );

    Ok(DownloadSummary {
        row_count: rows.len(),
        job_count,
        success_count: aggregate.row_count(),
        failure_count: aggregate.failure_count(),
        bytes_written,
        failures_by_class: aggregate.failures_by_class(),
        failures: aggregate.failures,
        output_dir: settings.output_dir.clone(),
        elapsed: started.elapsed(),
    })
}
