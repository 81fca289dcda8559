//! Listing export (stage 1)
//!
//! This module contains the listing side of the pipeline, including:
//! - The `ListingSource` seam and its remote API client
//! - Page enumeration of active listings
//! - Item detail retrieval and normalization
//! - The export run that ties them to the worker pool and the table writer

mod client;
mod detail;
mod markup;
mod paginator;
mod record;

pub use client::{ListingSource, TradingClient};
pub use detail::{normalize_item, DetailFetcher};
pub use markup::strip_markup;
pub use paginator::Paginator;
pub use record::Record;

use crate::config::ExportConfig;
use crate::output::write_table;
use crate::pipeline::{Aggregator, RetryPolicy, TaskFailure, WorkerPool};
use crate::{FailureClass, Result};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of one export run
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Distinct listings enumerated
    pub listing_count: usize,

    /// Rows written to the table
    pub row_count: usize,

    /// Listings whose detail could not be fetched
    pub failure_count: usize,

    pub failures: Vec<TaskFailure>,

    /// Failure counts per classification
    pub failures_by_class: HashMap<FailureClass, usize>,

    pub output_path: PathBuf,

    pub elapsed: Duration,
}

/// Runs the listing export
///
/// # Steps
///
/// 1. Enumerate all active listing identifiers (fatal on failure)
/// 2. Drop identifiers repeated across pages
/// 3. Fetch every listing's detail through the worker pool
/// 4. Aggregate and write the table
///
/// Per-listing failures are reported in the summary and do not fail the run,
/// unless one of them is fatal: then every task still finishes, but the run
/// fails with `HarvestError::Aborted` and the existing table is left untouched.
pub async fn run_listing_export(
    source: Arc<dyn ListingSource>,
    settings: &ExportConfig,
) -> Result<ExportSummary> {
    let started = Instant::now();

    let ids = Paginator::new(source.as_ref())
        .fetch_all(settings.page_size)
        .await?;
    let ids = dedup_preserving_order(ids);
    let listing_count = ids.len();

    let fetcher = Arc::new(DetailFetcher::new(
        source,
        RetryPolicy::from_config(&settings.retry),
        settings.listing_base_url.clone(),
    ));

    let batch = WorkerPool::new(settings.max_concurrency)
        .with_label("item details")
        .run(ids, move |id| {
            let fetcher = Arc::clone(&fetcher);
            async move { fetcher.fetch_outcome(id).await }
        })
        .await;

    let aggregate = Aggregator::aggregate(batch);

    // A fatal detail failure (revoked token) must not replace the previous table
    aggregate.ensure_no_fatal()?;

    write_table(
        &settings.output_path,
        &aggregate.rows,
        &settings.image_separator,
    )?;

    tracing::info!(
        "Wrote {} listings to {} ({} failed)",
        aggregate.row_count(),
        settings.output_path.display(),
        aggregate.failure_count()
    );

    Ok(ExportSummary {
        listing_count,
        row_count: aggregate.row_count(),
        failure_count: aggregate.failure_count(),
        failures_by_class: aggregate.failures_by_class(),
        failures: aggregate.failures,
        output_path: settings.output_path.clone(),
        elapsed: started.elapsed(),
    })
}

/// Keeps the first occurrence of every identifier
fn dedup_preserving_order(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    let before = ids.len();
    let unique: Vec<String> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();
    if unique.len() < before {
        tracing::debug!(
            "Dropped {} duplicate listing identifiers",
            before - unique.len()
        );
    }
    unique
}
