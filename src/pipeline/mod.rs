//! Concurrent fetch pipeline shared by both stages
//!
//! This module contains the pieces every stage is assembled from:
//! - `RetryPolicy`: bounded retries with exponential backoff and jitter
//! - `WorkerPool`: bounded concurrent execution of independent tasks
//! - `Outcome` / `Batch`: per-task results, success or classified failure
//! - `Aggregator`: turns a batch into sorted rows plus a failure report

mod aggregate;
mod outcome;
mod pool;
mod retry;

pub use aggregate::{Aggregate, Aggregator, Keyed};
pub use outcome::{Batch, Outcome, TaskFailure};
pub use pool::WorkerPool;
pub use retry::{RetryEvent, RetryPolicy, Retryable};
