//! Bounded worker pool
//!
//! Every input is spawned as its own tokio task, but a task body only starts
//! once it holds a permit from the pool's semaphore, so at most
//! `max_concurrency` bodies run at any time. Outcomes are drained from a
//! `JoinSet` by the caller's task alone, which makes it the single writer of
//! the resulting batch.

use crate::pipeline::outcome::{Batch, Outcome, TaskFailure};
use crate::FailureClass;
use futures::FutureExt;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Executes independent fallible tasks with bounded concurrency
#[derive(Debug, Clone)]
pub struct WorkerPool {
    max_concurrency: usize,
    label: String,
}

impl WorkerPool {
    /// Creates a pool; a limit of zero is treated as one
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            label: "tasks".to_string(),
        }
    }

    /// Names the work in progress logs
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Runs `task` once for every input and waits for all of them
    ///
    /// A failing or panicking task becomes a failure outcome; it never
    /// cancels its siblings. The returned batch holds exactly one outcome
    /// per input, in completion order.
    pub async fn run<T, R, F, Fut>(&self, inputs: Vec<T>, task: F) -> Batch<R>
    where
        T: Display + Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome<R>> + Send + 'static,
    {
        let total = inputs.len();
        if total == 0 {
            return Batch::new(Vec::new());
        }

        tracing::info!(
            "Starting {} {} with concurrency {}",
            total,
            self.label,
            self.max_concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let task = Arc::new(task);
        let mut set = JoinSet::new();

        for input in inputs {
            let semaphore = Arc::clone(&semaphore);
            let task = Arc::clone(&task);
            set.spawn(async move {
                // The semaphore is never closed, so acquisition only fails on shutdown
                let _permit = semaphore.acquire_owned().await;
                let key = input.to_string();
                match AssertUnwindSafe(async move { (*task)(input).await })
                    .catch_unwind()
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        tracing::error!("Task for {} panicked", key);
                        Outcome::Failure(TaskFailure::panicked(key))
                    }
                }
            });
        }

        let progress_step = (total / 10).max(1);
        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(total);
        let mut failures = 0;

        while let Some(joined) = set.join_next().await {
            let outcome = joined.unwrap_or_else(|e| {
                Outcome::Failure(TaskFailure::new(
                    "<unknown>",
                    FailureClass::Permanent,
                    format!("task did not complete: {}", e),
                ))
            });

            if !outcome.is_success() {
                failures += 1;
            }
            outcomes.push(outcome);

            let completed = outcomes.len();
            if completed % progress_step == 0 || completed == total {
                tracing::info!(
                    "Progress: {}/{} {} done ({} failed), {:.1}s elapsed",
                    completed,
                    total,
                    self.label,
                    failures,
                    started.elapsed().as_secs_f64()
                );
            }
        }

        Batch::new(outcomes)
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(10)
    }
}
