//! Aggregation of a batch into rows and a failure report

use crate::pipeline::outcome::{Batch, Outcome, TaskFailure};
use crate::{FailureClass, HarvestError};
use std::collections::HashMap;

/// Values with a stable key used to order aggregated rows
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Successful rows and failures of one run
#[derive(Debug, Clone)]
pub struct Aggregate<R> {
    /// Successful results, sorted by key
    pub rows: Vec<R>,

    /// Failed tasks, sorted by key
    pub failures: Vec<TaskFailure>,
}

impl<R> Aggregate<R> {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Failure counts per classification
    pub fn failures_by_class(&self) -> HashMap<FailureClass, usize> {
        let mut counts = HashMap::new();
        for failure in &self.failures {
            *counts.entry(failure.class).or_insert(0) += 1;
        }
        counts
    }

    /// The first failure, by key, that must abort the run
    pub fn fatal_failure(&self) -> Option<&TaskFailure> {
        self.failures
            .iter()
            .find(|failure| failure.class == FailureClass::Fatal)
    }

    /// Fails with `HarvestError::Aborted` if any task failed fatally
    pub fn ensure_no_fatal(&self) -> crate::Result<()> {
        match self.fatal_failure() {
            Some(failure) => Err(HarvestError::Aborted {
                key: failure.key.clone(),
                message: failure.message.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Collects outcomes one at a time and produces a deterministic aggregate
///
/// Owned by a single consumer; outcomes are appended through `&mut self`.
#[derive(Debug)]
pub struct Aggregator<R> {
    rows: Vec<R>,
    failures: Vec<TaskFailure>,
}

impl<R: Keyed> Aggregator<R> {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Records one outcome, logging it if it is a failure
    pub fn record(&mut self, outcome: Outcome<R>) {
        match outcome {
            Outcome::Success(row) => self.rows.push(row),
            Outcome::Failure(failure) => {
                tracing::warn!(
                    "Failed {} ({}): {}",
                    failure.key,
                    failure.class,
                    failure.message
                );
                self.failures.push(failure);
            }
        }
    }

    /// Sorts rows and failures by key so output does not depend on completion order
    pub fn finish(self) -> Aggregate<R> {
        let Self {
            mut rows,
            mut failures,
        } = self;
        rows.sort_by(|a, b| a.key().cmp(b.key()));
        failures.sort_by(|a, b| a.key.cmp(&b.key));
        Aggregate { rows, failures }
    }

    /// Aggregates a whole batch
    pub fn aggregate(batch: Batch<R>) -> Aggregate<R> {
        let mut aggregator = Self::new();
        for outcome in batch {
            aggregator.record(outcome);
        }
        aggregator.finish()
    }
}

impl<R: Keyed> Default for Aggregator<R> {
    fn default() -> Self {
        Self::new()
    }
}
