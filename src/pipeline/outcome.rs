//! Per-task outcomes and the batch that collects them

use crate::{FailureClass, HarvestError};

/// Why a single task produced no result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// The input the task was working on (identifier or URL)
    pub key: String,

    /// Classification of the final error
    pub class: FailureClass,

    /// Human-readable cause
    pub message: String,
}

impl TaskFailure {
    pub fn new(key: impl Into<String>, class: FailureClass, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            class,
            message: message.into(),
        }
    }

    /// Builds a failure from the error that ended a task
    pub fn from_error(key: impl Into<String>, error: &HarvestError) -> Self {
        Self::new(key, error.class(), error.to_string())
    }

    /// Failure recorded when a task body panicked
    pub fn panicked(key: impl Into<String>) -> Self {
        Self::new(key, FailureClass::Permanent, "task panicked")
    }
}

/// Result of one task: a complete value or a classified failure
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<R> {
    Success(R),
    Failure(TaskFailure),
}

impl<R> Outcome<R> {
    /// Converts a task result into an outcome keyed by the task input
    pub fn from_result(key: impl Into<String>, result: crate::Result<R>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(e) => Self::Failure(TaskFailure::from_error(key, &e)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// All outcomes of one worker pool run, in completion order
#[derive(Debug, Clone)]
pub struct Batch<R> {
    outcomes: Vec<Outcome<R>>,
}

impl<R> Batch<R> {
    pub fn new(outcomes: Vec<Outcome<R>>) -> Self {
        Self { outcomes }
    }

    /// Total number of outcomes (successes and failures)
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Outcome<R>> {
        self.outcomes.iter()
    }
}

impl<R> From<Vec<Outcome<R>>> for Batch<R> {
    fn from(outcomes: Vec<Outcome<R>>) -> Self {
        Self::new(outcomes)
    }
}

impl<R> IntoIterator for Batch<R> {
    type Item = Outcome<R>;
    type IntoIter = std::vec::IntoIter<Outcome<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}
