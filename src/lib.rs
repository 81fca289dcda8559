//! Catalog-Harvest: a seller catalog exporter
//!
//! This crate enumerates a seller's active listings from a paginated remote API,
//! enriches every listing with its item detail, writes the aggregate to a CSV
//! table, and in a second stage downloads every image referenced by that table.
//!
//! Both stages share the same concurrent core in [`pipeline`]: a bounded worker
//! pool, a retry policy with exponential backoff and jitter, and an aggregator
//! that tolerates per-item failures.

pub mod assets;
pub mod config;
pub mod http;
pub mod listing;
pub mod output;
pub mod pipeline;

use thiserror::Error;

/// Main error type for Catalog-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {target}: {source}")]
    Http {
        target: String,
        source: reqwest::Error,
    },

    #[error("HTTP status {status} for {target}")]
    HttpStatus { target: String, status: u16 },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("{call} rejected with error {code}: {message}")]
    Api {
        call: String,
        code: String,
        message: String,
    },

    #[error("Item {item_id} is no longer available: {message}")]
    ItemUnavailable { item_id: String, message: String },

    #[error("Malformed response for {target}: {message}")]
    Malformed { target: String, message: String },

    #[error("Listing enumeration failed at page {page}: {source}")]
    Enumeration {
        page: u32,
        source: Box<HarvestError>,
    },

    #[error("Run aborted by a fatal failure on {key}: {message}")]
    Aborted { key: String, message: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Table error: {0}")]
    Table(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// How a failure should be treated by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Likely to succeed on retry (network errors, timeouts, 429, 5xx)
    Transient,

    /// Certain to recur (deleted item, malformed response, other 4xx)
    Permanent,

    /// Aborts the whole run (authentication, enumeration, configuration)
    ///
    /// Per-task fatal failures let the batch drain, then fail the run.
    Fatal,
}

impl FailureClass {
    /// Short lowercase label used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Permanent => "permanent",
            Self::Fatal => "fatal",
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl HarvestError {
    /// Classifies this error for retry and propagation decisions
    pub fn class(&self) -> FailureClass {
        match self {
            Self::Http { source, .. } => {
                if source.is_timeout()
                    || source.is_connect()
                    || source.is_request()
                    || source.is_body()
                {
                    FailureClass::Transient
                } else {
                    FailureClass::Permanent
                }
            }
            Self::HttpStatus { status, .. } => {
                if *status == 429 || *status >= 500 {
                    FailureClass::Transient
                } else {
                    FailureClass::Permanent
                }
            }
            Self::Auth(_) | Self::Enumeration { .. } | Self::Config(_) | Self::Aborted { .. } => {
                FailureClass::Fatal
            }
            Self::Api { .. }
            | Self::ItemUnavailable { .. }
            | Self::Malformed { .. }
            | Self::Reqwest(_)
            | Self::Table(_)
            | Self::Io(_) => FailureClass::Permanent,
        }
    }
}

impl pipeline::Retryable for HarvestError {
    fn is_transient(&self) -> bool {
        self.class() == FailureClass::Transient
    }
}

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{Aggregator, Batch, Outcome, RetryPolicy, TaskFailure, WorkerPool};
