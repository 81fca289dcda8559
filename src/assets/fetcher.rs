//! Image retrieval and storage

use crate::assets::job::AssetJob;
use crate::output::write_atomic;
use crate::pipeline::{Keyed, Outcome, RetryPolicy};
use crate::{HarvestError, Result};
use reqwest::Client;
use std::path::PathBuf;

/// An image written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAsset {
    pub url: String,
    pub path: PathBuf,
    pub bytes: u64,
}

impl Keyed for SavedAsset {
    fn key(&self) -> &str {
        &self.url
    }
}

/// Downloads images with retries and stores them atomically
#[derive(Debug, Clone)]
pub struct AssetFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl AssetFetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Downloads one image and writes it to its destination
    ///
    /// Only a 2xx response is written. Any other status, or running out of
    /// retries, fails without touching the destination.
    pub async fn fetch(&self, job: &AssetJob) -> Result<SavedAsset> {
        let body = self
            .policy
            .execute(&job.url, || self.download(&job.url))
            .await?;

        let bytes = body.len() as u64;
        let destination = job.destination.clone();
        tokio::task::spawn_blocking(move || write_atomic(&destination, &body))
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))??;

        Ok(SavedAsset {
            url: job.url.clone(),
            path: job.destination.clone(),
            bytes,
        })
    }

    /// Task body for the worker pool
    pub async fn fetch_outcome(&self, job: AssetJob) -> Outcome<SavedAsset> {
        let result = self.fetch(&job).await;
        if let Ok(saved) = &result {
            tracing::debug!("Saved {} ({} bytes)", saved.path.display(), saved.bytes);
        }
        Outcome::from_result(job.url, result)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let http_error = |source: reqwest::Error| HarvestError::Http {
            target: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::HttpStatus {
                target: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(http_error)?;
        Ok(body.to_vec())
    }
}
