//! Sequential enumeration of listing pages

use crate::listing::client::ListingSource;
use crate::{ConfigError, HarvestError, Result};

/// Maximum number of pages requested before enumeration is abandoned
const MAX_PAGES: u32 = 10_000;

/// Walks listing pages from page 1 until the source is exhausted
pub struct Paginator<'a> {
    source: &'a dyn ListingSource,
}

impl<'a> Paginator<'a> {
    pub fn new(source: &'a dyn ListingSource) -> Self {
        Self { source }
    }

    /// Fetches every identifier across all pages
    ///
    /// # Stop Rule
    ///
    /// Enumeration stops after the first page holding fewer than `page_size`
    /// identifiers, which includes an empty page. A page holding exactly
    /// `page_size` identifiers always costs one more request, even when the
    /// next page turns out to be empty.
    ///
    /// # Errors
    ///
    /// A failing page aborts enumeration; the identifiers gathered so far are
    /// discarded and the error is returned as `HarvestError::Enumeration`.
    /// Retrying individual pages is the source's responsibility.
    pub async fn fetch_all(&self, page_size: u32) -> Result<Vec<String>> {
        if page_size == 0 {
            return Err(ConfigError::Validation("page size must be at least 1".to_string()).into());
        }

        let mut ids = Vec::new();
        let mut page = 1;

        loop {
            if page > MAX_PAGES {
                return Err(HarvestError::Enumeration {
                    page,
                    source: Box::new(HarvestError::Malformed {
                        target: "listing pages".to_string(),
                        message: format!("more than {} full pages returned", MAX_PAGES),
                    }),
                });
            }

            let batch = self
                .source
                .list_page(page, page_size)
                .await
                .map_err(|e| HarvestError::Enumeration {
                    page,
                    source: Box::new(e),
                })?;

            let count = batch.len();
            tracing::debug!("Listing page {} returned {} identifiers", page, count);
            ids.extend(batch);

            if count < page_size as usize {
                break;
            }
            page += 1;
        }

        tracing::info!("Enumerated {} listings across {} page(s)", ids.len(), page);
        Ok(ids)
    }
}
