//! Item detail retrieval and normalization

use crate::listing::client::{as_list, scalar_text, ListingSource};
use crate::listing::markup::strip_markup;
use crate::listing::record::Record;
use crate::pipeline::{Outcome, RetryPolicy};
use crate::{HarvestError, Result};
use serde_json::Value;
use std::sync::Arc;

/// Fetches one listing's detail and normalizes it into a `Record`
pub struct DetailFetcher {
    source: Arc<dyn ListingSource>,
    policy: RetryPolicy,
    listing_base_url: String,
}

impl DetailFetcher {
    pub fn new(
        source: Arc<dyn ListingSource>,
        policy: RetryPolicy,
        listing_base_url: impl Into<String>,
    ) -> Self {
        Self {
            source,
            policy,
            listing_base_url: listing_base_url.into(),
        }
    }

    /// Retrieves and normalizes one listing, retrying transient failures
    pub async fn fetch(&self, item_id: &str) -> Result<Record> {
        let label = format!("GetItem {}", item_id);
        let raw = self
            .policy
            .execute(&label, || self.source.get_item(item_id))
            .await?;
        normalize_item(item_id, &raw, &self.listing_base_url)
    }

    /// Task body for the worker pool
    pub async fn fetch_outcome(&self, item_id: String) -> Outcome<Record> {
        let result = self.fetch(&item_id).await;
        if let Ok(record) = &result {
            tracing::debug!("Fetched item {}: {}", item_id, record.title);
        }
        Outcome::from_result(item_id, result)
    }
}

/// Normalizes a raw `GetItem` response
///
/// # Field Rules
///
/// - Missing fields become empty strings, numbers become decimal text
/// - The description is reduced to plain text
/// - `PictureDetails.PictureURL` may be a single string or a list; both
///   become a list
/// - The listing URL is `<base>/<requested id>`
///
/// # Errors
///
/// Returns `HarvestError::Malformed` if the response has no `Item` object.
pub fn normalize_item(item_id: &str, raw: &Value, listing_base_url: &str) -> Result<Record> {
    let item = raw
        .get("Item")
        .filter(|v| v.is_object())
        .ok_or_else(|| HarvestError::Malformed {
            target: format!("GetItem {}", item_id),
            message: "response has no Item".to_string(),
        })?;

    let text = |pointer: &str| item.pointer(pointer).map(scalar_text).unwrap_or_default();

    let mut record_id = text("/ItemID");
    if record_id.is_empty() {
        record_id = item_id.to_string();
    }

    let image_urls = item
        .pointer("/PictureDetails/PictureURL")
        .map(as_list)
        .unwrap_or_default()
        .into_iter()
        .map(scalar_text)
        .filter(|url| !url.trim().is_empty())
        .collect();

    Ok(Record {
        item_id: record_id,
        title: text("/Title"),
        price: text("/SellingStatus/CurrentPrice/value"),
        currency: text("/SellingStatus/CurrentPrice/_currencyID"),
        category_id: text("/PrimaryCategory/CategoryID"),
        category_name: text("/PrimaryCategory/CategoryName"),
        description: strip_markup(&text("/Description")),
        quantity: text("/Quantity"),
        brand: text("/ProductListingDetails/BrandMPN/Brand"),
        listing_url: format!("{}/{}", listing_base_url.trim_end_matches('/'), item_id),
        image_urls,
    })
}
