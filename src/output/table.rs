//! The 11-column listing table
//!
//! Written by the export stage and read back by the image download stage.
//! Values are quoted only when needed and the header row is fixed.

use crate::listing::Record;
use crate::output::files::write_atomic;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Header of the listing table, in column order
pub const COLUMNS: [&str; 11] = [
    "ItemID",
    "Title",
    "Price",
    "Currency",
    "CategoryID",
    "CategoryName",
    "Description",
    "Quantity",
    "Brand",
    "ListingURL",
    "ImageURLs",
];

/// One row of the listing table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(rename = "ItemID")]
    pub item_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Currency")]
    pub currency: String,
    #[serde(rename = "CategoryID")]
    pub category_id: String,
    #[serde(rename = "CategoryName")]
    pub category_name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Quantity")]
    pub quantity: String,
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "ListingURL")]
    pub listing_url: String,
    #[serde(rename = "ImageURLs")]
    pub image_urls: String,
}

impl TableRow {
    pub fn from_record(record: &Record, image_separator: &str) -> Self {
        Self {
            item_id: record.item_id.clone(),
            title: record.title.clone(),
            price: record.price.clone(),
            currency: record.currency.clone(),
            category_id: record.category_id.clone(),
            category_name: record.category_name.clone(),
            description: record.description.clone(),
            quantity: record.quantity.clone(),
            brand: record.brand.clone(),
            listing_url: record.listing_url.clone(),
            image_urls: record.joined_image_urls(image_separator),
        }
    }
}

/// Writes records to `path`, replacing any existing table atomically
///
/// The header is written even when there are no records.
pub fn write_table(path: &Path, records: &[Record], image_separator: &str) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(TableRow::from_record(record, image_separator))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    write_atomic(path, &bytes)?;
    tracing::debug!("Table {} written with {} rows", path.display(), records.len());
    Ok(())
}

/// Reads every row of a listing table
///
/// Rows are matched to columns by header name; missing columns are an error.
pub fn read_table(path: &Path) -> Result<Vec<TableRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize::<TableRow>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    tracing::debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}
