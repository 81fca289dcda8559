use crate::pipeline::Keyed;

/// One normalized listing
///
/// Every field is always present; missing remote values become empty
/// strings or an empty list so table rows stay rectangular.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub item_id: String,
    pub title: String,
    pub price: String,
    pub currency: String,
    pub category_id: String,
    pub category_name: String,
    /// Plain text, markup removed
    pub description: String,
    pub quantity: String,
    pub brand: String,
    /// Canonical `<base>/<id>` URL
    pub listing_url: String,
    /// Image URLs in remote order
    pub image_urls: Vec<String>,
}

impl Record {
    /// Image URLs joined into a single table cell
    pub fn joined_image_urls(&self, separator: &str) -> String {
        self.image_urls.join(separator)
    }
}

impl Keyed for Record {
    fn key(&self) -> &str {
        &self.item_id
    }
}
