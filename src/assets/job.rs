//! Derivation of download jobs from table rows

use crate::output::TableRow;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Characters removed from brand and title path components
const FORBIDDEN_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Directory used for rows without a brand
pub const NO_BRAND_DIR: &str = "no_brand";

/// Component used for titles that sanitize to nothing
pub const UNTITLED_DIR: &str = "untitled";

/// One image to download and where to store it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetJob {
    pub url: String,
    pub destination: PathBuf,
}

impl fmt::Display for AssetJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Removes characters that are not allowed in a path component
pub fn sanitize_component(name: &str) -> String {
    name.chars().filter(|c| !FORBIDDEN_CHARS.contains(c)).collect()
}

/// Builds the download jobs for one table row
///
/// Image URLs are split on commas and newlines; blank pieces are skipped and
/// do not consume an index. The destination is
/// `<output_dir>/<brand>/<title>/<title>_<index><ext>`.
///
/// # Arguments
///
/// * `row` - A row of the listing table
/// * `output_dir` - Root directory for downloaded images
///
/// # Returns
///
/// One job per non-empty image URL, in table order
pub fn jobs_for_row(row: &TableRow, output_dir: &Path) -> Vec<AssetJob> {
    let brand = brand_component(&row.brand);
    let title = title_component(&row.title);
    let item_dir = output_dir.join(&brand).join(&title);

    split_image_urls(&row.image_urls)
        .enumerate()
        .map(|(index, url)| {
            let file_name = format!("{}_{}{}", title, index, url_extension(url));
            AssetJob {
                url: url.to_string(),
                destination: item_dir.join(file_name),
            }
        })
        .collect()
}

/// Builds the jobs for every row of a table
pub fn jobs_for_table(rows: &[TableRow], output_dir: &Path) -> Vec<AssetJob> {
    rows.iter()
        .flat_map(|row| jobs_for_row(row, output_dir))
        .collect()
}

fn brand_component(brand: &str) -> String {
    let brand = sanitize_component(&brand.trim().to_lowercase());
    if is_unusable_component(&brand) {
        NO_BRAND_DIR.to_string()
    } else {
        brand
    }
}

fn title_component(title: &str) -> String {
    let title = sanitize_component(title.trim());
    if is_unusable_component(&title) {
        UNTITLED_DIR.to_string()
    } else {
        title
    }
}

/// Blank names and `.`/`..`-style names would escape or collapse the layout
fn is_unusable_component(name: &str) -> bool {
    name.trim().chars().all(|c| c == '.')
}

fn split_image_urls(joined: &str) -> impl Iterator<Item = &str> {
    joined
        .split([',', '\n'])
        .map(str::trim)
        .filter(|url| !url.is_empty())
}

/// Extension of the URL path including the dot, or an empty string
fn url_extension(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };
    Path::new(parsed.path())
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}
