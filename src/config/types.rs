use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Remote API credentials; only the export stage needs them
    #[serde(default)]
    pub api: Option<ApiConfig>,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub download: DownloadConfig,
}

/// Remote listing API connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Endpoint that receives every API call
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(rename = "app-id")]
    pub app_id: String,

    #[serde(rename = "dev-id")]
    pub dev_id: String,

    #[serde(rename = "cert-id")]
    pub cert_id: String,

    #[serde(rename = "user-token")]
    pub user_token: String,

    #[serde(rename = "site-id", default)]
    pub site_id: u32,

    #[serde(rename = "compatibility-level", default = "default_compatibility_level")]
    pub compatibility_level: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_api_timeout")]
    pub timeout_secs: u64,
}

/// Listing export (stage 1) settings
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Identifiers requested per listing page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Maximum number of item detail requests in flight
    #[serde(rename = "max-concurrency", default = "default_concurrency")]
    pub max_concurrency: usize,

    /// Where the listing table is written
    #[serde(rename = "output-path", default = "default_table_path")]
    pub output_path: PathBuf,

    /// Prefix of the canonical listing URL (`<base>/<id>`)
    #[serde(rename = "listing-base-url", default = "default_listing_base_url")]
    pub listing_base_url: String,

    /// Separator used to join image URLs inside one table cell
    #[serde(rename = "image-separator", default = "default_image_separator")]
    pub image_separator: String,

    #[serde(default = "RetryConfig::detail_default")]
    pub retry: RetryConfig,
}

/// Image download (stage 2) settings
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    /// Listing table to read image URLs from
    #[serde(rename = "table-path", default = "default_table_path")]
    pub table_path: PathBuf,

    /// Root directory for downloaded images
    #[serde(rename = "output-dir", default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum number of image downloads in flight
    #[serde(rename = "max-concurrency", default = "default_concurrency")]
    pub max_concurrency: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_download_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "RetryConfig::asset_default")]
    pub retry: RetryConfig,
}

/// Retry policy parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetryConfig {
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    #[serde(rename = "initial-delay-ms")]
    pub initial_delay_ms: u64,

    #[serde(rename = "backoff-multiplier")]
    pub backoff_multiplier: f64,

    #[serde(rename = "jitter-fraction")]
    pub jitter_fraction: f64,
}

impl RetryConfig {
    /// Policy for listing pages and item details
    pub fn detail_default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay_ms: 3000,
            backoff_multiplier: 2.0,
            jitter_fraction: 0.1,
        }
    }

    /// Policy for image downloads: more attempts, shorter delays
    pub fn asset_default() -> Self {
        Self {
            max_attempts: 6,
            initial_delay_ms: 300,
            backoff_multiplier: 2.0,
            jitter_fraction: 0.1,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_concurrency: default_concurrency(),
            output_path: default_table_path(),
            listing_base_url: default_listing_base_url(),
            image_separator: default_image_separator(),
            retry: RetryConfig::detail_default(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            table_path: default_table_path(),
            output_dir: default_output_dir(),
            max_concurrency: default_concurrency(),
            timeout_secs: default_download_timeout(),
            retry: RetryConfig::asset_default(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.ebay.com/ws/api.dll".to_string()
}

fn default_compatibility_level() -> u32 {
    967
}

fn default_api_timeout() -> u64 {
    60
}

fn default_download_timeout() -> u64 {
    10
}

fn default_page_size() -> u32 {
    200
}

fn default_concurrency() -> usize {
    10
}

fn default_table_path() -> PathBuf {
    PathBuf::from("eBay_items.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_listing_base_url() -> String {
    "https://www.ebay.com/itm".to_string()
}

fn default_image_separator() -> String {
    ", ".to_string()
}
