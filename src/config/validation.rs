use crate::config::types::{ApiConfig, Config, DownloadConfig, ExportConfig, RetryConfig};
use crate::ConfigError;
use url::Url;

/// Largest page the listing API accepts
const MAX_PAGE_SIZE: u32 = 200;

const MAX_CONCURRENCY: usize = 100;

const MAX_ATTEMPTS: u32 = 20;

const MAX_BACKOFF_MULTIPLIER: f64 = 10.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if let Some(api) = &config.api {
        validate_api_config(api)?;
    }
    validate_export_config(&config.export)?;
    validate_download_config(&config.download)?;
    Ok(())
}

/// Validates the remote API credentials and endpoint
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("app-id", &config.app_id),
        ("dev-id", &config.dev_id),
        ("cert-id", &config.cert_id),
        ("user-token", &config.user_token),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;

    validate_timeout("api timeout-secs", config.timeout_secs)?;

    Ok(())
}

/// Validates listing export settings
fn validate_export_config(config: &ExportConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 || config.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, config.page_size
        )));
    }

    validate_concurrency("export max-concurrency", config.max_concurrency)?;

    if config.output_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "export output-path cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.listing_base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid listing-base-url: {}", e)))?;

    // The download stage splits the cell on commas and newlines
    if !config.image_separator.contains([',', '\n']) {
        return Err(ConfigError::Validation(format!(
            "image-separator must contain ',' or a newline, got '{}'",
            config.image_separator
        )));
    }

    validate_retry("export retry", &config.retry)?;

    Ok(())
}

/// Validates image download settings
fn validate_download_config(config: &DownloadConfig) -> Result<(), ConfigError> {
    if config.table_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "download table-path cannot be empty".to_string(),
        ));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "download output-dir cannot be empty".to_string(),
        ));
    }

    validate_concurrency("download max-concurrency", config.max_concurrency)?;
    validate_timeout("download timeout-secs", config.timeout_secs)?;
    validate_retry("download retry", &config.retry)?;

    Ok(())
}

fn validate_concurrency(name: &str, value: usize) -> Result<(), ConfigError> {
    if value < 1 || value > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_CONCURRENCY, value
        )));
    }
    Ok(())
}

fn validate_timeout(name: &str, secs: u64) -> Result<(), ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation(format!("{} must be >= 1", name)));
    }
    Ok(())
}

/// Validates retry policy parameters
fn validate_retry(name: &str, retry: &RetryConfig) -> Result<(), ConfigError> {
    if retry.max_attempts < 1 || retry.max_attempts > MAX_ATTEMPTS {
        return Err(ConfigError::Validation(format!(
            "{} max-attempts must be between 1 and {}, got {}",
            name, MAX_ATTEMPTS, retry.max_attempts
        )));
    }

    if !(1.0..=MAX_BACKOFF_MULTIPLIER).contains(&retry.backoff_multiplier) {
        return Err(ConfigError::Validation(format!(
            "{} backoff-multiplier must be between 1.0 and {}, got {}",
            name, MAX_BACKOFF_MULTIPLIER, retry.backoff_multiplier
        )));
    }

    if !(0.0..=1.0).contains(&retry.jitter_fraction) {
        return Err(ConfigError::Validation(format!(
            "{} jitter-fraction must be between 0.0 and 1.0, got {}",
            name, retry.jitter_fraction
        )));
    }

    Ok(())
}
