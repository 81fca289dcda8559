//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for exporting a seller catalog and
//! downloading its images.

use anyhow::{Context, Result};
use catalog_harvest::assets::run_asset_download;
use catalog_harvest::config::{load_config_with_hash, validate, Config};
use catalog_harvest::listing::{run_listing_export, ListingSource, TradingClient};
use catalog_harvest::output::{print_download_summary, print_export_summary};
use catalog_harvest::{ConfigError, RetryPolicy};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a seller catalog exporter
///
/// Exports every active listing of a seller account to a CSV table, then
/// downloads the images referenced by that table into a brand/title
/// directory tree.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Export a seller catalog and its images", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "harvest.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enumerate active listings, fetch their details and write the table
    Export {
        /// Listings requested per page (1-200)
        #[arg(long)]
        page_size: Option<u32>,

        /// Maximum number of detail requests in flight
        #[arg(long)]
        concurrency: Option<usize>,

        /// Where to write the listing table
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Download every image referenced by the listing table
    Images {
        /// Listing table to read
        #[arg(long, value_name = "PATH")]
        table: Option<PathBuf>,

        /// Root directory for downloaded images
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Maximum number of downloads in flight
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Validate the configuration and show the effective settings
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Export {
            page_size,
            concurrency,
            output,
        } => {
            let mut config = load(&cli.config, false)?;
            if let Some(page_size) = page_size {
                config.export.page_size = page_size;
            }
            if let Some(concurrency) = concurrency {
                config.export.max_concurrency = concurrency;
            }
            if let Some(output) = output {
                config.export.output_path = output;
            }
            validate(&config).context("Invalid command-line override")?;
            handle_export(config).await
        }
        Command::Images {
            table,
            output_dir,
            concurrency,
        } => {
            let mut config = load(&cli.config, true)?;
            if let Some(table) = table {
                config.download.table_path = table;
            }
            if let Some(output_dir) = output_dir {
                config.download.output_dir = output_dir;
            }
            if let Some(concurrency) = concurrency {
                config.download.max_concurrency = concurrency;
            }
            validate(&config).context("Invalid command-line override")?;
            handle_images(config).await
        }
        Command::Check => {
            let config = load(&cli.config, false)?;
            handle_check(&config);
            Ok(())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads and validates the configuration, logging its hash
///
/// With `allow_missing`, a config file that does not exist yields the defaults.
fn load(path: &Path, allow_missing: bool) -> Result<Config> {
    tracing::info!("Loading configuration from: {}", path.display());
    match load_config_with_hash(path) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        Err(ConfigError::Io(e)) if allow_missing && e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No configuration at {}, using defaults", path.display());
            Ok(Config::default())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load {}", path.display())),
    }
}

/// Handles the `export` command
async fn handle_export(config: Config) -> Result<()> {
    let api = config
        .api
        .context("The [api] section is required for export")?;
    let settings = config.export;

    tracing::info!(
        "Exporting listings from {} (page size {}, concurrency {})",
        api.endpoint,
        settings.page_size,
        settings.max_concurrency
    );

    let client = TradingClient::new(api, RetryPolicy::from_config(&settings.retry))
        .context("Failed to build API client")?;
    let source: Arc<dyn ListingSource> = Arc::new(client);

    let summary = run_listing_export(source, &settings)
        .await
        .context("Listing export failed")?;

    print_export_summary(&summary);
    Ok(())
}

/// Handles the `images` command
async fn handle_images(config: Config) -> Result<()> {
    let settings = config.download;

    let summary = run_asset_download(&settings)
        .await
        .context("Image download failed")?;

    print_download_summary(&summary);
    Ok(())
}

/// Handles the `check` command: shows the effective settings without any network traffic
fn handle_check(config: &Config) {
    println!("=== Catalog-Harvest Configuration ===\n");

    match &config.api {
        Some(api) => {
            println!("API:");
            println!("  Endpoint: {}", api.endpoint);
            println!("  App ID: {}", api.app_id);
            println!("  Site ID: {}", api.site_id);
            println!("  Compatibility level: {}", api.compatibility_level);
            println!("  Timeout: {}s", api.timeout_secs);
        }
        None => println!("API: not configured (export unavailable)"),
    }

    let export = &config.export;
    println!("\nExport:");
    println!("  Page size: {}", export.page_size);
    println!("  Max concurrency: {}", export.max_concurrency);
    println!("  Table: {}", export.output_path.display());
    println!("  Listing base URL: {}", export.listing_base_url);
    println!("  Image separator: {:?}", export.image_separator);
    println!(
        "  Retry: {} attempts, {}ms initial delay, x{} backoff, {} jitter",
        export.retry.max_attempts,
        export.retry.initial_delay_ms,
        export.retry.backoff_multiplier,
        export.retry.jitter_fraction
    );

    let download = &config.download;
    println!("\nImages:");
    println!("  Table: {}", download.table_path.display());
    println!("  Output directory: {}", download.output_dir.display());
    println!("  Max concurrency: {}", download.max_concurrency);
    println!("  Timeout: {}s", download.timeout_secs);
    println!(
        "  Retry: {} attempts, {}ms initial delay, x{} backoff, {} jitter",
        download.retry.max_attempts,
        download.retry.initial_delay_ms,
        download.retry.backoff_multiplier,
        download.retry.jitter_fraction
    );

    println!("\n✓ Configuration is valid");
}
