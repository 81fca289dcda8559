use catalog_harvest::assets::run_asset_download;
use catalog_harvest::config::{DownloadConfig, RetryConfig};
use catalog_harvest::listing::Record;
use catalog_harvest::output::write_table;
use catalog_harvest::FailureClass;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn download_config(dir: &Path) -> DownloadConfig {
    DownloadConfig {
        table_path: dir.join("eBay_items.csv"),
        output_dir: dir.join("images"),
        max_concurrency: 4,
        timeout_secs: 5,
        retry: RetryConfig {
            max_attempts: 4,
            initial_delay_ms: 1,
            backoff_multiplier: 2.0,
            jitter_fraction: 0.1,
        },
    }
}

fn record(item_id: &str, brand: &str, title: &str, urls: Vec<String>) -> Record {
    Record {
        item_id: item_id.to_string(),
        title: title.to_string(),
        brand: brand.to_string(),
        listing_url: format!("https://www.ebay.com/itm/{}", item_id),
        image_urls: urls,
        ..Record::default()
    }
}

async fn mount_image(server: &MockServer, image_path: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(image_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_download_is_idempotent() {
    let server = MockServer::start().await;
    mount_image(&server, "/img/1.jpg", b"first image").await;
    mount_image(&server, "/img/2.png", b"second image").await;
    mount_image(&server, "/img/3", b"third image").await;

    let dir = TempDir::new().unwrap();
    let config = download_config(dir.path());
    let records = vec![
        record(
            "1",
            "Patagonia",
            "Down Sweater",
            vec![
                format!("{}/img/1.jpg", server.uri()),
                format!("{}/img/2.png", server.uri()),
            ],
        ),
        record("2", "", "Mug: \"Best\"", vec![format!("{}/img/3", server.uri())]),
    ];
    write_table(&config.table_path, &records, ", ").unwrap();

    let first = run_asset_download(&config).await.unwrap();
    assert_eq!(first.row_count, 2);
    assert_eq!(first.job_count, 3);
    assert_eq!(first.success_count, 3);
    assert_eq!(first.failure_count, 0);

    let images = dir.path().join("images");
    let jacket_0 = images.join("patagonia/Down Sweater/Down Sweater_0.jpg");
    let jacket_1 = images.join("patagonia/Down Sweater/Down Sweater_1.png");
    let mug = images.join("no_brand/Mug Best/Mug Best_0");

    let before: Vec<Vec<u8>> = [&jacket_0, &jacket_1, &mug]
        .iter()
        .map(|p| std::fs::read(p).unwrap())
        .collect();
    assert_eq!(before[0], b"first image");
    assert_eq!(before[2], b"third image");

    let second = run_asset_download(&config).await.unwrap();
    assert_eq!(second.success_count, 3);

    let after: Vec<Vec<u8>> = [&jacket_0, &jacket_1, &mug]
        .iter()
        .map(|p| std::fs::read(p).unwrap())
        .collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_missing_image_leaves_no_file() {
    let server = MockServer::start().await;
    mount_image(&server, "/ok.jpg", b"ok").await;
    Mock::given(method("GET"))
        .and(path("/gone.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = download_config(dir.path());
    let records = vec![record(
        "1",
        "Acme",
        "Widget",
        vec![
            format!("{}/gone.jpg", server.uri()),
            format!("{}/ok.jpg", server.uri()),
        ],
    )];
    write_table(&config.table_path, &records, ", ").unwrap();

    let summary = run_asset_download(&config).await.unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failure_count, 1);
    assert_eq!(summary.failures[0].key, format!("{}/gone.jpg", server.uri()));
    assert_eq!(summary.failures[0].class, FailureClass::Permanent);

    let item_dir = dir.path().join("images/acme/Widget");
    assert!(!item_dir.join("Widget_0.jpg").exists());
    assert_eq!(std::fs::read(item_dir.join("Widget_1.jpg")).unwrap(), b"ok");
    assert_eq!(std::fs::read_dir(&item_dir).unwrap().count(), 1);
}

#[tokio::test]
async fn test_server_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky.jpg"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_image(&server, "/flaky.jpg", b"eventually").await;

    let dir = TempDir::new().unwrap();
    let config = download_config(dir.path());
    let records = vec![record(
        "1",
        "Acme",
        "Flaky",
        vec![format!("{}/flaky.jpg", server.uri())],
    )];
    write_table(&config.table_path, &records, ", ").unwrap();

    let summary = run_asset_download(&config).await.unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.bytes_written, 10);
    assert_eq!(
        std::fs::read(dir.path().join("images/acme/Flaky/Flaky_0.jpg")).unwrap(),
        b"eventually"
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_exhausted_retries_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = download_config(dir.path());
    let records = vec![record(
        "1",
        "Acme",
        "Down",
        vec![format!("{}/down.jpg", server.uri())],
    )];
    write_table(&config.table_path, &records, ", ").unwrap();

    let summary = run_asset_download(&config).await.unwrap();

    assert_eq!(summary.success_count, 0);
    assert_eq!(summary.failures[0].class, FailureClass::Transient);
    assert!(!dir.path().join("images/acme/Down/Down_0.jpg").exists());
}

#[tokio::test]
async fn test_missing_table_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = download_config(dir.path());

    assert!(run_asset_download(&config).await.is_err());
    assert!(!dir.path().join("images").exists());
}
