use catalog_harvest::config::{ApiConfig, ExportConfig, RetryConfig};
use catalog_harvest::listing::{run_listing_export, ListingSource, TradingClient};
use catalog_harvest::output::read_table;
use catalog_harvest::{FailureClass, HarvestError, RetryPolicy};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_PATH: &str = "/ws/api.dll";

/// Retries with millisecond delays so failing tests stay fast
fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_delay_ms: 1,
        backoff_multiplier: 2.0,
        jitter_fraction: 0.1,
    }
}

fn api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        endpoint: format!("{}{}", server.uri(), API_PATH),
        app_id: "test-app".to_string(),
        dev_id: "test-dev".to_string(),
        cert_id: "test-cert".to_string(),
        user_token: "test-token".to_string(),
        site_id: 0,
        compatibility_level: 967,
        timeout_secs: 5,
    }
}

fn export_config(output_path: &Path, page_size: u32) -> ExportConfig {
    ExportConfig {
        page_size,
        max_concurrency: 3,
        output_path: output_path.to_path_buf(),
        listing_base_url: "https://www.ebay.com/itm".to_string(),
        image_separator: ", ".to_string(),
        retry: fast_retry(),
    }
}

fn source(server: &MockServer) -> Arc<dyn ListingSource> {
    let client = TradingClient::new(api_config(server), RetryPolicy::from_config(&fast_retry()))
        .expect("Failed to build client");
    Arc::new(client)
}

fn page_body(ids: &[&str]) -> Value {
    let items: Vec<Value> = ids.iter().map(|id| json!({ "ItemID": id })).collect();
    json!({
        "Ack": "Success",
        "ActiveList": { "ItemArray": { "Item": items } }
    })
}

async fn mount_page(server: &MockServer, page: u32, ids: &[&str]) {
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("X-EBAY-API-CALL-NAME", "GetMyeBaySelling"))
        .and(body_partial_json(
            json!({ "ActiveList": { "Pagination": { "PageNumber": page } } }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(ids)))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_item(server: &MockServer, item_id: &str, response: Value) {
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("X-EBAY-API-CALL-NAME", "GetItem"))
        .and(body_partial_json(json!({ "ItemID": item_id })))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(server)
        .await;
}

fn item(item_id: &str, title: &str, pictures: Value) -> Value {
    json!({
        "Ack": "Success",
        "Item": {
            "ItemID": item_id,
            "Title": title,
            "SellingStatus": { "CurrentPrice": { "value": 24.5, "_currencyID": "GBP" } },
            "PrimaryCategory": { "CategoryID": "11450", "CategoryName": "Clothing" },
            "Description": "<p>Brand new &amp; boxed</p><script>track()</script>",
            "Quantity": "2",
            "ProductListingDetails": { "BrandMPN": { "Brand": "Acme" } },
            "PictureDetails": { "PictureURL": pictures }
        }
    })
}

#[tokio::test]
async fn test_export_writes_table_and_reports_failures() {
    let server = MockServer::start().await;

    mount_page(&server, 1, &["103", "101"]).await;
    mount_page(&server, 2, &["102"]).await;

    mount_item(
        &server,
        "101",
        item(
            "101",
            "Rain Jacket",
            json!(["https://i.example.com/101a.jpg", "https://i.example.com/101b.jpg"]),
        ),
    )
    .await;
    mount_item(
        &server,
        "102",
        json!({
            "Ack": "Failure",
            "Errors": { "ErrorCode": "17", "LongMessage": "This item cannot be accessed." }
        }),
    )
    .await;
    mount_item(
        &server,
        "103",
        item("103", "Wool Scarf", json!("https://i.example.com/103.jpg")),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("eBay_items.csv");

    let summary = run_listing_export(source(&server), &export_config(&table_path, 2))
        .await
        .expect("Export should succeed");

    assert_eq!(summary.listing_count, 3);
    assert_eq!(summary.row_count, 2);
    assert_eq!(summary.failure_count, 1);
    assert_eq!(summary.failures[0].key, "102");
    assert_eq!(summary.failures[0].class, FailureClass::Permanent);

    let rows = read_table(&table_path).unwrap();
    assert_eq!(rows.len(), 2);

    // Rows come out ordered by ItemID
    assert_eq!(rows[0].item_id, "101");
    assert_eq!(rows[0].title, "Rain Jacket");
    assert_eq!(rows[0].price, "24.5");
    assert_eq!(rows[0].currency, "GBP");
    assert_eq!(rows[0].description, "Brand new & boxed");
    assert_eq!(rows[0].brand, "Acme");
    assert_eq!(rows[0].listing_url, "https://www.ebay.com/itm/101");
    assert_eq!(
        rows[0].image_urls,
        "https://i.example.com/101a.jpg, https://i.example.com/101b.jpg"
    );

    assert_eq!(rows[1].item_id, "103");
    assert_eq!(rows[1].image_urls, "https://i.example.com/103.jpg");
}

#[tokio::test]
async fn test_full_page_triggers_one_more_request() {
    let server = MockServer::start().await;

    mount_page(&server, 1, &["1", "2"]).await;
    mount_page(&server, 2, &[]).await;
    mount_item(&server, "1", item("1", "One", json!(null))).await;
    mount_item(&server, "2", item("2", "Two", json!(null))).await;

    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("items.csv");

    let summary = run_listing_export(source(&server), &export_config(&table_path, 2))
        .await
        .unwrap();

    assert_eq!(summary.row_count, 2);
    let rows = read_table(&table_path).unwrap();
    assert_eq!(rows[0].image_urls, "");
}

#[tokio::test]
async fn test_requests_carry_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("X-EBAY-API-APP-NAME", "test-app"))
        .and(header("X-EBAY-API-DEV-NAME", "test-dev"))
        .and(header("X-EBAY-API-CERT-NAME", "test-cert"))
        .and(header("X-EBAY-API-SITEID", "0"))
        .and(header("X-EBAY-API-COMPATIBILITY-LEVEL", "967"))
        .and(body_partial_json(
            json!({ "RequesterCredentials": { "eBayAuthToken": "test-token" } }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("items.csv");

    let summary = run_listing_export(source(&server), &export_config(&table_path, 200))
        .await
        .unwrap();

    assert_eq!(summary.listing_count, 0);
    let content = std::fs::read_to_string(&table_path).unwrap();
    assert_eq!(content.lines().count(), 1);
}

#[tokio::test]
async fn test_transient_page_failure_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("X-EBAY-API-CALL-NAME", "GetMyeBaySelling"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, 1, &["7"]).await;
    mount_item(&server, "7", item("7", "Seven", json!(null))).await;

    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("items.csv");

    let summary = run_listing_export(source(&server), &export_config(&table_path, 200))
        .await
        .unwrap();

    assert_eq!(summary.row_count, 1);
}

#[tokio::test]
async fn test_rejected_token_aborts_export() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Ack": "Failure",
            "Errors": [{ "ErrorCode": "932", "LongMessage": "Auth token is hard expired." }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("items.csv");

    let error = run_listing_export(source(&server), &export_config(&table_path, 200))
        .await
        .unwrap_err();

    assert_eq!(error.class(), FailureClass::Fatal);
    match error {
        HarvestError::Enumeration { page, source } => {
            assert_eq!(page, 1);
            assert!(matches!(*source, HarvestError::Auth(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!table_path.exists());
}

#[tokio::test]
async fn test_page_failure_discards_partial_enumeration() {
    let server = MockServer::start().await;

    mount_page(&server, 1, &["1", "2"]).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(
            json!({ "ActiveList": { "Pagination": { "PageNumber": 2 } } }),
        ))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("X-EBAY-API-CALL-NAME", "GetItem"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("items.csv");

    let error = run_listing_export(source(&server), &export_config(&table_path, 2))
        .await
        .unwrap_err();

    assert!(matches!(error, HarvestError::Enumeration { page: 2, .. }));
    assert!(!table_path.exists());
}

#[tokio::test]
async fn test_token_revoked_during_details_keeps_previous_table() {
    let server = MockServer::start().await;

    mount_page(&server, 1, &["1", "2", "3"]).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("X-EBAY-API-CALL-NAME", "GetItem"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Ack": "Failure",
            "Errors": { "ErrorCode": "932", "LongMessage": "Auth token is hard expired." }
        })))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("items.csv");
    std::fs::write(&table_path, "previous good export").unwrap();

    let error = run_listing_export(source(&server), &export_config(&table_path, 200))
        .await
        .unwrap_err();

    assert_eq!(error.class(), FailureClass::Fatal);
    assert!(matches!(error, HarvestError::Aborted { .. }));
    assert_eq!(
        std::fs::read_to_string(&table_path).unwrap(),
        "previous good export"
    );
}
