//! Remote listing API client
//!
//! The `ListingSource` trait is the seam between the pipeline and the remote
//! API. `TradingClient` implements it against a Trading-style endpoint: every
//! call is a POST of a JSON document, with the call name and application
//! credentials in headers and the user token in the body.
//!
//! # Error Mapping
//!
//! | Condition | Error | Class |
//! |-----------|-------|-------|
//! | Timeout / connect / interrupted body | `Http` | Transient |
//! | HTTP 429, 5xx | `HttpStatus` | Transient |
//! | HTTP 401, 403 | `Auth` | Fatal |
//! | Other non-2xx | `HttpStatus` | Permanent |
//! | Body is not JSON | `Malformed` | Permanent |
//! | `Ack = Failure`, code 931/932 | `Auth` | Fatal |
//! | `Ack = Failure`, code 17 | `ItemUnavailable` | Permanent |
//! | Other `Ack = Failure` | `Api` | Permanent |

use crate::config::ApiConfig;
use crate::http::build_http_client;
use crate::pipeline::RetryPolicy;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

const CALL_LIST_SELLING: &str = "GetMyeBaySelling";
const CALL_GET_ITEM: &str = "GetItem";

/// Remote error codes that mean the token or keys were rejected
const AUTH_ERROR_CODES: &[&str] = &["931", "932"];

/// Remote error code for an item that was deleted or can no longer be accessed
const ITEM_UNAVAILABLE_CODE: &str = "17";

/// Remote source of listings
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Returns the identifiers on one page of active listings (pages are 1-based)
    async fn list_page(&self, page_number: u32, page_size: u32) -> Result<Vec<String>>;

    /// Returns the raw detail document for one listing
    async fn get_item(&self, item_id: &str) -> Result<Value>;
}

/// Client for a Trading-style listing API
pub struct TradingClient {
    http: Client,
    config: ApiConfig,
    page_retry: RetryPolicy,
}

impl TradingClient {
    /// Creates a client from explicit configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Endpoint and credentials
    /// * `page_retry` - Policy applied to listing page requests
    pub fn new(config: ApiConfig, page_retry: RetryPolicy) -> Result<Self> {
        let http = build_http_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            http,
            config,
            page_retry,
        })
    }

    /// Issues one API call and returns the decoded, acknowledged response
    async fn call(&self, call_name: &str, mut body: Value) -> Result<Value> {
        if let Some(obj) = body.as_object_mut() {
            obj.insert(
                "RequesterCredentials".to_string(),
                json!({ "eBayAuthToken": self.config.user_token }),
            );
        }

        let response = self
            .http
            .post(&self.config.endpoint)
            .header("X-EBAY-API-CALL-NAME", call_name)
            .header("X-EBAY-API-APP-NAME", &self.config.app_id)
            .header("X-EBAY-API-DEV-NAME", &self.config.dev_id)
            .header("X-EBAY-API-CERT-NAME", &self.config.cert_id)
            .header("X-EBAY-API-SITEID", self.config.site_id.to_string())
            .header(
                "X-EBAY-API-COMPATIBILITY-LEVEL",
                self.config.compatibility_level.to_string(),
            )
            .json(&body)
            .send()
            .await
            .map_err(|source| HarvestError::Http {
                target: call_name.to_string(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(HarvestError::Auth(format!(
                "{} returned HTTP {}",
                call_name,
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(HarvestError::HttpStatus {
                target: call_name.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|source| HarvestError::Http {
            target: call_name.to_string(),
            source,
        })?;
        let document: Value = serde_json::from_str(&text).map_err(|e| HarvestError::Malformed {
            target: call_name.to_string(),
            message: e.to_string(),
        })?;

        check_ack(call_name, &document)?;
        Ok(document)
    }
}

#[async_trait]
impl ListingSource for TradingClient {
    async fn list_page(&self, page_number: u32, page_size: u32) -> Result<Vec<String>> {
        let label = format!("{} page {}", CALL_LIST_SELLING, page_number);
        let document = self
            .page_retry
            .execute(&label, || {
                self.call(
                    CALL_LIST_SELLING,
                    json!({
                        "ActiveList": {
                            "Include": true,
                            "Pagination": {
                                "EntriesPerPage": page_size,
                                "PageNumber": page_number,
                            }
                        }
                    }),
                )
            })
            .await?;

        Ok(parse_item_ids(&document))
    }

    async fn get_item(&self, item_id: &str) -> Result<Value> {
        self.call(
            CALL_GET_ITEM,
            json!({ "ItemID": item_id, "DetailLevel": "ReturnAll" }),
        )
        .await
        .map_err(|e| match e {
            HarvestError::Api { code, message, .. } if code == ITEM_UNAVAILABLE_CODE => {
                HarvestError::ItemUnavailable {
                    item_id: item_id.to_string(),
                    message,
                }
            }
            other => other,
        })
    }
}

/// Rejects responses whose `Ack` reports a failure
fn check_ack(call_name: &str, document: &Value) -> Result<()> {
    let ack = document.get("Ack").and_then(Value::as_str).unwrap_or("Success");
    if ack != "Failure" {
        return Ok(());
    }

    let first_error = document
        .get("Errors")
        .map(as_list)
        .and_then(|errors| errors.into_iter().next());
    let code = first_error
        .and_then(|e| e.get("ErrorCode"))
        .map(scalar_text)
        .unwrap_or_default();
    let message = first_error
        .and_then(|e| e.get("LongMessage").or_else(|| e.get("ShortMessage")))
        .map(scalar_text)
        .unwrap_or_else(|| "no error message".to_string());

    if AUTH_ERROR_CODES.contains(&code.as_str()) {
        return Err(HarvestError::Auth(format!("{} ({})", message, code)));
    }

    Err(HarvestError::Api {
        call: call_name.to_string(),
        code,
        message,
    })
}

/// Extracts listing identifiers from a `GetMyeBaySelling` response
fn parse_item_ids(document: &Value) -> Vec<String> {
    let items = document
        .pointer("/ActiveList/ItemArray/Item")
        .map(as_list)
        .unwrap_or_default();

    items
        .into_iter()
        .filter_map(|item| {
            let id = item.get("ItemID").map(scalar_text).unwrap_or_default();
            if id.is_empty() {
                tracing::warn!("Skipping listing entry without ItemID");
                None
            } else {
                Some(id)
            }
        })
        .collect()
}

/// Treats a scalar or object as a one-element list; `null` as empty
pub(crate) fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Renders a scalar JSON value as text; containers and `null` become empty
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
