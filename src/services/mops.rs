// src/services/mops.rs

//! MOPS disclosure API client.
//!
//! Two endpoints are used: the daily listing (`t05st02`) and the per-item
//! detail (`t05st02_detail`). Both take a JSON body via POST.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{DetailParams, ListingQuery, MopsConfig};
use crate::utils::http::{create_async_client, endpoint};

pub const LIST_ENDPOINT: &str = "t05st02";
pub const DETAIL_ENDPOINT: &str = "t05st02_detail";

/// Source of the daily listing and its detail records.
#[async_trait]
pub trait DisclosureSource: Send + Sync {
    /// Raw listing rows for one day, in upstream order.
    async fn fetch_listing(&self, query: &ListingQuery) -> Result<Vec<Value>>;

    /// Detail document for one announcement.
    async fn fetch_detail(&self, params: &DetailParams) -> Result<Value>;
}

/// HTTP client for the MOPS API.
pub struct MopsClient {
    client: Client,
    list_url: Url,
    detail_url: Url,
}

impl MopsClient {
    /// Create a client from configuration.
    pub fn new(config: &MopsConfig) -> Result<Self> {
        let client = create_async_client(config)?;
        Self::with_client(client, &config.base_url)
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            client,
            list_url: endpoint(base_url, LIST_ENDPOINT)?,
            detail_url: endpoint(base_url, DETAIL_ENDPOINT)?,
        })
    }

    async fn post_json<B: Serialize + ?Sized>(&self, url: &Url, body: &B) -> Result<Value> {
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl DisclosureSource for MopsClient {
    async fn fetch_listing(&self, query: &ListingQuery) -> Result<Vec<Value>> {
        log::debug!("POST {} {}", self.list_url, query.label());
        let body = self.post_json(&self.list_url, query).await?;
        listing_rows(body)
    }

    async fn fetch_detail(&self, params: &DetailParams) -> Result<Value> {
        self.post_json(&self.detail_url, params).await
    }
}

/// Pull `result.data` out of a listing response.
///
/// A missing or null `result`/`data` means nothing was announced. Anything
/// else that is not an array means the response format changed, and the
/// run cannot continue.
pub fn listing_rows(body: Value) -> Result<Vec<Value>> {
    let data = match body {
        Value::Object(mut root) => match root.remove("result") {
            None | Some(Value::Null) => Value::Null,
            Some(Value::Object(mut result)) => result.remove("data").unwrap_or(Value::Null),
            Some(other) => {
                return Err(AppError::transport(
                    "listing",
                    format!("unexpected `result` value: {other}"),
                ));
            }
        },
        other => {
            return Err(AppError::transport(
                "listing",
                format!("response is not an object: {other}"),
            ));
        }
    };

    match data {
        Value::Null => Ok(Vec::new()),
        Value::Array(rows) => Ok(rows),
        other => Err(AppError::transport(
            "listing",
            format!("`result.data` is not an array: {other}"),
        )),
    }
}
