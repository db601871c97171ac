// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, ORIGIN, REFERER};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::MopsConfig;

/// Create the asynchronous HTTP client used against the MOPS API.
///
/// The upstream rejects requests without a same-site `Origin`/`Referer`, so
/// both are installed as default headers.
pub fn create_async_client(config: &MopsConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ORIGIN, header_value("mops.origin", &config.origin)?);
    headers.insert(REFERER, header_value("mops.referer", &config.referer)?);

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Create the client shared by the notification channels.
pub fn create_notify_client(timeout_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// Join an endpoint path onto an API root, keeping the root's own path.
///
/// `Url::join` would drop the last segment of `https://host/mops/api`, so a
/// trailing slash is forced first.
pub fn endpoint(base: &str, path: &str) -> Result<Url> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::config(format!("{name} is not a valid header value: {e}")))
}
