//! Listing-page fetcher
//!
//! Issues catalog page requests through a worker's current proxy, with
//! bounded retries at the transport layer. A fetch never fails outright:
//! when every attempt is exhausted a failure response with the sentinel
//! error code is synthesized, and the caller classifies it like any other
//! payload.

use reqwest::{Client, Proxy};
use serde::Deserialize;
use std::time::Duration;

/// Error code used when a payload has to be synthesized locally
pub const SENTINEL_ERROR_CODE: i64 = -1;

/// A catalog listing-page payload; `code == 0` denotes success
#[derive(Debug, Clone, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub code: i64,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub data: PageData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageData {
    #[serde(default)]
    pub archives: Vec<serde_json::Value>,

    #[serde(default)]
    pub page: PageInfo,
}

/// Pagination block reported by the API
#[derive(Debug, Clone, Deserialize)]
pub struct PageInfo {
    #[serde(default = "unknown_count")]
    pub count: i64,

    #[serde(default)]
    pub num: i64,

    #[serde(default)]
    pub size: i64,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            count: -1,
            num: 0,
            size: 0,
        }
    }
}

fn unknown_count() -> i64 {
    -1
}

/// How a worker should react to a page response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Payload status indicates failure (transport or protocol)
    NetworkError,
    /// Success status but no archives: candidate end of region
    EndOfRegion,
    /// Success status with records to persist
    Normal,
}

/// Classifies a response into exactly one worker reaction
pub fn classify(response: &PageResponse) -> PageKind {
    if response.code != 0 {
        PageKind::NetworkError
    } else if response.data.archives.is_empty() {
        PageKind::EndOfRegion
    } else {
        PageKind::Normal
    }
}

/// Builds a client routing requests through the given proxy, if any
///
/// Reqwest proxies are a client-level setting, so workers rebuild their
/// client whenever their proxy assignment changes.
pub fn build_page_client(
    proxy: Option<&str>,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().timeout(timeout).connect_timeout(timeout);

    if let Some(address) = proxy {
        builder = builder.proxy(Proxy::all(format!("http://{}", address))?);
    }

    builder.build()
}

/// Fetches one listing page, retrying at the transport layer
///
/// Attempts are bounded by `retry_count`; each is limited by the client's
/// timeout. A non-200 status, transport failure, or unparseable body each
/// consume an attempt. When all attempts fail the synthesized sentinel
/// response is returned so the worker's classification path stays uniform.
pub async fn fetch_page(
    client: &Client,
    endpoint: &str,
    tid: i64,
    pn: i64,
    ps: u32,
    retry_count: u32,
) -> PageResponse {
    for _ in 0..retry_count {
        let result = client
            .get(endpoint)
            .query(&[
                ("rid", tid.to_string()),
                ("pn", pn.to_string()),
                ("ps", ps.to_string()),
            ])
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(_) => continue,
        };

        if !response.status().is_success() {
            continue;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(_) => continue,
        };

        match serde_json::from_str::<PageResponse>(&body) {
            Ok(page) => return page,
            Err(_) => continue,
        }
    }

    PageResponse {
        code: SENTINEL_ERROR_CODE,
        message: format!(
            "Failed to get page after {} retries: tid={}, pn={}",
            retry_count, tid, pn
        ),
        data: PageData {
            archives: Vec::new(),
            page: PageInfo {
                count: -1,
                num: pn,
                size: ps as i64,
            },
        },
    }
}
