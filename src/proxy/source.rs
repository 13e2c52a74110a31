//! Candidate proxy source
//!
//! Fetches the full current list of candidate addresses from a read
//! endpoint. The list is consumed wholesale each refresh cycle; callers
//! deduplicate before benchmarking.

use crate::{CrawlError, Result};
use reqwest::Client;
use std::time::Duration;

pub struct CandidateSource {
    endpoint: String,
    client: Client,
}

impl CandidateSource {
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }

    /// Fetches the current candidate address list
    ///
    /// Expects a JSON array of "host:port" strings. A non-2xx status or a
    /// malformed body is an error; the refresh cycle logs it and retries on
    /// its next tick.
    pub async fn fetch_candidates(&self) -> Result<Vec<String>> {
        tracing::info!("Fetching candidate proxies from {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|source| CrawlError::Http {
                url: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Payload {
                url: self.endpoint.clone(),
                message: format!("candidate source returned HTTP {}", status),
            });
        }

        let body = response.text().await.map_err(|source| CrawlError::Http {
            url: self.endpoint.clone(),
            source,
        })?;

        let candidates: Vec<String> = serde_json::from_str(&body)?;
        tracing::info!("Candidate source returned {} addresses", candidates.len());
        Ok(candidates)
    }
}
