//! Proxy benchmarker
//!
//! Decides which candidate addresses are currently usable as forward
//! proxies, and at what quality. Each candidate gets a fixed number of
//! attempts against the benchmark endpoint; an attempt only counts as a
//! success when the response body satisfies the configured shape predicate,
//! not merely on HTTP 200.

use crate::config::{BenchmarkMode, ProxyConfig};
use crate::proxy::store::ProxyStore;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Proxy};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Delay between attempts against the same candidate
const ATTEMPT_DELAY: Duration = Duration::from_millis(100);

/// Result of benchmarking one candidate address
#[derive(Debug, Clone, PartialEq)]
pub enum BenchmarkOutcome {
    /// Candidate is usable: mean latency of successful attempts and the
    /// fraction of attempts that succeeded
    Accepted { latency: f64, success_rate: f64 },

    /// Candidate failed too many attempts
    Rejected,
}

/// Aggregate counts from a batch run, for observability
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkReport {
    pub total: usize,
    pub accepted: usize,
}

/// Concurrent tester for candidate proxy addresses
pub struct Benchmarker {
    endpoint: String,
    mode: BenchmarkMode,
    retry_count: u32,
    test_timeout: Duration,
    acceptance_threshold: f64,
    concurrency: usize,
}

impl Benchmarker {
    pub fn from_config(config: &ProxyConfig) -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            endpoint: config.benchmark_endpoint.clone(),
            mode: config.benchmark_mode,
            retry_count: config.retry_count,
            test_timeout: Duration::from_secs_f64(config.test_timeout),
            acceptance_threshold: config.acceptance_threshold,
            concurrency: cores * config.tests_per_core,
        }
    }

    /// Tests a single candidate address
    ///
    /// Runs up to `retry_count` attempts through the candidate. A transport
    /// failure is a failed attempt, never an error. Accepts iff the success
    /// rate reaches the acceptance threshold.
    pub async fn test(&self, address: &str) -> BenchmarkOutcome {
        let client = match build_candidate_client(address, self.test_timeout) {
            Ok(client) => client,
            Err(e) => {
                tracing::debug!("Candidate {} rejected at client build: {}", address, e);
                return BenchmarkOutcome::Rejected;
            }
        };

        let mut latencies: Vec<f64> = Vec::new();

        for attempt in 0..self.retry_count {
            if attempt > 0 {
                tokio::time::sleep(ATTEMPT_DELAY).await;
            }

            let started = Instant::now();
            if self.attempt(&client).await {
                latencies.push(started.elapsed().as_secs_f64());
            }
        }

        let success_rate = latencies.len() as f64 / self.retry_count as f64;

        if success_rate >= self.acceptance_threshold {
            let latency = latencies.iter().sum::<f64>() / latencies.len() as f64;
            tracing::debug!(
                "Candidate {} accepted: rate={:.2}, latency={:.3}s",
                address,
                success_rate,
                latency
            );
            BenchmarkOutcome::Accepted {
                latency,
                success_rate,
            }
        } else {
            tracing::trace!("Candidate {} rejected: rate={:.2}", address, success_rate);
            BenchmarkOutcome::Rejected
        }
    }

    async fn attempt(&self, client: &Client) -> bool {
        let response = match client.get(&self.endpoint).send().await {
            Ok(response) => response,
            Err(_) => return false,
        };

        let body = match response.text().await {
            Ok(body) => body,
            Err(_) => return false,
        };

        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(payload) => satisfies_predicate(self.mode, &payload),
            Err(_) => false,
        }
    }

    /// Tests candidates concurrently, reporting each into the store
    ///
    /// Accepted candidates land in Good, rejected ones in Bad. Concurrency
    /// is bounded relative to available parallelism.
    pub async fn batch_test(&self, addresses: Vec<String>, store: &ProxyStore) -> BenchmarkReport {
        let total = addresses.len();
        tracing::info!("Benchmarking {} candidates", total);

        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        let outcomes: Vec<(String, BenchmarkOutcome)> = stream::iter(addresses)
            .map(|address| {
                let sem = Arc::clone(&semaphore);
                async move {
                    let _permit = sem.acquire().await.expect("semaphore closed");
                    let outcome = self.test(&address).await;
                    (address, outcome)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut accepted = 0;
        for (address, outcome) in outcomes {
            match outcome {
                BenchmarkOutcome::Accepted {
                    latency,
                    success_rate,
                } => {
                    store.add_good(&address, latency, success_rate);
                    accepted += 1;
                }
                BenchmarkOutcome::Rejected => store.add_bad(&address),
            }
        }

        tracing::info!("Benchmark done: {}/{} usable", accepted, total);
        BenchmarkReport { total, accepted }
    }
}

/// Builds a client that routes every request through the candidate
fn build_candidate_client(address: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    let proxy = Proxy::all(format!("http://{}", address))?;
    Client::builder()
        .proxy(proxy)
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
}

/// Applies the benchmark mode's shape predicate to a parsed payload
fn satisfies_predicate(mode: BenchmarkMode, payload: &serde_json::Value) -> bool {
    match mode {
        BenchmarkMode::Archives => payload
            .pointer("/data/archives")
            .and_then(|archives| archives.as_array())
            .map(|archives| !archives.is_empty())
            .unwrap_or(false),
        BenchmarkMode::DataObject => payload
            .get("data")
            .map(|data| !data.is_null())
            .unwrap_or(false),
    }
}
