//! Region scanner
//!
//! Walks every configured region once with a one-record page request and
//! records the API-reported catalog totals. Useful before a full crawl to
//! size the work, and afterwards to check coverage. Shares the proxy
//! acquisition and failure handling of the crawl workers, at single-task
//! scale: a network error drops the proxy and puts the region back at the
//! front of the queue.

use crate::config::Config;
use crate::crawler::fetch::{build_page_client, classify, fetch_page, PageKind};
use crate::proxy::{ProxyRecord, ProxyStore};
use crate::storage::{CatalogStorage, RegionStat, SqliteStorage};
use crate::Result;
use chrono::Utc;
use reqwest::Client;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Retries per region probe
const SCAN_RETRY_COUNT: u32 = 10;

/// Seconds between region probes
const SCAN_INTERVAL: f64 = 2.0;

/// Listing pages are sized at 50 records in a full crawl
const CRAWL_PAGE_SIZE: i64 = 50;

struct ScanProxy {
    record: Option<ProxyRecord>,
    client: Client,
}

fn checkout_proxy(store: &ProxyStore, timeout: Duration) -> Result<ScanProxy> {
    let record = store.select_best();
    let address = record.as_ref().map(|r| r.address.clone());

    if let Some(address) = &address {
        tracing::info!("Scanner proxy: [{}]", address);
    } else {
        // Without proxies the scan still runs, directly.
        tracing::warn!("Scanner running without a proxy");
    }

    let client = build_page_client(address.as_deref(), timeout)?;
    Ok(ScanProxy { record, client })
}

/// Scans all configured regions, upserting totals into `region_stats`
pub async fn run_scan(
    config: &Config,
    store: &ProxyStore,
    storage: &mut SqliteStorage,
) -> Result<()> {
    let mut queue: VecDeque<(i64, String)> = config
        .regions
        .iter()
        .map(|r| (r.tid, r.name.clone()))
        .collect();

    let total = queue.len();
    let timeout = Duration::from_secs_f64(config.crawler.timeout);
    let mut proxy = checkout_proxy(store, timeout)?;
    let pacing = Duration::from_secs_f64(SCAN_INTERVAL);
    let mut scanned = 0usize;

    while let Some((tid, name)) = queue.pop_front() {
        let started = Instant::now();
        let task_str = format!("region={}, tid={}", name, tid);
        tracing::info!("[{}/{}] GET: {}", scanned + 1, total, task_str);

        let response = fetch_page(
            &proxy.client,
            &config.api.page_endpoint,
            tid,
            1,
            1,
            SCAN_RETRY_COUNT,
        )
        .await;

        if classify(&response) == PageKind::NetworkError {
            tracing::warn!("BAD: {} [code={}]", task_str, response.code);
            if let Some(record) = proxy.record.take() {
                store.drop_proxy(&record.address);
            }
            proxy = checkout_proxy(store, timeout)?;
            queue.push_front((tid, name));
        } else {
            let videos = response.data.page.count.max(0);
            let pages = (videos + CRAWL_PAGE_SIZE - 1) / CRAWL_PAGE_SIZE;
            tracing::info!("OK: {} - videos count: {}", task_str, videos);

            storage.upsert_region_stat(&RegionStat {
                tid,
                name,
                videos,
                pages,
                scanned_at: Utc::now().to_rfc3339(),
            })?;
            scanned += 1;
        }

        let elapsed = started.elapsed();
        if pacing > elapsed {
            tokio::time::sleep(pacing - elapsed).await;
        }
    }

    tracing::info!("Scan complete: {}/{} regions recorded", scanned, total);
    Ok(())
}
