//! Crawl orchestration
//!
//! Wires the proxy lifecycle, frontier, worker pool, and storage into one
//! running crawl:
//! - an initial candidate fetch + benchmark seeds the health store;
//! - the pool runs one task per worker against the shared frontier;
//! - a refresh cycle periodically forgets the Bad set, benchmarks new
//!   candidates, and resumes parked workers when capacity returns;
//! - a supervisor tick detects frontier completion and shuts down.

mod fetch;
mod pool;
mod record;
mod scan;
mod worker;

pub use fetch::{
    build_page_client, classify, fetch_page, PageData, PageInfo, PageKind, PageResponse,
    SENTINEL_ERROR_CODE,
};
pub use pool::{CrawlStats, WorkerPool};
pub use record::{normalize_archives, parse_archive, RecordError};
pub use scan::run_scan;
pub use worker::{Gate, Worker, WorkerSettings};

use crate::config::Config;
use crate::frontier::{Frontier, Region};
use crate::proxy::{Benchmarker, CandidateSource, ProxyStore};
use crate::storage::open_storage;
use crate::Result;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{interval_at, Instant};

/// One refresh cycle: forget Bad, fetch candidates, benchmark new ones
///
/// Addresses already Good or checked out (Using) are left alone — a Good
/// entry keeps its recorded quality until it actually fails, and touching
/// a Using entry would yank it out from under its worker.
async fn refresh_proxies(
    source: &CandidateSource,
    benchmarker: &Benchmarker,
    store: &ProxyStore,
) -> Result<usize> {
    let forgotten = store.empty_bad();
    if !forgotten.is_empty() {
        tracing::info!("Forgot {} Bad proxies for retry", forgotten.len());
    }

    let candidates = source.fetch_candidates().await?;

    let known: HashSet<String> = store.known_addresses().into_iter().collect();
    let mut seen = HashSet::new();
    let fresh: Vec<String> = candidates
        .into_iter()
        .filter(|address| !known.contains(address) && seen.insert(address.clone()))
        .collect();

    if fresh.is_empty() {
        tracing::info!("No new candidates this cycle");
        return Ok(0);
    }

    let report = benchmarker.batch_test(fresh, store).await;
    Ok(report.accepted)
}

/// Runs the full crawl pipeline until the frontier is exhausted
pub async fn crawl(config: Config) -> Result<()> {
    let storage = open_storage(Path::new(&config.output.database_path))?;
    let storage = Arc::new(Mutex::new(storage));

    let store = Arc::new(ProxyStore::new());
    let regions: Vec<Region> = config.regions.iter().map(Region::from).collect();
    let frontier = Arc::new(Frontier::new(
        regions,
        &config.frontier,
        config.crawler.empty_debounce,
    ));

    let source = CandidateSource::new(&config.proxy.candidate_endpoint)?;
    let benchmarker = Benchmarker::from_config(&config.proxy);

    match refresh_proxies(&source, &benchmarker, &store).await {
        Ok(accepted) => tracing::info!("Initial refresh: {} usable proxies", accepted),
        Err(e) => tracing::warn!("Initial proxy refresh failed: {}", e),
    }

    let stats = Arc::new(CrawlStats::new());
    let pool = WorkerPool::new(
        config.crawler.clone(),
        config.api.clone(),
        Arc::clone(&frontier),
        Arc::clone(&store),
        Arc::clone(&storage),
        Arc::clone(&stats),
    );
    pool.start(config.crawler.workers);

    let refresh_period = Duration::from_secs(config.proxy.refresh_interval);
    let mut refresh_tick = interval_at(Instant::now() + refresh_period, refresh_period);
    let mut poll_tick = tokio::time::interval(Duration::from_secs(1));
    let mut last_report = Instant::now();

    loop {
        tokio::select! {
            _ = refresh_tick.tick() => {
                match refresh_proxies(&source, &benchmarker, &store).await {
                    Ok(accepted) => {
                        tracing::info!(
                            "Refresh cycle: +{} usable ({} Good)",
                            accepted,
                            store.good_count()
                        );
                        if store.good_count() >= config.crawler.resume_threshold {
                            pool.resume(config.crawler.workers);
                        }
                    }
                    Err(e) => tracing::warn!("Proxy refresh failed: {}", e),
                }
            }
            _ = poll_tick.tick() => {
                if frontier.is_terminated() && pool.all_parked() {
                    break;
                }

                if last_report.elapsed() >= Duration::from_secs(30) {
                    last_report = Instant::now();
                    let (tid, pn) = frontier.cursor();
                    tracing::info!(
                        "Progress: {} pages, {} records, {:.2} pages/sec, cursor tid={} pn={}, {} active workers",
                        stats.pages(),
                        stats.records(),
                        stats.pages_per_sec(),
                        tid,
                        pn,
                        pool.active_count()
                    );
                    if let Some(eta) = stats.eta_secs(config.crawler.page_size) {
                        tracing::info!("ETA (largest region): {:.0}s", eta);
                    }
                }
            }
        }
    }

    pool.shutdown().await;

    tracing::info!(
        "Crawl complete: {} pages fetched, {} records persisted",
        stats.pages(),
        stats.records()
    );

    Ok(())
}
