//! Worker pool
//!
//! Owns a fixed set of crawl workers sharing one frontier and one health
//! store. Workers are paused and resumed through their gates; stopping is
//! cooperative and observed at loop top.

use crate::config::{ApiConfig, CrawlerConfig};
use crate::crawler::worker::{Gate, Worker, WorkerSettings};
use crate::frontier::Frontier;
use crate::proxy::ProxyStore;
use crate::storage::SqliteStorage;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;

/// Shared throughput counters for progress and ETA reporting
pub struct CrawlStats {
    pages: AtomicU64,
    records: AtomicU64,
    /// Largest total count any region has reported, as a scale hint
    reported_total: AtomicI64,
    started: Instant,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            pages: AtomicU64::new(0),
            records: AtomicU64::new(0),
            reported_total: AtomicI64::new(-1),
            started: Instant::now(),
        }
    }

    pub fn record_page(&self, records: u64, reported_total: i64) {
        self.pages.fetch_add(1, Ordering::Relaxed);
        self.records.fetch_add(records, Ordering::Relaxed);
        if reported_total > 0 {
            self.reported_total.fetch_max(reported_total, Ordering::Relaxed);
        }
    }

    pub fn pages(&self) -> u64 {
        self.pages.load(Ordering::Relaxed)
    }

    pub fn records(&self) -> u64 {
        self.records.load(Ordering::Relaxed)
    }

    pub fn pages_per_sec(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.pages() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Rough seconds remaining for the largest region seen so far
    pub fn eta_secs(&self, page_size: u32) -> Option<f64> {
        let total = self.reported_total.load(Ordering::Relaxed);
        if total <= 0 || page_size == 0 {
            return None;
        }

        let total_pages = (total as f64 / page_size as f64).ceil();
        let rate = self.pages_per_sec();
        if rate <= 0.0 {
            return None;
        }

        let remaining = (total_pages - self.pages() as f64).max(0.0);
        Some(remaining / rate)
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

struct WorkerHandle {
    wid: u32,
    gate: Arc<Gate>,
    join: JoinHandle<()>,
}

/// A fixed set of crawl workers over shared frontier and health store
pub struct WorkerPool {
    crawler: CrawlerConfig,
    api: ApiConfig,
    frontier: Arc<Frontier>,
    store: Arc<ProxyStore>,
    storage: Arc<Mutex<SqliteStorage>>,
    stats: Arc<CrawlStats>,
    workers: Mutex<Vec<WorkerHandle>>,
}

impl WorkerPool {
    pub fn new(
        crawler: CrawlerConfig,
        api: ApiConfig,
        frontier: Arc<Frontier>,
        store: Arc<ProxyStore>,
        storage: Arc<Mutex<SqliteStorage>>,
        stats: Arc<CrawlStats>,
    ) -> Self {
        Self {
            crawler,
            api,
            frontier,
            store,
            storage,
            stats,
            workers: Mutex::new(Vec::new()),
        }
    }

    fn settings(&self) -> WorkerSettings {
        WorkerSettings {
            page_endpoint: self.api.page_endpoint.clone(),
            page_size: self.crawler.page_size,
            interval: self.crawler.interval,
            retry_count: self.crawler.retry_count,
            timeout: self.crawler.timeout,
        }
    }

    /// Spawns `n` active workers
    ///
    /// Drains any Using entries left over from an earlier run back to Good
    /// first, so no address stays stranded across restarts.
    pub fn start(&self, n: u32) {
        let stranded = self.store.reset_using(true);
        if !stranded.is_empty() {
            tracing::info!("Reset {} proxies stranded in Using", stranded.len());
        }

        let mut workers = self.workers.lock().unwrap();
        for wid in 0..n {
            let gate = Arc::new(Gate::new());
            gate.activate();

            let worker = Worker::new(
                wid,
                self.settings(),
                Arc::clone(&self.frontier),
                Arc::clone(&self.store),
                Arc::clone(&self.storage),
                Arc::clone(&self.stats),
                Arc::clone(&gate),
            );

            let join = tokio::spawn(worker.run());
            workers.push(WorkerHandle { wid, gate, join });
        }

        tracing::info!("Started {} workers", n);
    }

    /// Cooperatively pauses every worker
    pub fn stop(&self) {
        let workers = self.workers.lock().unwrap();
        for handle in workers.iter() {
            handle.gate.deactivate();
        }
        tracing::info!("Deactivated {} workers", workers.len());
    }

    /// Reactivates up to `n` paused workers; returns how many were resumed
    ///
    /// Called when proxy capacity comes back, e.g. after a refresh cycle
    /// lands new Good entries.
    pub fn resume(&self, n: u32) -> u32 {
        let workers = self.workers.lock().unwrap();
        let mut resumed = 0;

        for handle in workers.iter() {
            if resumed >= n {
                break;
            }
            if !handle.gate.is_active() && !handle.gate.is_stopped() {
                handle.gate.activate();
                tracing::debug!("Resumed worker {}", handle.wid);
                resumed += 1;
            }
        }

        if resumed > 0 {
            tracing::info!("Resumed {} workers", resumed);
        }
        resumed
    }

    pub fn active_count(&self) -> usize {
        let workers = self.workers.lock().unwrap();
        workers.iter().filter(|h| h.gate.is_active()).count()
    }

    /// True when every worker has deactivated itself (or was paused)
    pub fn all_parked(&self) -> bool {
        let workers = self.workers.lock().unwrap();
        workers.iter().all(|h| !h.gate.is_active())
    }

    /// Stops gates, joins tasks, and unstrands Using entries
    pub async fn shutdown(&self) {
        let handles: Vec<WorkerHandle> = {
            let mut workers = self.workers.lock().unwrap();
            workers.drain(..).collect()
        };

        for handle in &handles {
            handle.gate.stop();
        }
        for handle in handles {
            if let Err(e) = handle.join.await {
                tracing::warn!("Worker {} join error: {}", handle.wid, e);
            }
        }

        let stranded = self.store.reset_using(true);
        if !stranded.is_empty() {
            tracing::info!("Returned {} proxies from Using at shutdown", stranded.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrontierConfig;
    use crate::frontier::Region;

    fn test_pool(regions: Vec<Region>) -> WorkerPool {
        let crawler = CrawlerConfig {
            workers: 2,
            page_size: 50,
            interval: 0.0,
            retry_count: 1,
            timeout: 0.5,
            empty_debounce: 1,
            resume_threshold: 1,
        };
        let api = ApiConfig {
            page_endpoint: "http://127.0.0.1:9/newlist".to_string(),
        };
        let frontier = Arc::new(Frontier::new(regions, &FrontierConfig::default(), 1));
        let store = Arc::new(ProxyStore::new());
        let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
        let stats = Arc::new(CrawlStats::new());

        WorkerPool::new(crawler, api, frontier, store, storage, stats)
    }

    #[test]
    fn test_stats_counters() {
        let stats = CrawlStats::new();
        stats.record_page(50, 104);
        stats.record_page(50, -1);

        assert_eq!(stats.pages(), 2);
        assert_eq!(stats.records(), 100);
    }

    #[test]
    fn test_stats_eta_needs_total() {
        let stats = CrawlStats::new();
        assert!(stats.eta_secs(50).is_none());

        stats.record_page(50, 500);
        // Rate is positive and a total is known, so an estimate exists.
        assert!(stats.eta_secs(50).is_some());
    }

    #[tokio::test]
    async fn test_pool_start_resume_shutdown() {
        let pool = test_pool(vec![Region {
            tid: 1,
            name: "A".to_string(),
            parent: String::new(),
        }]);

        // No proxies in the store: workers park themselves immediately.
        pool.start(2);
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert!(pool.all_parked());
        assert_eq!(pool.active_count(), 0);

        // Still no Good proxies, so resumed workers park again.
        let resumed = pool.resume(2);
        assert_eq!(resumed, 2);

        pool.shutdown().await;
        assert!(pool.workers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pool_stop_parks_workers() {
        let pool = test_pool(vec![Region {
            tid: 1,
            name: "A".to_string(),
            parent: String::new(),
        }]);

        pool.start(2);
        pool.stop();
        assert!(pool.all_parked());

        pool.shutdown().await;
    }
}
