//! Crawl worker
//!
//! Each worker runs its own task loop: pull a (region, page) task from the
//! shared frontier, fetch it through the proxy currently checked out from
//! the health store, classify the response, and drive the frontier and
//! store transitions. Pause and stop are cooperative, observed at the top
//! of the loop; an in-flight fetch always runs to completion or timeout.

use crate::crawler::fetch::{build_page_client, classify, fetch_page, PageKind, PageResponse};
use crate::crawler::pool::CrawlStats;
use crate::crawler::record::normalize_archives;
use crate::frontier::Frontier;
use crate::proxy::{ProxyRecord, ProxyStore};
use crate::storage::{CatalogStorage, SqliteStorage};
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Cooperative activity gate for one worker
///
/// The async analogue of a condition variable guarding an `active` flag:
/// a worker blocks in `wait_active` while paused and is woken by
/// `activate`. `stop` is final and makes `wait_active` return false.
pub struct Gate {
    active: AtomicBool,
    stopped: AtomicBool,
    notify: Notify,
}

impl Gate {
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    pub fn activate(&self) {
        self.active.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Blocks until the gate is active; returns false once stopped
    pub async fn wait_active(&self) -> bool {
        loop {
            if self.is_stopped() {
                return false;
            }
            if self.is_active() {
                return true;
            }

            let mut notified = std::pin::pin!(self.notify.notified());
            notified.as_mut().enable();
            // Re-check after registering the waiter so a wakeup between
            // the check and the await is not lost.
            if self.is_stopped() {
                return false;
            }
            if self.is_active() {
                return true;
            }
            notified.await;
        }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-worker settings snapshot, taken from the config at pool start
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub page_endpoint: String,
    pub page_size: u32,
    pub interval: f64,
    pub retry_count: u32,
    pub timeout: f64,
}

/// One crawl worker; owns its proxy assignment and HTTP client
pub struct Worker {
    wid: u32,
    settings: WorkerSettings,
    frontier: Arc<Frontier>,
    store: Arc<ProxyStore>,
    storage: Arc<Mutex<SqliteStorage>>,
    stats: Arc<CrawlStats>,
    gate: Arc<Gate>,
    proxy: Option<ProxyRecord>,
    client: Option<Client>,
}

impl Worker {
    pub fn new(
        wid: u32,
        settings: WorkerSettings,
        frontier: Arc<Frontier>,
        store: Arc<ProxyStore>,
        storage: Arc<Mutex<SqliteStorage>>,
        stats: Arc<CrawlStats>,
        gate: Arc<Gate>,
    ) -> Self {
        Self {
            wid,
            settings,
            frontier,
            store,
            storage,
            stats,
            gate,
            proxy: None,
            client: None,
        }
    }

    /// Checks out a proxy when none is assigned; false when none available
    ///
    /// A worker that cannot get a proxy parks itself; the refresh cycle
    /// resumes parked workers once Good capacity returns.
    fn ensure_proxy(&mut self) -> bool {
        if self.proxy.is_some() {
            return true;
        }

        match self.store.select_best() {
            Some(record) => {
                let timeout = Duration::from_secs_f64(self.settings.timeout);
                match build_page_client(Some(&record.address), timeout) {
                    Ok(client) => {
                        tracing::info!("Worker {} with new proxy: [{}]", self.wid, record.address);
                        self.proxy = Some(record);
                        self.client = Some(client);
                        true
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Worker {}: unusable proxy address {}: {}",
                            self.wid,
                            record.address,
                            e
                        );
                        self.store.drop_proxy(&record.address);
                        false
                    }
                }
            }
            None => {
                tracing::warn!("Worker {}: no usable proxy, pausing", self.wid);
                self.gate.deactivate();
                false
            }
        }
    }

    /// Drops the current proxy as unusable and tries to check out another
    fn swap_proxy(&mut self) -> bool {
        if let Some(record) = self.proxy.take() {
            self.store.drop_proxy(&record.address);
        }
        self.client = None;
        self.ensure_proxy()
    }

    fn persist(&self, response: &PageResponse, task_str: &str) {
        let records = normalize_archives(&response.data.archives);

        let total = response.data.page.count;
        let current = response.data.page.num * response.data.page.size;
        let progress = if total > 0 {
            (current as f64 / total as f64 * 100.0).min(100.0)
        } else {
            0.0
        };
        tracing::info!(
            "GOOD: {} <{} videos> [{}/{}] [{:.2}%]",
            task_str,
            records.len(),
            current,
            total,
            progress
        );

        let written = {
            let mut storage = self.storage.lock().unwrap();
            storage.upsert_videos(&records)
        };

        match written {
            Ok(count) => self.stats.record_page(count as u64, total),
            Err(e) => {
                // Persistence failures cost one page of data, never the worker.
                tracing::error!("Worker {}: failed to persist {}: {}", self.wid, task_str, e);
                self.stats.record_page(0, total);
            }
        }
    }

    /// The worker loop; runs until the gate is stopped
    pub async fn run(mut self) {
        let mut retired = false;
        let pacing = Duration::from_secs_f64(self.settings.interval);

        loop {
            if !self.gate.wait_active().await {
                break;
            }

            let started = Instant::now();

            if self.frontier.is_terminated() {
                self.gate.deactivate();
                if !retired {
                    tracing::info!("==================== [Terminated] ({:>2}) ====================", self.wid);
                    retired = true;
                }
                continue;
            }

            let (tid, pn) = self.frontier.next();
            if tid == -1 && pn == -1 {
                continue;
            }

            if !self.ensure_proxy() {
                // Task goes back so another worker (or this one, resumed)
                // picks it up.
                self.frontier.requeue(tid, pn);
                continue;
            }
            let Some(client) = self.client.clone() else {
                self.frontier.requeue(tid, pn);
                continue;
            };

            let task_str = format!(
                "region={}, tid={}, pn={}, wid={:>2}",
                self.frontier.region_name(tid),
                tid,
                pn,
                self.wid
            );
            tracing::info!("GET: {}", task_str);

            let response = fetch_page(
                &client,
                &self.settings.page_endpoint,
                tid,
                pn,
                self.settings.page_size,
                self.settings.retry_count,
            )
            .await;

            match classify(&response) {
                PageKind::NetworkError => {
                    tracing::warn!("BAD: {} [code={}]", task_str, response.code);
                    tracing::warn!("  {}", response.message);
                    self.swap_proxy();
                    self.frontier.requeue(tid, pn);
                }
                PageKind::EndOfRegion => {
                    self.frontier.note_empty_page(tid);
                }
                PageKind::Normal => {
                    self.frontier.note_filled_page(tid);
                    self.persist(&response, &task_str);
                }
            }

            let elapsed = started.elapsed();
            if pacing > elapsed {
                tokio::time::sleep(pacing - elapsed).await;
            }
        }

        tracing::debug!("Worker {} stopped", self.wid);
    }
}
