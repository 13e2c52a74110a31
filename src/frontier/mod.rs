//! Crawl frontier: the (region, page) task generator
//!
//! A finite state machine over an ordered region list plus a page cursor
//! and a pending queue, guarded by one lock and safe for concurrent
//! workers. Requeued tasks take precedence over normal progression so no
//! in-flight work is lost; region exhaustion is debounced because a single
//! empty page can be a transient proxy artifact rather than a real end.

use crate::config::{FrontierConfig, RegionEntry};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// A (tid, pn) pair; the sentinel (-1, -1) marks frontier completion
pub type Task = (i64, i64);

/// Returned forever once every region is exhausted
pub const SENTINEL_TASK: Task = (-1, -1);

/// A catalog region in crawl order
#[derive(Debug, Clone)]
pub struct Region {
    pub tid: i64,
    pub name: String,
    pub parent: String,
}

impl From<&RegionEntry> for Region {
    fn from(entry: &RegionEntry) -> Self {
        Self {
            tid: entry.tid,
            name: entry.name.clone(),
            parent: entry.parent.clone(),
        }
    }
}

struct FrontierInner {
    tid_idx: usize,
    tid: i64,
    pn: i64,
    end_tid_idx: usize,
    end_pn: i64,
    current_exhausted: bool,
    exhausted: HashSet<i64>,
    queue: VecDeque<Task>,
    empty_streaks: HashMap<i64, u32>,
}

/// Stateful enumerator of (region, page) tasks with a retry queue
pub struct Frontier {
    regions: Vec<Region>,
    empty_debounce: u32,
    inner: Mutex<FrontierInner>,
}

impl Frontier {
    /// Builds a frontier over the given regions
    ///
    /// The cursor starts at `start-tid`/`start-pn` when configured (and the
    /// tid is known), else at the first region, page 0. The initial task is
    /// seeded into the queue so the very first `next()` returns it.
    pub fn new(regions: Vec<Region>, bounds: &FrontierConfig, empty_debounce: u32) -> Self {
        let tid_idx = if bounds.start_tid != -1 {
            regions
                .iter()
                .position(|r| r.tid == bounds.start_tid)
                .unwrap_or(0)
        } else {
            0
        };

        let pn = if bounds.start_pn != -1 {
            bounds.start_pn
        } else {
            0
        };

        let tid = regions.get(tid_idx).map(|r| r.tid).unwrap_or(-1);

        let end_tid_idx = if bounds.end_tid != -1 {
            regions
                .iter()
                .position(|r| r.tid == bounds.end_tid)
                .unwrap_or(regions.len())
        } else {
            regions.len()
        };

        let mut queue = VecDeque::new();
        queue.push_back((tid, pn));

        tracing::info!(
            "Frontier over {} regions, starting at tid={}, pn={}",
            regions.len(),
            tid,
            pn
        );

        Self {
            regions,
            empty_debounce,
            inner: Mutex::new(FrontierInner {
                tid_idx,
                tid,
                pn,
                end_tid_idx,
                end_pn: bounds.end_pn,
                current_exhausted: false,
                exhausted: HashSet::new(),
                queue,
                empty_streaks: HashMap::new(),
            }),
        }
    }

    /// Returns the next task to work on
    ///
    /// Pending (requeued) tasks come first. Once every region is exhausted
    /// the sentinel (-1, -1) is returned forever.
    pub fn next(&self) -> Task {
        let mut inner = self.inner.lock().unwrap();

        if let Some(task) = inner.queue.pop_front() {
            return task;
        }

        if inner.tid == -1 && inner.pn == -1 {
            return SENTINEL_TASK;
        }

        if inner.current_exhausted {
            inner.tid_idx += 1;
            if inner.tid_idx < self.regions.len() {
                inner.tid = self.regions[inner.tid_idx].tid;
                inner.pn = 1;
            } else {
                inner.tid = -1;
                inner.pn = -1;
            }
            inner.current_exhausted = false;
        } else {
            inner.pn += 1;
        }

        (inner.tid, inner.pn)
    }

    /// Pushes a task to the front of the queue for redelivery
    ///
    /// Used when a fetch failed for transport/proxy reasons: the task is
    /// redelivered by a subsequent `next()` before normal progression, on
    /// whichever worker asks first.
    pub fn requeue(&self, tid: i64, pn: i64) {
        let mut inner = self.inner.lock().unwrap();
        inner.queue.push_front((tid, pn));
    }

    /// Flags a region as fully crawled; idempotent
    ///
    /// Only the first call for a given tid has effect, so concurrent
    /// workers observing emptiness together advance the region index once.
    pub fn flag_region_exhausted(&self, tid: i64) {
        let mut inner = self.inner.lock().unwrap();
        self.flag_locked(&mut inner, tid);
    }

    fn flag_locked(&self, inner: &mut FrontierInner, tid: i64) {
        if inner.exhausted.insert(tid) {
            if tid == inner.tid {
                inner.current_exhausted = true;
            }
            tracing::info!(
                "End of region: {} (tid={}, pn={})",
                self.region_name(tid),
                tid,
                inner.pn
            );
        }
    }

    /// Records an empty-archive response for a region; debounced
    ///
    /// The region is only flagged exhausted after `empty_debounce`
    /// consecutive empty pages. Returns whether the region is now (or was
    /// already) exhausted.
    pub fn note_empty_page(&self, tid: i64) -> bool {
        let mut inner = self.inner.lock().unwrap();

        if inner.exhausted.contains(&tid) {
            return true;
        }

        let streak = {
            let counter = inner.empty_streaks.entry(tid).or_insert(0);
            *counter += 1;
            *counter
        };

        if streak >= self.empty_debounce {
            self.flag_locked(&mut inner, tid);
            true
        } else {
            tracing::debug!(
                "Empty page for tid={} ({}/{} before exhaustion)",
                tid,
                streak,
                self.empty_debounce
            );
            false
        }
    }

    /// Records a non-empty response, resetting the region's empty streak
    pub fn note_filled_page(&self, tid: i64) {
        let mut inner = self.inner.lock().unwrap();
        inner.empty_streaks.insert(tid, 0);
    }

    /// True once no pending tasks remain and the cursor is past the end
    pub fn is_terminated(&self) -> bool {
        let inner = self.inner.lock().unwrap();

        if !inner.queue.is_empty() {
            return false;
        }
        if inner.tid == -1 && inner.pn == -1 {
            return true;
        }
        inner.tid_idx >= inner.end_tid_idx && inner.pn >= inner.end_pn
    }

    /// Human-readable name for a region, for log lines
    pub fn region_name(&self, tid: i64) -> String {
        self.regions
            .iter()
            .find(|r| r.tid == tid)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Current (tid, pn) cursor, for progress logging
    pub fn cursor(&self) -> Task {
        let inner = self.inner.lock().unwrap();
        (inner.tid, inner.pn)
    }
}
