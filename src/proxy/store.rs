//! Proxy health store
//!
//! Partitions proxy addresses into three disjoint sets — Good, Bad, Using —
//! and owns the selection policy. All transitions happen under one mutex so
//! an address can never be observed in two sets at once, and a proxy checked
//! out by one worker (Using) is never handed to another.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// A known proxy address with its latest benchmark quality
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyRecord {
    /// host:port
    pub address: String,

    /// Mean latency of successful benchmark attempts, in seconds
    pub latency: f64,

    /// Fraction of benchmark attempts that succeeded, in [0, 1]
    pub success_rate: f64,

    /// When the record was last written
    pub last_checked: DateTime<Utc>,
}

impl ProxyRecord {
    fn new(address: &str, latency: f64, success_rate: f64) -> Self {
        Self {
            address: address.to_string(),
            latency,
            success_rate,
            last_checked: Utc::now(),
        }
    }
}

/// The three health states a proxy address can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxySet {
    Good,
    Bad,
    Using,
}

#[derive(Default)]
struct StoreInner {
    good: HashMap<String, ProxyRecord>,
    bad: HashMap<String, ProxyRecord>,
    using: HashMap<String, ProxyRecord>,
}

impl StoreInner {
    fn set_mut(&mut self, set: ProxySet) -> &mut HashMap<String, ProxyRecord> {
        match set {
            ProxySet::Good => &mut self.good,
            ProxySet::Bad => &mut self.bad,
            ProxySet::Using => &mut self.using,
        }
    }

    fn set_ref(&self, set: ProxySet) -> &HashMap<String, ProxyRecord> {
        match set {
            ProxySet::Good => &self.good,
            ProxySet::Bad => &self.bad,
            ProxySet::Using => &self.using,
        }
    }

    // Inserting into one set always evicts from the other two, so
    // disjointness holds by construction.
    fn insert(&mut self, set: ProxySet, record: ProxyRecord) {
        self.good.remove(&record.address);
        self.bad.remove(&record.address);
        self.using.remove(&record.address);
        self.set_mut(set).insert(record.address.clone(), record);
    }
}

/// Thread-safe partition of proxy addresses into Good / Bad / Using
pub struct ProxyStore {
    inner: Mutex<StoreInner>,
}

impl ProxyStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
        }
    }

    /// Inserts (or overwrites) an address in the Good set
    pub fn add_good(&self, address: &str, latency: f64, success_rate: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner.insert(ProxySet::Good, ProxyRecord::new(address, latency, success_rate));
    }

    /// Inserts (or overwrites) an address in the Bad set
    pub fn add_bad(&self, address: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.insert(ProxySet::Bad, ProxyRecord::new(address, 0.0, 0.0));
    }

    /// Inserts (or overwrites) an address in the Using set
    pub fn add_using(&self, address: &str, latency: f64, success_rate: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner.insert(
            ProxySet::Using,
            ProxyRecord::new(address, latency, success_rate),
        );
    }

    /// Removes an address from the named set; no-op if absent
    pub fn remove(&self, address: &str, set: ProxySet) {
        let mut inner = self.inner.lock().unwrap();
        inner.set_mut(set).remove(address);
    }

    /// Lists the addresses currently in the named set
    pub fn list(&self, set: ProxySet) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.set_ref(set).keys().cloned().collect()
    }

    /// Checks whether an address is present in the named set
    pub fn contains(&self, address: &str, set: ProxySet) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.set_ref(set).contains_key(address)
    }

    /// Checks out the best available proxy
    ///
    /// Picks the Good entry with the highest success rate, breaking ties by
    /// lowest latency, and moves it to Using before returning it. Selection
    /// only ever draws from Good, so an address already checked out cannot
    /// be handed to a second worker.
    pub fn select_best(&self) -> Option<ProxyRecord> {
        let mut inner = self.inner.lock().unwrap();

        let best_address = inner
            .good
            .values()
            .max_by(|a, b| {
                a.success_rate
                    .partial_cmp(&b.success_rate)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| {
                        b.latency
                            .partial_cmp(&a.latency)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
            })
            .map(|record| record.address.clone())?;

        let record = inner.good.remove(&best_address)?;
        inner.using.insert(best_address, record.clone());
        Some(record)
    }

    /// Marks an address as confirmed unusable: Using/Good → Bad
    pub fn drop_proxy(&self, address: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.insert(ProxySet::Bad, ProxyRecord::new(address, 0.0, 0.0));
    }

    /// Marks an address as freshly verified: Using/Bad → Good
    pub fn restore(&self, address: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.insert(ProxySet::Good, ProxyRecord::new(address, 0.0, 1.0));
    }

    /// Drains the Using set, returning the addresses that were reset
    ///
    /// With `flag_as_good` the drained entries move back to Good (keeping
    /// their recorded quality); otherwise they are discarded. Called at
    /// worker-pool startup and shutdown so no address stays stranded in
    /// Using across restarts.
    pub fn reset_using(&self, flag_as_good: bool) -> Vec<String> {
        let mut inner = self.inner.lock().unwrap();
        let drained: Vec<ProxyRecord> = inner.using.drain().map(|(_, record)| record).collect();
        let addresses: Vec<String> = drained.iter().map(|r| r.address.clone()).collect();

        if flag_as_good {
            for record in drained {
                inner.good.insert(record.address.clone(), record);
            }
        }

        addresses
    }

    /// Clears the Good set, returning the prior members
    pub fn empty_good(&self) -> Vec<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.good.drain().map(|(address, _)| address).collect()
    }

    /// Clears the Bad set, returning the prior members
    ///
    /// Housekeeping calls this on a TTL so transiently-bad proxies get
    /// another chance at benchmarking.
    pub fn empty_bad(&self) -> Vec<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.bad.drain().map(|(address, _)| address).collect()
    }

    /// Clears the Using set, returning the prior members
    pub fn empty_using(&self) -> Vec<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.using.drain().map(|(address, _)| address).collect()
    }

    pub fn good_count(&self) -> usize {
        self.inner.lock().unwrap().good.len()
    }

    pub fn bad_count(&self) -> usize {
        self.inner.lock().unwrap().bad.len()
    }

    pub fn using_count(&self) -> usize {
        self.inner.lock().unwrap().using.len()
    }

    /// Addresses known in any set; used to skip re-benchmarking live entries
    pub fn known_addresses(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .good
            .keys()
            .chain(inner.bad.keys())
            .chain(inner.using.keys())
            .cloned()
            .collect()
    }
}

impl Default for ProxyStore {
    fn default() -> Self {
        Self::new()
    }
}
