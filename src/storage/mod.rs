//! Storage module for persisting crawl data
//!
//! Handles all database operations for the crawler:
//! - SQLite database initialization and schema management
//! - Video record upserts keyed by bvid
//! - Per-region totals written by the scanner

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{CatalogStorage, StorageError, StorageResult};

use crate::CrawlError;
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, CrawlError> {
    SqliteStorage::new(path)
}

/// A normalized catalog video record; `bvid` is the upsert key
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRecord {
    pub bvid: String,
    pub aid: i64,
    pub cid: Option<String>,
    pub tid: i64,
    pub tname: String,
    pub title: String,
    pub description: String,
    pub pic: String,
    pub pubdate: i64,
    pub ctime: i64,
    pub duration: i64,
    pub videos: i64,
    pub copyright: i64,
    pub owner_mid: i64,
    pub owner_name: String,
    pub stat_view: i64,
    pub stat_danmaku: i64,
    pub stat_reply: i64,
    pub stat_favorite: i64,
    pub stat_coin: i64,
    pub stat_share: i64,
    pub stat_like: i64,
}

/// Per-region catalog totals recorded by the scanner
#[derive(Debug, Clone, PartialEq)]
pub struct RegionStat {
    pub tid: i64,
    pub name: String,
    /// Total videos the API reports for the region
    pub videos: i64,
    /// Listing pages at the standard page size of 50
    pub pages: i64,
    pub scanned_at: String,
}

/// Per-region video counts from the videos table, for stats output
#[derive(Debug, Clone)]
pub struct RegionCount {
    pub tid: i64,
    pub tname: String,
    pub count: i64,
}
