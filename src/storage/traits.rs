//! Storage traits and error types

use crate::storage::{RegionCount, RegionStat, VideoRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for catalog storage backends
///
/// Implementations provide upsert semantics keyed by the per-record unique
/// identifier, so redelivered pages never duplicate rows.
pub trait CatalogStorage {
    /// Upserts a batch of video records, returning how many were written
    fn upsert_videos(&mut self, records: &[VideoRecord]) -> StorageResult<usize>;

    /// Total videos persisted
    fn count_videos(&self) -> StorageResult<i64>;

    /// Videos persisted for one region
    fn count_videos_in_region(&self, tid: i64) -> StorageResult<i64>;

    /// Per-region persisted counts, largest first
    fn video_counts_by_region(&self) -> StorageResult<Vec<RegionCount>>;

    /// Upserts a scanner-reported region total
    fn upsert_region_stat(&mut self, stat: &RegionStat) -> StorageResult<()>;

    /// All scanner-reported region totals, in tid order
    fn list_region_stats(&self) -> StorageResult<Vec<RegionStat>>;
}
