//! Tidepool: a proxy-rotating catalog page crawler
//!
//! This crate crawls a paginated, regioned video catalog through a pool of
//! rotating forward proxies. Workers pull (region, page) tasks from a shared
//! frontier, fetch listing pages through proxies checked out from a health
//! store, and persist normalized records.

pub mod config;
pub mod crawler;
pub mod frontier;
pub mod proxy;
pub mod storage;

use thiserror::Error;

/// Main error type for tidepool operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected payload from {url}: {message}")]
    Payload { url: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for tidepool operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use frontier::{Frontier, Region, Task};
pub use proxy::{BenchmarkOutcome, Benchmarker, ProxyRecord, ProxySet, ProxyStore};
