//! Configuration module for tidepool
//!
//! Handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use tidepool::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawling {} regions", config.regions.len());
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    ApiConfig, BenchmarkMode, Config, CrawlerConfig, FrontierConfig, OutputConfig, ProxyConfig,
    RegionEntry,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
