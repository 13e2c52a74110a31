use serde::Deserialize;

/// Main configuration structure for tidepool
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub api: ApiConfig,
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub frontier: FrontierConfig,
    pub output: OutputConfig,
    pub regions: Vec<RegionEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of crawl workers to run
    pub workers: u32,

    /// Number of records requested per page
    #[serde(rename = "page-size")]
    pub page_size: u32,

    /// Minimum seconds between requests per worker
    pub interval: f64,

    /// Transport-level retry attempts per page fetch
    #[serde(rename = "retry-count")]
    pub retry_count: u32,

    /// Per-attempt timeout in seconds
    pub timeout: f64,

    /// Consecutive empty pages required to call a region exhausted
    #[serde(rename = "empty-debounce", default = "default_empty_debounce")]
    pub empty_debounce: u32,

    /// Good-proxy count at which paused workers are reactivated
    #[serde(rename = "resume-threshold", default = "default_resume_threshold")]
    pub resume_threshold: usize,
}

/// Catalog API endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Listing-page endpoint, queried with rid/pn/ps
    #[serde(rename = "page-endpoint")]
    pub page_endpoint: String,
}

/// Proxy sourcing and benchmarking configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Endpoint returning the full candidate address list
    #[serde(rename = "candidate-endpoint")]
    pub candidate_endpoint: String,

    /// Endpoint each candidate is benchmarked against
    #[serde(rename = "benchmark-endpoint")]
    pub benchmark_endpoint: String,

    /// Success predicate applied to benchmark responses
    #[serde(rename = "benchmark-mode", default)]
    pub benchmark_mode: BenchmarkMode,

    /// Attempts per candidate
    #[serde(rename = "retry-count", default = "default_probe_retries")]
    pub retry_count: u32,

    /// Per-attempt timeout in seconds
    #[serde(rename = "test-timeout", default = "default_test_timeout")]
    pub test_timeout: f64,

    /// Minimum success rate for a candidate to be accepted as Good
    #[serde(rename = "acceptance-threshold", default = "default_acceptance")]
    pub acceptance_threshold: f64,

    /// Seconds between refresh cycles; also how long Bad entries are remembered
    #[serde(rename = "refresh-interval", default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// Concurrent benchmark tests per available core
    #[serde(rename = "tests-per-core", default = "default_tests_per_core")]
    pub tests_per_core: usize,
}

/// Shape predicate for a successful benchmark response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BenchmarkMode {
    /// `data.archives` must be a non-empty array
    #[default]
    Archives,
    /// A non-null `data` object must be present
    DataObject,
}

/// Frontier cursor boundaries; -1 means unset
#[derive(Debug, Clone, Deserialize)]
pub struct FrontierConfig {
    #[serde(rename = "start-tid", default = "default_unset")]
    pub start_tid: i64,

    #[serde(rename = "start-pn", default = "default_unset")]
    pub start_pn: i64,

    #[serde(rename = "end-tid", default = "default_unset")]
    pub end_tid: i64,

    #[serde(rename = "end-pn", default = "default_unset")]
    pub end_pn: i64,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            start_tid: -1,
            start_pn: -1,
            end_tid: -1,
            end_pn: -1,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// A catalog region to enumerate, in crawl order
#[derive(Debug, Clone, Deserialize)]
pub struct RegionEntry {
    /// Opaque region id used in API requests
    pub tid: i64,

    /// Human-readable region name
    pub name: String,

    /// Parent grouping code
    #[serde(default)]
    pub parent: String,
}

fn default_unset() -> i64 {
    -1
}

fn default_empty_debounce() -> u32 {
    5
}

fn default_resume_threshold() -> usize {
    3
}

fn default_probe_retries() -> u32 {
    5
}

fn default_test_timeout() -> f64 {
    1.0
}

fn default_acceptance() -> f64 {
    0.2
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_tests_per_core() -> usize {
    16
}
