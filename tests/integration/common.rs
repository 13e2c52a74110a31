//! Shared fixtures for integration tests

use serde_json::{json, Value};
use tidepool::config::{
    ApiConfig, BenchmarkMode, Config, CrawlerConfig, FrontierConfig, OutputConfig, ProxyConfig,
    RegionEntry,
};

/// Builds a config pointing every endpoint at the given mock server URI
pub fn test_config(server_uri: &str, db_path: &str, regions: Vec<(i64, &str)>) -> Config {
    Config {
        crawler: CrawlerConfig {
            workers: 1,
            page_size: 50,
            interval: 0.0,
            retry_count: 2,
            timeout: 2.0,
            empty_debounce: 1,
            resume_threshold: 1,
        },
        api: ApiConfig {
            page_endpoint: format!("{}/newlist", server_uri),
        },
        proxy: ProxyConfig {
            candidate_endpoint: format!("{}/proxies", server_uri),
            benchmark_endpoint: format!("{}/benchlist", server_uri),
            benchmark_mode: BenchmarkMode::Archives,
            retry_count: 2,
            test_timeout: 2.0,
            acceptance_threshold: 0.2,
            refresh_interval: 600,
            tests_per_core: 4,
        },
        frontier: FrontierConfig {
            start_tid: -1,
            start_pn: 1,
            end_tid: -1,
            end_pn: -1,
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
        regions: regions
            .into_iter()
            .map(|(tid, name)| RegionEntry {
                tid,
                name: name.to_string(),
                parent: String::new(),
            })
            .collect(),
    }
}

/// Extracts "host:port" from a mock server URI like "http://127.0.0.1:4321"
pub fn host_port(server_uri: &str) -> String {
    server_uri
        .strip_prefix("http://")
        .expect("mock server uri is http")
        .to_string()
}

/// A listing-page payload with the given archives
pub fn page_body(archives: Vec<Value>, total: i64, pn: i64, ps: i64) -> Value {
    json!({
        "code": 0,
        "message": "0",
        "data": {
            "archives": archives,
            "page": {"count": total, "num": pn, "size": ps}
        }
    })
}

/// A minimal archive object for one video
pub fn archive(bvid: &str, tid: i64, tname: &str) -> Value {
    json!({
        "bvid": bvid,
        "aid": 1000,
        "tid": tid,
        "tname": tname,
        "title": format!("video {}", bvid),
        "pubdate": 1700000000,
        "duration": 120,
        "owner": {"mid": 1, "name": "up"},
        "stat": {"view": 10, "danmaku": 0, "reply": 0, "favorite": 0,
                 "coin": 0, "share": 0, "like": 1}
    })
}
