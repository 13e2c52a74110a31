use crate::config::types::{ApiConfig, Config, CrawlerConfig, ProxyConfig, RegionEntry};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_api_config(&config.api)?;
    validate_proxy_config(&config.proxy)?;
    validate_regions(&config.regions)?;
    validate_output_config(config)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 256 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 256, got {}",
            config.workers
        )));
    }

    if config.page_size < 1 || config.page_size > 100 {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and 100, got {}",
            config.page_size
        )));
    }

    if config.interval < 0.0 {
        return Err(ConfigError::Validation(format!(
            "interval must be non-negative, got {}",
            config.interval
        )));
    }

    if config.retry_count < 1 {
        return Err(ConfigError::Validation(format!(
            "retry-count must be >= 1, got {}",
            config.retry_count
        )));
    }

    if config.timeout <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "timeout must be positive, got {}",
            config.timeout
        )));
    }

    if config.empty_debounce < 1 {
        return Err(ConfigError::Validation(format!(
            "empty-debounce must be >= 1, got {}",
            config.empty_debounce
        )));
    }

    Ok(())
}

fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    Url::parse(&config.page_endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid page-endpoint: {}", e)))?;
    Ok(())
}

fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    Url::parse(&config.candidate_endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid candidate-endpoint: {}", e)))?;

    Url::parse(&config.benchmark_endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid benchmark-endpoint: {}", e)))?;

    if config.retry_count < 1 {
        return Err(ConfigError::Validation(format!(
            "proxy retry-count must be >= 1, got {}",
            config.retry_count
        )));
    }

    if config.test_timeout <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "test-timeout must be positive, got {}",
            config.test_timeout
        )));
    }

    if config.acceptance_threshold <= 0.0 || config.acceptance_threshold > 1.0 {
        return Err(ConfigError::Validation(format!(
            "acceptance-threshold must be in (0, 1], got {}",
            config.acceptance_threshold
        )));
    }

    if config.tests_per_core < 1 {
        return Err(ConfigError::Validation(format!(
            "tests-per-core must be >= 1, got {}",
            config.tests_per_core
        )));
    }

    Ok(())
}

fn validate_regions(regions: &[RegionEntry]) -> Result<(), ConfigError> {
    if regions.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[regions]] entry is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for region in regions {
        if region.tid < 0 {
            return Err(ConfigError::Validation(format!(
                "region tid must be non-negative, got {}",
                region.tid
            )));
        }
        if region.name.is_empty() {
            return Err(ConfigError::Validation(format!(
                "region {} has an empty name",
                region.tid
            )));
        }
        if !seen.insert(region.tid) {
            return Err(ConfigError::Validation(format!(
                "duplicate region tid: {}",
                region.tid
            )));
        }
    }

    Ok(())
}

fn validate_output_config(config: &Config) -> Result<(), ConfigError> {
    if config.output.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{BenchmarkMode, FrontierConfig, OutputConfig};

    fn valid_config() -> Config {
        Config {
            crawler: CrawlerConfig {
                workers: 4,
                page_size: 50,
                interval: 2.5,
                retry_count: 15,
                timeout: 2.5,
                empty_debounce: 5,
                resume_threshold: 3,
            },
            api: ApiConfig {
                page_endpoint: "https://api.example.com/newlist".to_string(),
            },
            proxy: ProxyConfig {
                candidate_endpoint: "http://127.0.0.1:8001/proxies".to_string(),
                benchmark_endpoint: "https://api.example.com/newlist?rid=95".to_string(),
                benchmark_mode: BenchmarkMode::Archives,
                retry_count: 5,
                test_timeout: 1.0,
                acceptance_threshold: 0.2,
                refresh_interval: 300,
                tests_per_core: 16,
            },
            frontier: FrontierConfig::default(),
            output: OutputConfig {
                database_path: "./catalog.db".to_string(),
            },
            regions: vec![RegionEntry {
                tid: 95,
                name: "Mobile".to_string(),
                parent: "tech".to_string(),
            }],
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = valid_config();
        config.crawler.workers = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        let mut config = valid_config();
        config.api.page_endpoint = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let mut config = valid_config();
        config.proxy.acceptance_threshold = 1.5;
        assert!(validate(&config).is_err());

        config.proxy.acceptance_threshold = 0.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_regions_rejected() {
        let mut config = valid_config();
        config.regions.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_duplicate_tid_rejected() {
        let mut config = valid_config();
        let dup = config.regions[0].clone();
        config.regions.push(dup);
        assert!(validate(&config).is_err());
    }
}
