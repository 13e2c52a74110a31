//! Tidepool main entry point
//!
//! Command-line interface for the tidepool catalog crawler.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tidepool::config::load_config_with_hash;
use tidepool::crawler::{crawl, run_scan};
use tidepool::proxy::{Benchmarker, CandidateSource, ProxySet, ProxyStore};
use tidepool::storage::{open_storage, CatalogStorage};
use tracing_subscriber::EnvFilter;

/// Tidepool: a proxy-rotating catalog page crawler
///
/// Tidepool enumerates a paginated video catalog region by region, fetching
/// listing pages through a rotating pool of benchmarked forward proxies and
/// persisting normalized records to SQLite.
#[derive(Parser, Debug)]
#[command(name = "tidepool")]
#[command(version = "1.0.0")]
#[command(about = "A proxy-rotating catalog page crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full crawl pipeline (default)
    Crawl,
    /// Fetch candidates, run one benchmark cycle, and print the results
    Probe,
    /// Record API-reported totals for every configured region
    Scan,
    /// Show persisted record counts and exit
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match cli.command.unwrap_or(Commands::Crawl) {
        Commands::Crawl => handle_crawl(config).await?,
        Commands::Probe => handle_probe(&config).await?,
        Commands::Scan => handle_scan(&config).await?,
        Commands::Stats => handle_stats(&config)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tidepool=info,warn"),
            1 => EnvFilter::new("tidepool=debug,info"),
            2 => EnvFilter::new("tidepool=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the main crawl operation
async fn handle_crawl(config: tidepool::Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Crawling {} regions with {} workers",
        config.regions.len(),
        config.crawler.workers
    );

    match crawl(config).await {
        Ok(()) => {
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the probe mode: one candidate fetch + benchmark cycle
async fn handle_probe(config: &tidepool::Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Tidepool Proxy Probe ===\n");

    let source = CandidateSource::new(&config.proxy.candidate_endpoint)?;
    let candidates = source.fetch_candidates().await?;
    println!("Candidates fetched: {}", candidates.len());

    let store = ProxyStore::new();
    let benchmarker = Benchmarker::from_config(&config.proxy);
    let report = benchmarker.batch_test(candidates, &store).await;

    println!("Usable: {}/{}\n", report.accepted, report.total);

    let mut good = store.list(ProxySet::Good);
    good.sort();
    for address in good {
        println!("  + {}", address);
    }

    Ok(())
}

/// Handles the scan mode: record per-region catalog totals
async fn handle_scan(config: &tidepool::Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut storage = open_storage(std::path::Path::new(&config.output.database_path))?;

    let store = ProxyStore::new();
    let source = CandidateSource::new(&config.proxy.candidate_endpoint)?;
    let benchmarker = Benchmarker::from_config(&config.proxy);

    match source.fetch_candidates().await {
        Ok(candidates) => {
            benchmarker.batch_test(candidates, &store).await;
        }
        Err(e) => tracing::warn!("Proxy refresh failed, scanning without proxies: {}", e),
    }

    run_scan(config, &store, &mut storage).await?;

    for stat in storage.list_region_stats()? {
        println!(
            "  {:<24} tid={:<6} videos={:<10} pages={}",
            stat.name, stat.tid, stat.videos, stat.pages
        );
    }

    Ok(())
}

/// Handles the stats mode: persisted record counts per region
fn handle_stats(config: &tidepool::Config) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(std::path::Path::new(&config.output.database_path))?;

    println!("Database: {}\n", config.output.database_path);
    println!("Total videos: {}\n", storage.count_videos()?);

    for count in storage.video_counts_by_region()? {
        println!("  {:<24} tid={:<6} {}", count.tname, count.tid, count.count);
    }

    let region_stats = storage.list_region_stats()?;
    if !region_stats.is_empty() {
        println!("\nScanned totals:");
        for stat in region_stats {
            println!(
                "  {:<24} tid={:<6} videos={:<10} (scanned {})",
                stat.name, stat.tid, stat.videos, stat.scanned_at
            );
        }
    }

    Ok(())
}
