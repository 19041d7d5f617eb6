//! Carroya scraper main entry point
//!
//! This is the command-line interface for the carroya.com listing crawler.

use carroya_scraper::config::{load_config_with_hash, validate, Config};
use carroya_scraper::crawler::crawl;
use carroya_scraper::output::print_statistics;
use carroya_scraper::StopReason;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code when a later page failed and partial results were written
const EXIT_PARTIAL: u8 = 2;

/// Exit code when the first page failed and empty results were written
const EXIT_FIRST_PAGE_FAILED: u8 = 3;

/// Carroya scraper: collects new and used vehicle listings
///
/// Walks every results page of carroya.com and writes the new and used
/// vehicle offers it finds to JSON files. Runs on built-in defaults when
/// no configuration file is given.
#[derive(Parser, Debug)]
#[command(name = "carroya-scraper")]
#[command(version = "1.0.0")]
#[command(about = "Collects vehicle listings from carroya.com", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Directory for the JSON result files
    #[arg(long, value_name = "DIR")]
    out_dir: Option<String>,

    /// Directory for traces of failing pages
    #[arg(long, value_name = "DIR")]
    trace_dir: Option<String>,

    /// Highest page number to request
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Drop listings whose id was already seen
    #[arg(long)]
    dedupe: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return ExitCode::SUCCESS;
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("carroya_scraper=info,warn"),
            1 => EnvFilter::new("carroya_scraper=debug,info"),
            2 => EnvFilter::new("carroya_scraper=trace,debug"),
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

/// Loads the config file (if any) and applies command-line overrides
fn resolve_config(cli: &Cli) -> Result<Config, carroya_scraper::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(out_dir) = &cli.out_dir {
        config.output.out_dir = out_dir.clone();
    }
    if let Some(trace_dir) = &cli.trace_dir {
        config.output.trace_dir = trace_dir.clone();
    }
    if cli.max_pages.is_some() {
        config.crawler.max_pages = cli.max_pages;
    }
    if cli.dedupe {
        config.crawler.dedupe = true;
    }

    validate(&config)?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Carroya Scraper Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  First page: {}", config.site.first_page_path);
    println!("  Paginated pages: {}", config.site.page_path);
    println!("  User agent: {}", config.site.user_agent);
    println!("  Timeout: {}s", config.site.timeout_secs);

    println!("\nCrawler:");
    match config.crawler.max_pages {
        Some(limit) => println!("  Max pages: {}", limit),
        None => println!("  Max pages: unbounded"),
    }
    println!("  Dedupe: {}", config.crawler.dedupe);

    println!("\nOutput:");
    println!("  Results: {}", config.output.out_dir);
    println!("  Traces: {}", config.output.trace_dir);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> ExitCode {
    tracing::info!("Starting crawl of {}", config.site.base_url);

    match crawl(config).await {
        Ok(stats) => {
            print_statistics(&stats);
            match stats.stop_reason {
                StopReason::Exhausted { .. } | StopReason::PageLimit { .. } => {
                    tracing::info!("Crawl completed successfully");
                    ExitCode::SUCCESS
                }
                StopReason::PageFailed { page } => {
                    tracing::warn!("Crawl stopped at page {}, partial results saved", page);
                    ExitCode::from(EXIT_PARTIAL)
                }
                StopReason::FirstPageFailed => {
                    tracing::error!("First page failed, no results collected");
                    ExitCode::from(EXIT_FIRST_PAGE_FAILED)
                }
            }
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
