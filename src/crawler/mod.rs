//! Crawler module for results-page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a persistent header session
//! - Listing extraction from results-page markup
//! - Pagination counter reading and page URL construction
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod pagination;
mod parser;

pub use coordinator::{run_crawl, Coordinator, X_REQUESTED_WITH};
pub use fetcher::{build_http_client, FetchError, HttpFetcher, PageFetcher};
pub use pagination::{
    first_page_url, page_endpoint, page_url, paginated_url, read_pagination, PaginationCounter,
    PaginationError, PaginationReader, CACHE_BUST_PARAM, PAGE_PARAM,
};
pub use parser::{parse_page, ExtractError, ListingParser, ParsedPage};

pub use crate::state::CrawlOutcome;

use crate::config::Config;
use crate::output::{CrawlStatistics, FileTraceSink, JsonFileSink};
use crate::ScraperError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP session
/// 2. Walk the results pages until the last one or the first failure
/// 3. Write both collections as JSON to the output directory
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Crawl ran and its results were written, even
///   if it stopped early
/// * `Err(ScraperError)` - The session could not be built or the results
///   could not be written
pub async fn crawl(config: Config) -> Result<CrawlStatistics, ScraperError> {
    let fetcher = HttpFetcher::new(&config.site)?;
    let traces = FileTraceSink::new(&config.output.trace_dir);
    let results = JsonFileSink::new(&config.output.out_dir);

    run_crawl(&config, fetcher, traces, &results).await
}
