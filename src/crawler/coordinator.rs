//! Crawler coordinator - pagination loop orchestration
//!
//! This module contains the crawl loop that:
//! - Fetches the unpaginated first results page
//! - Walks pages 2..N until the page's own counter reports the last page
//! - Accumulates listings across pages
//! - Stops on the first failing later page while keeping earlier pages
//!
//! All side effects go through the injected [`PageFetcher`] and
//! [`TraceSink`], so the loop itself never touches the filesystem.

use crate::config::Config;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::pagination::{
    first_page_url, page_endpoint, paginated_url, PaginationCounter, PaginationReader,
};
use crate::crawler::parser::{ListingParser, ParsedPage};
use crate::output::{epoch_millis, CrawlStatistics, ResultSink, TraceSink};
use crate::state::{CrawlOutcome, CrawlPhase, CrawlState, StopReason};
use crate::vehicle::dedupe_by_id;
use crate::ScraperError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{error, info, warn};
use url::Url;

/// Header marking pagination requests as AJAX calls
pub const X_REQUESTED_WITH: &str = "x-requested-with";

/// A later page that could not be processed, with whatever body came back
struct PageFailure {
    body: Option<String>,
    error: ScraperError,
}

/// Main crawler coordinator structure
pub struct Coordinator<F, T> {
    fetcher: F,
    traces: T,
    listings: ListingParser,
    pagination: PaginationReader,
    first_url: Url,
    page_endpoint: Url,
    max_pages: Option<u32>,
    last_body: Option<String>,
}

impl<F: PageFetcher, T: TraceSink> Coordinator<F, T> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fetcher` - Source of page bodies
    /// * `traces` - Destination for bodies of failing pages
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ScraperError)` - The site URLs or selectors could not be built
    pub fn new(config: &Config, fetcher: F, traces: T) -> Result<Self, ScraperError> {
        Ok(Self {
            fetcher,
            traces,
            listings: ListingParser::new()?,
            pagination: PaginationReader::new()?,
            first_url: first_page_url(&config.site)?,
            page_endpoint: page_endpoint(&config.site)?,
            max_pages: config.crawler.max_pages,
            last_body: None,
        })
    }

    /// Runs the crawl to completion
    ///
    /// Never fails: a first-page failure yields empty collections, and a
    /// later-page failure yields everything accumulated before it.
    ///
    /// Each run starts from a clean session, so the first page of a
    /// repeated run is never sent as an AJAX call.
    pub async fn run(&mut self) -> CrawlOutcome {
        let mut state = CrawlState::new();
        let xhr = HeaderName::from_static(X_REQUESTED_WITH);

        self.fetcher.remove_session_header(&xhr);
        self.last_body = None;

        self.process_first_page(&mut state).await;

        if !state.done() {
            self.fetcher
                .insert_session_header(xhr, HeaderValue::from_static("XMLHttpRequest"));
        }

        while !state.done() {
            self.process_next_page(&mut state).await;
        }

        state.into_outcome()
    }

    async fn process_first_page(&mut self, state: &mut CrawlState) {
        state.transition(CrawlPhase::FetchingFirstPage);
        info!(page = 1, "Parsing page 1");

        let body = match self
            .fetcher
            .fetch(self.first_url.as_str(), &HeaderMap::new())
            .await
        {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Error retrieving first page");
                state.finish(StopReason::FirstPageFailed);
                return;
            }
        };

        match self.listings.parse_page(&body) {
            Ok(page) => state.accumulate(page.new_vehicles, page.used_vehicles),
            Err(e) => {
                self.save_trace(Some(&body));
                error!(error = %e, "Error parsing first page");
                state.finish(StopReason::FirstPageFailed);
            }
        }
        self.last_body = Some(body);
    }

    async fn process_next_page(&mut self, state: &mut CrawlState) {
        let page = state.next_page();

        if let Some(limit) = self.max_pages {
            if page > limit {
                warn!(page, limit, "Page limit reached, stopping");
                state.finish(StopReason::PageLimit { limit });
                return;
            }
        }

        state.transition(CrawlPhase::FetchingPage);
        info!(page, "Parsing page {}", page);

        let url = paginated_url(&self.page_endpoint, page, epoch_millis());
        match self.fetch_and_parse(url.as_str()).await {
            Ok((parsed, counter, body)) => {
                self.last_body = Some(body);
                state.accumulate(parsed.new_vehicles, parsed.used_vehicles);
                info!(
                    current = counter.current,
                    total = counter.total,
                    "Processed {} from {}",
                    counter.current,
                    counter.total
                );

                if counter.overshoots() {
                    warn!(
                        current = counter.current,
                        total = counter.total,
                        "Current page is past the reported total"
                    );
                }

                if counter.is_last() {
                    info!("Retrieve done");
                    state.finish(StopReason::Exhausted {
                        total: counter.total,
                    });
                } else {
                    state.transition(CrawlPhase::Continue);
                }
            }
            Err(failure) => {
                let body = match failure.body.as_deref() {
                    Some(body) => Some(body),
                    None => {
                        warn!(page, "No response body, tracing the last received page");
                        self.last_body.as_deref()
                    }
                };
                self.save_trace(body);
                error!(
                    page,
                    error = %failure.error,
                    "Stopping crawl, keeping {} processed pages",
                    state.page_cursor()
                );
                state.finish(StopReason::PageFailed { page });
            }
        }
    }

    /// Fetches one page, extracts its listings and reads its counter
    ///
    /// The page only counts if all three steps succeed. The body comes back
    /// with the results so it can be traced if a later request fails.
    async fn fetch_and_parse(
        &self,
        url: &str,
    ) -> Result<(ParsedPage, PaginationCounter, String), PageFailure> {
        let body = self
            .fetcher
            .fetch(url, &HeaderMap::new())
            .await
            .map_err(|e| PageFailure {
                body: e.body().map(str::to_string),
                error: e.into(),
            })?;

        let result = self
            .listings
            .parse_page(&body)
            .map_err(ScraperError::from)
            .and_then(|parsed| Ok((parsed, self.pagination.read(&body)?)));

        match result {
            Ok((parsed, counter)) => Ok((parsed, counter, body)),
            Err(error) => Err(PageFailure {
                body: Some(body),
                error,
            }),
        }
    }

    /// Best-effort trace capture; failures are only logged
    fn save_trace(&self, body: Option<&str>) {
        let Some(body) = body else {
            warn!("No response body to trace");
            return;
        };

        if let Err(e) = self.traces.save_trace(body) {
            warn!(error = %e, "Failed to save trace");
        }
    }
}

/// Runs a crawl and persists both collections through `results`
///
/// The collections are written even when the crawl stopped early, so a
/// partial crawl still leaves its data behind.
pub async fn run_crawl<F, T, R>(
    config: &Config,
    fetcher: F,
    traces: T,
    results: &R,
) -> Result<CrawlStatistics, ScraperError>
where
    F: PageFetcher,
    T: TraceSink,
    R: ResultSink,
{
    let mut coordinator = Coordinator::new(config, fetcher, traces)?;

    info!("Retrieve data");
    let outcome = coordinator.run().await;
    info!("Found {} new vehicles", outcome.new_vehicles.len());
    info!("Found {} used vehicles", outcome.used_vehicles.len());

    let mut stats = CrawlStatistics::from_outcome(&outcome);

    let (new_vehicles, used_vehicles) = if config.crawler.dedupe {
        let new_vehicles = dedupe_by_id(outcome.new_vehicles);
        let used_vehicles = dedupe_by_id(outcome.used_vehicles);
        info!(
            removed = stats.duplicate_new + stats.duplicate_used,
            "Removed duplicate listings"
        );
        stats.new_vehicles = new_vehicles.len();
        stats.used_vehicles = used_vehicles.len();
        (new_vehicles, used_vehicles)
    } else {
        (outcome.new_vehicles, outcome.used_vehicles)
    };

    info!("Saving data");
    stats.files.push(results.persist(&new_vehicles, "new_vehicles")?);
    stats.files.push(results.persist(&used_vehicles, "used_vehicles")?);

    Ok(stats)
}
