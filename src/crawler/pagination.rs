//! Pagination counter reading and page URL construction
//!
//! The site reports its position in a human-readable results phrase such
//! as "Mostrando 20 resultados - Página 3 de 41", inside
//! `span.results-number`. The three integers are, in order, an ignored
//! count, the current page and the total number of pages.

use crate::config::SiteConfig;
use regex::Regex;
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

/// Query parameter carrying the 1-based page index
pub const PAGE_PARAM: &str = "paginaActual";

/// Query parameter carrying the cache-busting timestamp
pub const CACHE_BUST_PARAM: &str = "_";

/// Errors raised when the pagination counter cannot be read
#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("Results counter not found")]
    MissingCounter,

    #[error("Expected 3 numbers in results counter '{text}', found {found}")]
    UnexpectedNumbers { text: String, found: usize },

    #[error("Invalid number '{0}' in results counter")]
    InvalidNumber(String),

    #[error("Page numbers must be >= 1, got {current} of {total}")]
    OutOfRange { current: u32, total: u32 },

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid selector: {0}")]
    Selector(String),
}

/// Position reported by a results page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationCounter {
    pub current: u32,
    pub total: u32,
}

impl PaginationCounter {
    /// True once the current page has reached (or passed) the total
    pub fn is_last(&self) -> bool {
        self.current >= self.total
    }

    /// True when the site reports a current page beyond its own total
    pub fn overshoots(&self) -> bool {
        self.current > self.total
    }
}

/// Reads the pagination counter from results pages
#[derive(Debug)]
pub struct PaginationReader {
    counter: Selector,
    number: Regex,
}

impl PaginationReader {
    pub fn new() -> Result<Self, PaginationError> {
        let counter = Selector::parse("span.results-number")
            .map_err(|e| PaginationError::Selector(e.to_string()))?;
        let number = Regex::new(r"\d+")?;
        Ok(Self { counter, number })
    }

    /// Extracts `(current, total)` from a page body
    pub fn read(&self, html: &str) -> Result<PaginationCounter, PaginationError> {
        let document = Html::parse_document(html);
        let text = document
            .select(&self.counter)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .ok_or(PaginationError::MissingCounter)?;

        let numbers: Vec<&str> = self.number.find_iter(&text).map(|m| m.as_str()).collect();
        let [_, current, total] = numbers[..] else {
            return Err(PaginationError::UnexpectedNumbers {
                found: numbers.len(),
                text,
            });
        };

        let current = parse_number(current)?;
        let total = parse_number(total)?;
        if current == 0 || total == 0 {
            return Err(PaginationError::OutOfRange { current, total });
        }

        Ok(PaginationCounter { current, total })
    }
}

fn parse_number(digits: &str) -> Result<u32, PaginationError> {
    digits
        .parse()
        .map_err(|_| PaginationError::InvalidNumber(digits.to_string()))
}

/// Convenience function that reads a counter with a freshly built reader
pub fn read_pagination(html: &str) -> Result<PaginationCounter, PaginationError> {
    PaginationReader::new()?.read(html)
}

/// URL of the first results page, which takes no pagination parameters
pub fn first_page_url(site: &SiteConfig) -> Result<Url, url::ParseError> {
    Url::parse(&site.base_url)?.join(&site.first_page_path)
}

/// URL of results page `page` with a cache-busting timestamp
///
/// # Example
///
/// ```
/// use carroya_scraper::config::SiteConfig;
/// use carroya_scraper::crawler::page_url;
///
/// let url = page_url(&SiteConfig::default(), 2, 1700000000000).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://www.carroya.com/buscar/vehiculos/ajax/filtrando.do?paginaActual=2&_=1700000000000"
/// );
/// ```
pub fn page_url(site: &SiteConfig, page: u32, epoch_millis: i64) -> Result<Url, url::ParseError> {
    Ok(paginated_url(&page_endpoint(site)?, page, epoch_millis))
}

/// The paginated results endpoint, without query parameters
pub fn page_endpoint(site: &SiteConfig) -> Result<Url, url::ParseError> {
    Url::parse(&site.base_url)?.join(&site.page_path)
}

/// Appends the page index and timestamp parameters to `endpoint`
pub fn paginated_url(endpoint: &Url, page: u32, epoch_millis: i64) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair(PAGE_PARAM, &page.to_string())
        .append_pair(CACHE_BUST_PARAM, &epoch_millis.to_string());
    url
}
