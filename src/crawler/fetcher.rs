//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the HTTP client with the configured user agent and timeout
//! - Keeping the session header set and cookie jar that apply to every request
//! - Classifying non-200 responses and transport failures
//!
//! The fetcher never retries. Deciding what a failure means for the crawl
//! is the coordinator's job.

use crate::config::SiteConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with something other than 200 OK
    #[error("Error retrieving page {url} with status code {status_code}")]
    Status {
        url: String,
        status_code: u16,
        body: String,
    },

    /// The request never produced a readable response
    #[error("Network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// The response body that came with the failure, if any
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            Self::Network { .. } => None,
        }
    }
}

/// A source of page bodies
///
/// Session headers are merged into every request made after they are
/// inserted; `extra_headers` apply to a single request only.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    /// Adds or replaces a header for all later requests
    fn insert_session_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Drops a session header; later requests go out without it
    fn remove_session_header(&mut self, name: &HeaderName);

    /// Issues one GET and returns the body of a 200 response
    async fn fetch(&self, url: &str, extra_headers: &HeaderMap) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The site configuration carrying the user agent and timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use carroya_scraper::config::SiteConfig;
/// use carroya_scraper::crawler::build_http_client;
///
/// let client = build_http_client(&SiteConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &SiteConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .cookie_store(true)
        .build()
}

/// reqwest-backed [`PageFetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    session_headers: HeaderMap,
}

impl HttpFetcher {
    /// Creates a fetcher whose session carries only the user agent
    pub fn new(config: &SiteConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            session_headers: HeaderMap::new(),
        }
    }

    pub fn session_headers(&self) -> &HeaderMap {
        &self.session_headers
    }
}

impl PageFetcher for HttpFetcher {
    fn insert_session_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.session_headers.insert(name, value);
    }

    fn remove_session_header(&mut self, name: &HeaderName) {
        self.session_headers.remove(name);
    }

    async fn fetch(&self, url: &str, extra_headers: &HeaderMap) -> Result<String, FetchError> {
        let mut headers = self.session_headers.clone();
        for (name, value) in extra_headers {
            headers.insert(name.clone(), value.clone());
        }

        let network_error = |source: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.text().await.map_err(network_error)?;

        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status_code: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}
