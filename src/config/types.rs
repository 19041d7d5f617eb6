use serde::Deserialize;

/// Default site root
pub const DEFAULT_BASE_URL: &str = "https://www.carroya.com";

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/33.0.1750.70 Safari/537.36";

/// Main configuration structure
///
/// Every field has a default, so an empty file (or no file at all) yields
/// a working configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
}

/// Target site and HTTP session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Scheme and host of the listing site
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the first results page (requested without pagination)
    #[serde(rename = "first-page-path")]
    pub first_page_path: String,

    /// Path of the paginated results endpoint
    #[serde(rename = "page-path")]
    pub page_path: String,

    /// User-Agent header for the whole session
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            first_page_path: "/buscar/vehiculos/t4.do".to_string(),
            page_path: "/buscar/vehiculos/ajax/filtrando.do".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Crawl loop behavior configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Highest page number that will be requested; unbounded when unset
    #[serde(rename = "max-pages")]
    pub max_pages: Option<u32>,

    /// Drop listings whose id was already seen before persisting
    pub dedupe: bool,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the JSON result files
    #[serde(rename = "out-dir")]
    pub out_dir: String,

    /// Directory receiving raw bodies of failing pages
    #[serde(rename = "trace-dir")]
    pub trace_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: "/var/tmp/carrolla".to_string(),
            trace_dir: "/var/tmp/carrolla".to_string(),
        }
    }
}
