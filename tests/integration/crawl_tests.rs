//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the listing site and run the
//! full crawl cycle end-to-end, including the JSON and trace files.

use carroya_scraper::config::Config;
use carroya_scraper::crawler::{crawl, FetchError, HttpFetcher, PageFetcher};
use carroya_scraper::StopReason;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIRST_PAGE: &str = "/buscar/vehiculos/t4.do";
const PAGES: &str = "/buscar/vehiculos/ajax/filtrando.do";

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.site.user_agent = "TestAgent/1.0".to_string();
    config.site.timeout_secs = 5;
    config.output.out_dir = dir.path().join("out").to_string_lossy().into_owned();
    config.output.trace_dir = dir.path().join("traces").to_string_lossy().into_owned();
    config
}

fn new_listing(id: &str) -> String {
    format!(
        r#"<div class="new-vehicle">
             <a href="/vehiculos-nuevos/{id}"><div class="new-vehicle-img"><img data-original="/img/{id}.jpg"></div></a>
             <span itemprop="name">Onix</span><span itemprop="model">LT</span>
             <span itemprop="productID">{id}</span><span itemprop="manufacturer">Chevrolet</span>
             <h2 class="new-vehicle-heading-title">Chevrolet Onix LT</h2>
             <span class="new-vehicle-model">2025</span>
             <div class="new-vehicle-price">$ 80.000.000</div>
             <table class="specs-table"><tr><th>Motor</th></tr><tr><td>1.0T</td></tr></table>
           </div>"#
    )
}

fn used_listing(id: &str) -> String {
    format!(
        r#"<div itemscope itemtype="http://schema.org/Offer">
             <a href="/usados/{id}" data-idvehiculo="{id}"><img data-original="/img/u{id}.jpg"></a>
             <span itemprop="name">Fiesta</span><span itemprop="manufacturer">Ford</span>
             <h2 class="car-ad-name">Ford Fiesta</h2>
             <h3 class="car-ad-year">2016</h3>
             <div class="car-ad-price">$ 30.000.000</div>
           </div>"#
    )
}

fn results_page(new: &[&str], used: &[&str], counter: Option<(u32, u32)>) -> String {
    let new_section = if new.is_empty() {
        String::new()
    } else {
        format!(
            r#"<section class="new-vehicles">{}</section>"#,
            new.iter().map(|id| new_listing(id)).collect::<String>()
        )
    };
    let counter = counter
        .map(|(current, total)| {
            format!(
                r#"<span class="results-number">{} resultados - Página {} de {}</span>"#,
                used.len(),
                current,
                total
            )
        })
        .unwrap_or_default();

    format!(
        r#"<html><body>{}{}<section class="search-results">{}</section></body></html>"#,
        counter,
        new_section,
        used.iter().map(|id| used_listing(id)).collect::<String>()
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_first_page(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path(FIRST_PAGE))
        .respond_with(html(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page: u32, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(PAGES))
        .and(query_param("paginaActual", page.to_string()))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

/// Reads the single JSON file whose name starts with `prefix`
fn read_collection(dir: &Path, prefix: &str) -> Vec<serde_json::Value> {
    let entry = std::fs::read_dir(dir)
        .expect("Output dir missing")
        .map(|e| e.expect("Bad dir entry").path())
        .find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix) && n.ends_with(".json"))
        })
        .unwrap_or_else(|| panic!("No {} file written", prefix));

    let content = std::fs::read_to_string(entry).expect("Failed to read collection");
    serde_json::from_str(&content).expect("Collection is not a JSON array")
}

fn trace_files(dir: &Path) -> Vec<std::path::PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.expect("Bad dir entry").path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn test_full_crawl_three_pages() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_first_page(&mock_server, results_page(&["N1", "N2"], &["1", "2", "3"], None)).await;
    mount_page(&mock_server, 2, html(results_page(&[], &["4"], Some((2, 3))))).await;
    mount_page(&mock_server, 3, html(results_page(&[], &["5", "6"], Some((3, 3))))).await;

    let config = create_test_config(&mock_server.uri(), &dir);
    let stats = crawl(config).await.expect("Crawl failed");

    assert_eq!(stats.stop_reason, StopReason::Exhausted { total: 3 });
    assert_eq!(stats.pages_processed, 3);
    assert_eq!(stats.new_vehicles, 2);
    assert_eq!(stats.used_vehicles, 6);
    assert_eq!(stats.files.len(), 2);

    let new_vehicles = read_collection(&dir.path().join("out"), "new_vehicles_");
    assert_eq!(new_vehicles.len(), 2);
    assert_eq!(new_vehicles[0]["id"], "N1");
    assert_eq!(new_vehicles[0]["model_year"], "2025");
    assert_eq!(new_vehicles[0]["specs"][0]["name"], "Motor");
    assert_eq!(new_vehicles[0]["specs"][0]["value"], "1.0T");

    let used_vehicles = read_collection(&dir.path().join("out"), "used_vehicles_");
    let ids: Vec<&str> = used_vehicles
        .iter()
        .map(|v| v["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6"]);
    assert_eq!(used_vehicles[0]["whatsApp_user_id"], "");
    assert_eq!(used_vehicles[0]["ad_year"], "2016");

    assert!(trace_files(&dir.path().join("traces")).is_empty());
}

#[tokio::test]
async fn test_user_agent_sent_on_every_request() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(FIRST_PAGE))
        .and(header("user-agent", "TestAgent/1.0"))
        .respond_with(html(results_page(&[], &["1"], None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(PAGES))
        .and(header("user-agent", "TestAgent/1.0"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .respond_with(html(results_page(&[], &["2"], Some((2, 2)))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &dir);
    let stats = crawl(config).await.expect("Crawl failed");

    assert_eq!(stats.used_vehicles, 2);
}

#[tokio::test]
async fn test_session_cookie_is_sent_back_on_later_pages() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(FIRST_PAGE))
        .respond_with(
            html(results_page(&[], &["1"], None))
                .insert_header("set-cookie", "JSESSIONID=abc; Path=/"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(PAGES))
        .and(query_param("paginaActual", "2"))
        .and(header("cookie", "JSESSIONID=abc"))
        .respond_with(html(results_page(&[], &["2"], Some((2, 2)))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &dir);
    let stats = crawl(config).await.expect("Crawl failed");

    assert_eq!(stats.stop_reason, StopReason::Exhausted { total: 2 });
    assert_eq!(stats.used_vehicles, 2);
}

#[tokio::test]
async fn test_later_page_failure_keeps_partial_results() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_first_page(&mock_server, results_page(&["N1"], &["1", "2"], None)).await;
    mount_page(&mock_server, 2, html(results_page(&[], &["3"], Some((2, 9))))).await;
    mount_page(
        &mock_server,
        3,
        ResponseTemplate::new(500).set_body_string("<html>Internal error</html>"),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), &dir);
    let stats = crawl(config).await.expect("Crawl failed");

    assert_eq!(stats.stop_reason, StopReason::PageFailed { page: 3 });
    assert_eq!(stats.pages_processed, 2);
    assert_eq!(stats.new_vehicles, 1);
    assert_eq!(stats.used_vehicles, 3);

    let used_vehicles = read_collection(&dir.path().join("out"), "used_vehicles_");
    assert_eq!(used_vehicles.len(), 3);

    let traces = trace_files(&dir.path().join("traces"));
    assert_eq!(traces.len(), 1);
    let name = traces[0].file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("trace_") && name.ends_with(".html"));
    assert_eq!(
        std::fs::read_to_string(&traces[0]).unwrap(),
        "<html>Internal error</html>"
    );
}

#[tokio::test]
async fn test_first_page_failure_writes_empty_results() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(FIRST_PAGE))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Pagination must never start
    Mock::given(method("GET"))
        .and(path(PAGES))
        .respond_with(html(results_page(&[], &["1"], Some((2, 2)))))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &dir);
    let stats = crawl(config).await.expect("Crawl failed");

    assert_eq!(stats.stop_reason, StopReason::FirstPageFailed);
    assert_eq!(stats.total_vehicles(), 0);
    assert!(read_collection(&dir.path().join("out"), "new_vehicles_").is_empty());
    assert!(read_collection(&dir.path().join("out"), "used_vehicles_").is_empty());
    assert!(trace_files(&dir.path().join("traces")).is_empty());
}

#[tokio::test]
async fn test_page_limit_stops_crawl() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_first_page(&mock_server, results_page(&[], &["1"], None)).await;
    mount_page(&mock_server, 2, html(results_page(&[], &["2"], Some((2, 50))))).await;

    let mut config = create_test_config(&mock_server.uri(), &dir);
    config.crawler.max_pages = Some(2);
    let stats = crawl(config).await.expect("Crawl failed");

    assert_eq!(stats.stop_reason, StopReason::PageLimit { limit: 2 });
    assert_eq!(stats.used_vehicles, 2);
}

#[tokio::test]
async fn test_fetcher_status_error_carries_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&Config::default().site).unwrap();
    let result = fetcher
        .fetch(&format!("{}/missing", mock_server.uri()), &HeaderMap::new())
        .await;

    match result {
        Err(FetchError::Status {
            status_code, body, ..
        }) => {
            assert_eq!(status_code, 404);
            assert_eq!(body, "not here");
        }
        other => panic!("Expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetcher_merges_session_and_extra_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .and(header("x-extra", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut fetcher = HttpFetcher::new(&Config::default().site).unwrap();
    fetcher.insert_session_header(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );

    let mut extra = HeaderMap::new();
    extra.insert(
        HeaderName::from_static("x-extra"),
        HeaderValue::from_static("1"),
    );

    let body = fetcher
        .fetch(&format!("{}/page", mock_server.uri()), &extra)
        .await
        .expect("Fetch failed");
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_fetcher_network_error() {
    // Port 1 (tcpmux) is closed on any normal test host
    let fetcher = HttpFetcher::new(&Config::default().site).unwrap();
    let result = fetcher
        .fetch("http://127.0.0.1:1/", &HeaderMap::new())
        .await;

    let error = result.expect_err("Expected a network error");
    assert!(matches!(error, FetchError::Network { .. }));
    assert!(error.body().is_none());
}
