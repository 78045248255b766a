//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use sitewalk::config::Config;
use sitewalk::crawler::{CrawlOptions, Crawler, HttpFetcher};
use sitewalk::normalize_url;
use sitewalk::output::write_csv_report;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with short timeouts
fn create_test_config(max_concurrency: usize, max_pages: usize) -> Config {
    let mut config = Config::default();
    config.crawler.max_concurrency = max_concurrency;
    config.crawler.max_pages = max_pages;
    config.crawler.request_timeout_secs = 5;
    config.crawler.connect_timeout_secs = 2;
    config
}

/// Mounts an HTML page at `route` that must be fetched exactly `times` times
async fn mount_page(server: &MockServer, route: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .expect(times)
        .mount(server)
        .await;
}

fn key(server: &MockServer, route: &str) -> String {
    normalize_url(&format!("{}{}", server.uri(), route)).expect("mock URL should normalize")
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<html><body>
            <h1>Home</h1>
            <main><p>Welcome home.</p></main>
            <a href="/a">A</a>
            <a href="/b">B</a>
            <img src="/logo.png">
        </body></html>"#
            .to_string(),
        1,
    )
    .await;
    mount_page(
        &server,
        "/a",
        r#"<html><body><h1>Page A</h1><p>About A.</p>
            <a href="/">Home</a>
            <a href="/b/">B again</a>
        </body></html>"#
            .to_string(),
        1,
    )
    .await;
    mount_page(
        &server,
        "/b",
        r#"<html><body><h1>Page B</h1>
            <a href="http://external.invalid/page">Elsewhere</a>
        </body></html>"#
            .to_string(),
        1,
    )
    .await;

    let config = create_test_config(3, 100);
    let report = sitewalk::crawl_site(&server.uri(), &config)
        .await
        .expect("crawl should start");

    assert_eq!(report.pages.len(), 3);
    assert_eq!(report.visits.len(), 3);
    assert_eq!(report.visits[&key(&server, "/")], 2);
    assert_eq!(report.visits[&key(&server, "/a")], 1);
    assert_eq!(report.visits[&key(&server, "/b")], 2);

    let home = &report.pages[&key(&server, "/")];
    assert_eq!(home.title, "Home");
    assert_eq!(home.first_paragraph, "Welcome home.");
    assert_eq!(
        home.outgoing_links,
        vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())]
    );
    assert_eq!(home.image_urls, vec![format!("{}/logo.png", server.uri())]);

    assert_eq!(report.stats.pages_admitted, 3);
    assert_eq!(report.stats.pages_extracted, 3);
    assert_eq!(report.stats.external_links_skipped, 1);
    assert_eq!(report.stats.fetch_failures, 0);
    assert!(!report.stats.budget_reached);
}

#[tokio::test]
async fn test_duplicate_links_fetched_once() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="/a">1</a><a href="/a">2</a><a href="/a#top">3</a><a href="/a?x=1">4</a>"#
            .to_string(),
        1,
    )
    .await;
    mount_page(&server, "/a", "<h1>A</h1>".to_string(), 1).await;

    let config = create_test_config(4, 100);
    let report = sitewalk::crawl_site(&server.uri(), &config)
        .await
        .expect("crawl should start");

    assert_eq!(report.pages.len(), 2);
    assert_eq!(report.visits[&key(&server, "/a")], 4);
    assert_eq!(report.stats.duplicate_visits(), 3);
}

#[tokio::test]
async fn test_broken_sibling_does_not_stop_crawl() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="/missing">gone</a><a href="/ok">ok</a>"#.to_string(),
        1,
    )
    .await;
    mount_page(
        &server,
        "/ok",
        r#"<h1>Still here</h1><a href="/ok/deeper">deeper</a>"#.to_string(),
        1,
    )
    .await;
    mount_page(&server, "/ok/deeper", "<h1>Deeper</h1>".to_string(), 1).await;
    // "/missing" is left unmounted: wiremock answers 404 without a content type

    let config = create_test_config(2, 100);
    let report = sitewalk::crawl_site(&server.uri(), &config)
        .await
        .expect("crawl should start");

    assert!(report.pages.contains_key(&key(&server, "/ok")));
    assert!(report.pages.contains_key(&key(&server, "/ok/deeper")));
    assert!(!report.pages.contains_key(&key(&server, "/missing")));
    assert_eq!(report.visits[&key(&server, "/missing")], 1);
    assert_eq!(report.stats.fetch_failures, 1);
    assert_eq!(report.stats.pages_extracted, 3);
}

#[tokio::test]
async fn test_page_budget_limits_admissions() {
    let server = MockServer::start().await;

    let links: String = (1..=10)
        .map(|i| format!(r#"<a href="/p{}">p{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", links, 1).await;
    for i in 1..=10 {
        Mock::given(method("GET"))
            .and(path(format!("/p{}", i)))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(format!("<h1>P{}</h1>", i), "text/html"),
            )
            .mount(&server)
            .await;
    }

    let config = create_test_config(1, 3);
    let report = sitewalk::crawl_site(&server.uri(), &config)
        .await
        .expect("crawl should start");

    assert_eq!(report.visits.len(), 3);
    assert_eq!(report.stats.pages_admitted, 3);
    assert!(report.pages.len() <= 3);
    assert!(report.pages.contains_key(&key(&server, "/")));
    assert!(report.stats.budget_reached);
}

#[tokio::test]
async fn test_sends_identifying_user_agent() {
    let server = MockServer::start().await;
    let mut config = create_test_config(1, 10);
    config.user_agent.contact_url = "https://example.com/bot".to_string();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", config.user_agent.header_value().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<h1>Hi</h1>", "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let report = sitewalk::crawl_site(&server.uri(), &config)
        .await
        .expect("crawl should start");

    assert_eq!(report.pages.len(), 1);
}

#[tokio::test]
async fn test_lenient_content_type_extracts_anyway() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<h1>Plain</h1>", "text/plain"))
        .mount(&server)
        .await;

    let mut config = create_test_config(1, 10);
    let strict = sitewalk::crawl_site(&server.uri(), &config)
        .await
        .expect("crawl should start");
    assert!(strict.pages.is_empty());
    assert_eq!(strict.stats.fetch_failures, 1);

    config.crawler.strict_content_type = false;
    let lenient = sitewalk::crawl_site(&server.uri(), &config)
        .await
        .expect("crawl should start");
    assert_eq!(lenient.pages[&key(&server, "/")].title, "Plain");
}

#[tokio::test]
async fn test_stopped_crawler_fetches_nothing() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<h1>Never</h1>".to_string(), 0).await;

    let config = create_test_config(1, 10);
    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.crawler).unwrap();
    let crawler =
        Crawler::new(&server.uri(), CrawlOptions::from(&config.crawler), fetcher).unwrap();

    assert!(crawler.cancellation().trip());
    let report = crawler.crawl().await;

    assert!(report.pages.is_empty());
    assert!(report.visits.is_empty());
    assert!(!report.stats.budget_reached);
}

#[tokio::test]
async fn test_invalid_seed_is_rejected() {
    let config = create_test_config(1, 10);
    assert!(sitewalk::crawl_site("not a url", &config).await.is_err());
    assert!(sitewalk::crawl_site("/relative/path", &config).await.is_err());
}

#[tokio::test]
async fn test_report_written_to_csv() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<h1>Home, "sweet" home</h1><p>Intro</p><a href="/next">next</a>"#.to_string(),
        1,
    )
    .await;
    mount_page(&server, "/next", "<h1>Next</h1>".to_string(), 1).await;

    let config = create_test_config(2, 10);
    let report = sitewalk::crawl_site(&server.uri(), &config)
        .await
        .expect("crawl should start");

    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("report.csv");
    write_csv_report(&report.pages, &report_path).unwrap();

    let mut reader = csv::Reader::from_path(&report_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["page_url", "h1", "first_paragraph", "outgoing_link_urls", "image_urls"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][1], "Home, \"sweet\" home");
    assert_eq!(&rows[0][2], "Intro");
    assert_eq!(&rows[0][3], format!("{}/next", server.uri()));
    assert_eq!(&rows[1][1], "Next");
}
