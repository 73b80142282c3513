//! Integration tests for HTTP discovery
//!
//! These tests use wiremock to serve a small site and run full crawls of it
//! through the registry, checking the tree that comes out.

use sitetree::config::{Config, CrawlerConfig, ServerConfig, UserAgentConfig};
use sitetree::crawler::CrawlSession;
use sitetree::{CrawlStatus, CrawlerRegistry, HttpDiscovery};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with a small worker pool
fn create_test_config(max_pages: usize) -> Config {
    Config {
        server: ServerConfig::default(),
        crawler: CrawlerConfig {
            workers: 4,
            queue_capacity: 8,
            max_concurrent_requests: 4,
            request_timeout_secs: 5,
            max_pages,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
    }
}

fn registry(config: &Config) -> CrawlerRegistry {
    let discovery = HttpDiscovery::new(config)
        .expect("Failed to build discovery")
        .with_scheme("http");
    CrawlerRegistry::new(config.crawler.clone(), Arc::new(discovery))
}

/// `127.0.0.1:PORT` for a mock server
fn site_key(server: &MockServer) -> String {
    server.address().to_string()
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn finished(session: &CrawlSession) -> CrawlStatus {
    tokio::time::timeout(Duration::from_secs(15), session.wait())
        .await
        .expect("crawl did not reach a terminal status")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_crawl_builds_site_tree() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        &format!(
            r#"<a href="/docs/intro">Intro</a>
            <a href="{}/docs/api">API</a>
            <a href="blog/2024/post#comments">Post</a>"#,
            base
        ),
    )
    .await;
    mount_html(&server, "/docs/intro", r#"<a href="/docs/api">API</a><a href="/">Home</a>"#).await;
    mount_html(&server, "/docs/api", r#"<a href="../docs/intro">Intro</a>"#).await;
    mount_html(&server, "/blog/2024/post", "No links here").await;

    let registry = registry(&create_test_config(0));
    let site = site_key(&server);
    let outcome = registry.start(&site).await.unwrap();
    assert_eq!(outcome.site(), site);

    let session = registry.session(&site).await.unwrap();
    assert_eq!(finished(&session).await, CrawlStatus::Completed);
    assert_eq!(session.active_workers(), 0);

    let listing = registry.list(&site).await.unwrap();
    assert_eq!(listing.tree.name, site);
    assert_eq!(
        listing.tree.paths(),
        vec![
            "blog",
            "blog/2024",
            "blog/2024/post",
            "docs",
            "docs/api",
            "docs/intro"
        ]
    );
    // Seed plus three pages, each visited once
    assert_eq!(listing.urls_processed, 4);
}

#[tokio::test]
async fn test_links_to_other_hosts_are_ignored() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<a href="https://other.example.org/secret">Elsewhere</a>
        <a href="mailto:someone@example.com">Mail</a>
        <a href="/local">Local</a>"#,
    )
    .await;
    mount_html(&server, "/local", "").await;

    let registry = registry(&create_test_config(0));
    let site = site_key(&server);
    registry.start(&site).await.unwrap();

    let session = registry.session(&site).await.unwrap();
    assert_eq!(finished(&session).await, CrawlStatus::Completed);
    assert_eq!(session.snapshot().paths(), vec!["local"]);
}

#[tokio::test]
async fn test_non_html_pages_are_recorded_but_not_expanded() {
    let server = MockServer::start().await;

    mount_html(&server, "/", r#"<a href="/files/report.pdf">Report</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/files/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_string(r#"<a href="/hidden">not html</a>"#),
        )
        .mount(&server)
        .await;

    let registry = registry(&create_test_config(0));
    let site = site_key(&server);
    registry.start(&site).await.unwrap();

    let session = registry.session(&site).await.unwrap();
    assert_eq!(finished(&session).await, CrawlStatus::Completed);
    assert_eq!(session.snapshot().paths(), vec!["files", "files/report.pdf"]);
}

#[tokio::test]
async fn test_page_budget_limits_visits() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<a href="/a">A</a><a href="/b">B</a><a href="/c">C</a>"#,
    )
    .await;
    for route in ["/a", "/b", "/c"] {
        mount_html(&server, route, "").await;
    }

    let registry = registry(&create_test_config(2));
    let site = site_key(&server);
    registry.start(&site).await.unwrap();

    let session = registry.session(&site).await.unwrap();
    assert_eq!(finished(&session).await, CrawlStatus::Completed);
    assert_eq!(session.stats().processed(), 2);
    assert_eq!(session.snapshot().children.len(), 1);
}

#[tokio::test]
async fn test_seed_error_fails_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let registry = registry(&create_test_config(0));
    let site = site_key(&server);
    registry.start(&site).await.unwrap();

    let session = registry.session(&site).await.unwrap();
    match finished(&session).await {
        CrawlStatus::Failed(reason) => assert!(reason.contains("500"), "reason: {}", reason),
        other => panic!("expected failure, got {}", other),
    }

    let listing = registry.list(&site).await.unwrap();
    assert!(listing.finished_at.is_some());
    assert!(listing.tree.children.is_empty());
}

#[tokio::test]
async fn test_broken_inner_page_does_not_fail_crawl() {
    let server = MockServer::start().await;

    mount_html(&server, "/", r#"<a href="/gone">Gone</a><a href="/ok">Ok</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_html(&server, "/ok", "").await;

    let registry = registry(&create_test_config(0));
    let site = site_key(&server);
    registry.start(&site).await.unwrap();

    let session = registry.session(&site).await.unwrap();
    assert_eq!(finished(&session).await, CrawlStatus::Completed);
    assert_eq!(session.snapshot().paths(), vec!["gone", "ok"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stop_during_slow_crawl() {
    let server = MockServer::start().await;

    let links: String = (0..50)
        .map(|i| format!(r#"<a href="/slow/{}">{}</a>"#, i, i))
        .collect();
    mount_html(&server, "/", &links).await;
    Mock::given(method("GET"))
        .respond_with(html("").set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let registry = registry(&create_test_config(0));
    let site = site_key(&server);
    registry.start(&site).await.unwrap();
    let session = registry.session(&site).await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    registry.stop(&site).await;

    assert_eq!(finished(&session).await, CrawlStatus::Stopped);
    assert_eq!(session.active_workers(), 0);
    assert!(session.stats().processed() < 51);
}
