//! Integration tests for the crawler registry
//!
//! Discovery is replaced by scripted producers so the tree contents are
//! known in advance and the tests exercise only the queue, the worker pool
//! and the session lifecycle.

use async_trait::async_trait;
use sitetree::config::CrawlerConfig;
use sitetree::crawler::{CrawlSession, StartOutcome, StopOutcome};
use sitetree::{CrawlStatus, CrawlerRegistry, Discovery, Result, UrlSink};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Sends `https://{site}/{path}` for each path, then finishes
struct Scripted {
    paths: Vec<String>,
}

impl Scripted {
    fn new<S: Into<String>>(paths: impl IntoIterator<Item = S>) -> Arc<Self> {
        Arc::new(Self {
            paths: paths.into_iter().map(Into::into).collect(),
        })
    }
}

#[async_trait]
impl Discovery for Scripted {
    async fn discover(&self, site: &str, sink: UrlSink) -> Result<()> {
        for path in &self.paths {
            if !sink.send(format!("https://{}/{}", site, path)).await {
                break;
            }
        }
        Ok(())
    }
}

/// Sends its paths, then stays open until the session is stopped
struct HoldOpen {
    paths: Vec<&'static str>,
}

#[async_trait]
impl Discovery for HoldOpen {
    async fn discover(&self, site: &str, sink: UrlSink) -> Result<()> {
        for path in &self.paths {
            sink.send(format!("https://{}/{}", site, path)).await;
        }
        sink.cancelled().await;
        Ok(())
    }
}

fn crawler_config(workers: usize, queue_capacity: usize) -> CrawlerConfig {
    CrawlerConfig {
        workers,
        queue_capacity,
        ..CrawlerConfig::default()
    }
}

async fn finished(session: &CrawlSession) -> CrawlStatus {
    tokio::time::timeout(Duration::from_secs(10), session.wait())
        .await
        .expect("crawl did not reach a terminal status")
}

/// Every prefix of every path, as `TreeSnapshot::paths` reports them
fn expected_paths(paths: &[String]) -> Vec<String> {
    let mut expected = BTreeSet::new();
    for path in paths {
        let segments: Vec<&str> = path.split('/').collect();
        for end in 1..=segments.len() {
            expected.insert(segments[..end].join("/"));
        }
    }
    expected.into_iter().collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_duplicate_urls_share_nodes() {
    let registry = CrawlerRegistry::new(
        crawler_config(4, 100),
        Scripted::new(["a/b", "a/c", "a/b"]),
    );

    let outcome = registry.start("example.com").await.unwrap();
    assert_eq!(outcome.site(), "example.com");

    let session = registry.session("example.com").await.unwrap();
    assert_eq!(finished(&session).await, CrawlStatus::Completed);

    let listing = registry.list("example.com").await.unwrap();
    assert_eq!(listing.tree.name, "example.com");
    assert_eq!(listing.tree.children.len(), 1);

    let a = listing.tree.child("a").unwrap();
    let mut names: Vec<&str> = a.children.iter().map(|c| c.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["b", "c"]);
    assert_eq!(listing.tree.node_count(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_overlapping_urls_build_unique_complete_tree() {
    let mut paths = Vec::new();
    // Every round repeats the same paths so workers race on each node
    for _round in 0..5 {
        for section in 0..8 {
            for item in 0..25 {
                paths.push(format!("docs/{}/items/{}", section, item));
            }
        }
    }
    paths.push("about".to_string());

    let registry = CrawlerRegistry::new(crawler_config(32, 8), Scripted::new(paths.clone()));
    registry.start("example.com").await.unwrap();

    let session = registry.session("example.com").await.unwrap();
    assert_eq!(finished(&session).await, CrawlStatus::Completed);
    assert_eq!(session.stats().processed(), paths.len() as u64);

    let listing = registry.list("example.com").await.unwrap();
    assert_eq!(listing.tree.find_duplicate(), None);
    assert_eq!(listing.tree.paths(), expected_paths(&paths));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_workers_all_exit_when_discovery_ends() {
    let registry = CrawlerRegistry::new(
        crawler_config(100, 100),
        Scripted::new((0..500).map(|i| format!("p/{}", i))),
    );
    registry.start("example.com").await.unwrap();

    let session = registry.session("example.com").await.unwrap();
    assert_eq!(finished(&session).await, CrawlStatus::Completed);
    assert_eq!(session.active_workers(), 0);

    let listing = registry.list("example.com").await.unwrap();
    assert!(listing.finished_at.is_some());
    assert_eq!(listing.urls_processed, 500);
    assert_eq!(listing.tree.child("p").unwrap().children.len(), 500);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stop_keeps_partial_tree() {
    let registry = CrawlerRegistry::new(
        crawler_config(4, 10),
        Arc::new(HoldOpen {
            paths: vec!["x", "y/z", "y/w"],
        }),
    );
    registry.start("example.com").await.unwrap();
    let session = registry.session("example.com").await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while session.stats().processed() < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("workers did not process the queued URLs");
    assert_eq!(session.status(), CrawlStatus::Running);

    assert_eq!(registry.stop("example.com").await, StopOutcome::Stopping);
    assert_eq!(finished(&session).await, CrawlStatus::Stopped);
    assert_eq!(session.active_workers(), 0);

    let listing = registry.list("example.com").await.unwrap();
    assert_eq!(listing.status, CrawlStatus::Stopped);
    assert_eq!(listing.tree.paths(), vec!["x", "y", "y/w", "y/z"]);
}

#[tokio::test]
async fn test_second_stop_is_a_no_op() {
    let registry = CrawlerRegistry::new(
        crawler_config(2, 2),
        Arc::new(HoldOpen { paths: vec!["a"] }),
    );
    registry.start("example.com").await.unwrap();
    let session = registry.session("example.com").await.unwrap();

    assert_eq!(registry.stop("example.com").await, StopOutcome::Stopping);
    assert_eq!(finished(&session).await, CrawlStatus::Stopped);

    let before = registry.list("example.com").await.unwrap();
    assert_eq!(
        registry.stop("example.com").await,
        StopOutcome::AlreadyFinished
    );
    let after = registry.list("example.com").await.unwrap();

    assert_eq!(after.status, CrawlStatus::Stopped);
    assert_eq!(after.tree, before.tree);
    assert_eq!(after.finished_at, before.finished_at);
}

#[tokio::test]
async fn test_unknown_site() {
    let registry = CrawlerRegistry::new(crawler_config(2, 2), Scripted::new(["a"]));

    assert!(registry.list("nope.com").await.is_none());
    assert_eq!(registry.stop("nope.com").await, StopOutcome::NotFound);
    assert!(registry.sites().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sessions_are_independent() {
    let registry = CrawlerRegistry::new(crawler_config(4, 4), Scripted::new(["shared/page"]));

    registry.start("one.example.com").await.unwrap();
    registry.start("two.example.com").await.unwrap();

    for site in ["one.example.com", "two.example.com"] {
        let session = registry.session(site).await.unwrap();
        assert_eq!(finished(&session).await, CrawlStatus::Completed);

        let listing = registry.list(site).await.unwrap();
        assert_eq!(listing.tree.name, site);
        assert_eq!(listing.tree.paths(), vec!["shared", "shared/page"]);
    }

    assert_eq!(
        registry.sites().await,
        vec!["one.example.com", "two.example.com"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_restart_after_completion_builds_fresh_tree() {
    let registry = CrawlerRegistry::new(crawler_config(2, 4), Scripted::new(["a/b"]));

    registry.start("example.com").await.unwrap();
    let first = registry.session("example.com").await.unwrap();
    assert_eq!(finished(&first).await, CrawlStatus::Completed);

    let outcome = registry.start("https://example.com").await.unwrap();
    assert_eq!(
        outcome,
        StartOutcome::Restarted {
            site: "example.com".to_string()
        }
    );

    let second = registry.session("example.com").await.unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(finished(&second).await, CrawlStatus::Completed);
    assert_eq!(second.snapshot().paths(), vec!["a", "a/b"]);
}
