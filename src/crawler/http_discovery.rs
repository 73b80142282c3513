//! Breadth-first HTTP discovery producer
//!
//! Walks a single host starting at its root page. Every URL is pushed to the
//! session queue at the moment it is requested, so the tree grows while
//! pages are still being fetched. Links leaving the host are ignored.

use crate::config::Config;
use crate::crawler::discovery::{Discovery, UrlSink};
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchResult};
use crate::crawler::parser::extract_links;
use crate::url::{extract_domain, normalize_link};
use crate::{Result, SitetreeError};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use tokio::task::JoinSet;
use url::Url;

/// Discovery producer backed by real HTTP fetches
#[derive(Debug, Clone)]
pub struct HttpDiscovery {
    client: Client,
    scheme: String,
    max_concurrent_requests: usize,
    max_pages: usize,
}

impl HttpDiscovery {
    /// Creates a producer from the crawler and user-agent configuration
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_http_client(&config.user_agent, &config.crawler)?;
        Ok(Self {
            client,
            scheme: "https".to_string(),
            max_concurrent_requests: config.crawler.max_concurrent_requests.max(1),
            max_pages: config.crawler.max_pages,
        })
    }

    /// Uses `scheme` for the seed request instead of `https`
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    fn page_budget_left(&self, visits: usize) -> bool {
        self.max_pages == 0 || visits < self.max_pages
    }

    /// Queues the same-site links found on a fetched page
    fn enqueue_links(
        &self,
        site: &str,
        page: &Url,
        body: &str,
        visited: &mut HashSet<String>,
        frontier: &mut VecDeque<Url>,
    ) {
        let mut added = 0;
        for link in extract_links(body, page) {
            let Ok(normalized) = normalize_link(&link) else {
                continue;
            };
            if extract_domain(&normalized).as_deref() != Some(site) {
                continue;
            }
            if visited.insert(normalized.to_string()) {
                frontier.push_back(normalized);
                added += 1;
            }
        }
        tracing::debug!("{} new links on {}", added, page);
    }
}

#[async_trait]
impl Discovery for HttpDiscovery {
    async fn discover(&self, site: &str, sink: UrlSink) -> Result<()> {
        let seed = normalize_link(&format!("{}://{}/", self.scheme, site))?;
        let seed_key = seed.to_string();

        let mut visited = HashSet::from([seed_key.clone()]);
        let mut frontier = VecDeque::from([seed]);
        let mut in_flight: JoinSet<(Url, FetchResult)> = JoinSet::new();
        let mut visits = 0usize;

        loop {
            while in_flight.len() < self.max_concurrent_requests
                && sink.should_continue()
                && self.page_budget_left(visits)
            {
                let Some(url) = frontier.pop_front() else {
                    break;
                };
                if !sink.send(url.as_str()).await {
                    break;
                }

                visits += 1;
                tracing::debug!("Visiting {}", url);
                let client = self.client.clone();
                in_flight.spawn(async move {
                    let result = fetch_url(&client, url.as_str()).await;
                    (url, result)
                });
            }

            // In-flight fetches are left to finish after a stop; their links are dropped.
            let Some(joined) = in_flight.join_next().await else {
                break;
            };

            let (url, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!("Fetch task for {} failed: {}", site, e);
                    continue;
                }
            };

            match result {
                FetchResult::Success {
                    final_url, body, ..
                } => {
                    if sink.should_continue() {
                        let page = Url::parse(&final_url).unwrap_or(url);
                        self.enqueue_links(site, &page, &body, &mut visited, &mut frontier);
                    }
                }
                failure @ (FetchResult::HttpError { .. } | FetchResult::NetworkError { .. })
                    if url.as_str() == seed_key =>
                {
                    return Err(SitetreeError::Discovery {
                        site: site.to_string(),
                        message: format!("{}: {}", seed_key, failure.describe()),
                    });
                }
                failure => {
                    tracing::debug!("Not expanding {}: {}", url, failure.describe());
                }
            }
        }

        tracing::info!("Discovery for {} finished after {} visits", site, visits);
        Ok(())
    }
}
