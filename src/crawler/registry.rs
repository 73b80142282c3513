//! Named crawl sessions, one per site
//!
//! The registry is constructed explicitly and shared by `Arc` with whatever
//! serves requests. Its map has its own lock, separate from any session's
//! tree locks; the map lock is only held to look up, insert or replace an
//! entry, never while a tree is being read or the crawl is waited on.

use crate::config::CrawlerConfig;
use crate::crawler::discovery::Discovery;
use crate::crawler::session::{CrawlSession, StopOutcome};
use crate::tree::TreeListing;
use crate::url::normalize_site;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Result of a start request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new session was created for a site never crawled before
    Started { site: String },
    /// A finished session was replaced by a fresh one
    Restarted { site: String },
    /// A session for the site is still running; nothing was changed
    AlreadyRunning { site: String },
}

impl StartOutcome {
    /// The normalized site key the request resolved to
    pub fn site(&self) -> &str {
        match self {
            Self::Started { site } | Self::Restarted { site } | Self::AlreadyRunning { site } => {
                site
            }
        }
    }
}

/// Process-wide set of crawl sessions keyed by site
pub struct CrawlerRegistry {
    config: CrawlerConfig,
    discovery: Arc<dyn Discovery>,
    sessions: RwLock<HashMap<String, Arc<CrawlSession>>>,
}

impl CrawlerRegistry {
    /// Creates an empty registry whose sessions use `discovery` to find URLs
    pub fn new(config: CrawlerConfig, discovery: Arc<dyn Discovery>) -> Self {
        Self {
            config,
            discovery,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Starts crawling `site` unless it is already being crawled
    ///
    /// A site whose previous session has finished (completed, stopped or
    /// failed) is crawled again from an empty tree. Returns as soon as the
    /// session is launched.
    ///
    /// # Errors
    ///
    /// Only if `site` cannot be turned into a site key.
    pub async fn start(&self, site: &str) -> Result<StartOutcome> {
        let key = normalize_site(site)?;
        let mut sessions = self.sessions.write().await;

        let restarting = match sessions.get(&key) {
            Some(existing) if existing.status().is_active() => {
                tracing::info!("Crawl of {} already running", key);
                return Ok(StartOutcome::AlreadyRunning { site: key });
            }
            Some(_) => true,
            None => false,
        };

        let session = CrawlSession::launch(key.clone(), &self.config, Arc::clone(&self.discovery));
        sessions.insert(key.clone(), session);

        Ok(if restarting {
            StartOutcome::Restarted { site: key }
        } else {
            StartOutcome::Started { site: key }
        })
    }

    /// Asks the crawl of `site` to stop; never waits for it
    pub async fn stop(&self, site: &str) -> StopOutcome {
        match self.session(site).await {
            Some(session) => session.stop(),
            None => StopOutcome::NotFound,
        }
    }

    /// Current tree and status for `site`, or `None` if it was never started
    pub async fn list(&self, site: &str) -> Option<TreeListing> {
        self.session(site).await.map(|session| session.listing())
    }

    /// Looks up the session for `site`
    pub async fn session(&self, site: &str) -> Option<Arc<CrawlSession>> {
        let key = normalize_site(site).ok()?;
        self.sessions.read().await.get(&key).cloned()
    }

    /// All known site keys, sorted
    pub async fn sites(&self) -> Vec<String> {
        let mut sites: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        sites.sort();
        sites
    }

    /// Stops every session and waits for all of them to finish
    pub async fn shutdown(&self) {
        let sessions: Vec<Arc<CrawlSession>> =
            self.sessions.read().await.values().cloned().collect();

        for session in &sessions {
            session.stop();
        }
        for session in &sessions {
            session.wait().await;
        }
        tracing::info!("Stopped {} crawl sessions", sessions.len());
    }
}
