//! One crawl of one site
//!
//! A session owns the site tree, the bounded queue between the discovery
//! producer and the worker pool, and the cancellation token both of them
//! watch. `launch` starts everything and returns at once; a driver task
//! waits for discovery to finish, which closes the queue, then joins the
//! workers and records the terminal status.
//!
//! Reads of the tree (`snapshot`, `listing`) never wait for the crawl and
//! are not transactional: while the session is running they may see a
//! partially built tree.

use crate::config::CrawlerConfig;
use crate::crawler::discovery::{Discovery, UrlSink};
use crate::crawler::worker::{PoolStats, WorkerPool};
use crate::state::CrawlStatus;
use crate::tree::{Node, TreeListing, TreeSnapshot};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Result of asking a session (or the registry) to stop a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The session was running; it has been told to stop
    Stopping,
    /// The session had already reached a terminal status
    AlreadyFinished,
    /// No session exists for the site
    NotFound,
}

/// A crawl of one site
#[derive(Debug)]
pub struct CrawlSession {
    site: String,
    root: Arc<Node>,
    cancel: CancellationToken,
    stats: Arc<PoolStats>,
    status: watch::Sender<CrawlStatus>,
    started_at: DateTime<Utc>,
    finished_at: Mutex<Option<DateTime<Utc>>>,
}

impl CrawlSession {
    fn new(site: String) -> Self {
        let (status, _) = watch::channel(CrawlStatus::Created);
        Self {
            root: Arc::new(Node::new(site.clone())),
            site,
            cancel: CancellationToken::new(),
            stats: Arc::new(PoolStats::default()),
            status,
            started_at: Utc::now(),
            finished_at: Mutex::new(None),
        }
    }

    /// Starts a crawl of `site` and returns without waiting for it
    ///
    /// Spawns `config.workers` workers and a driver task that runs
    /// `discovery`. Must be called from within a Tokio runtime.
    pub fn launch(
        site: impl Into<String>,
        config: &CrawlerConfig,
        discovery: Arc<dyn Discovery>,
    ) -> Arc<Self> {
        let session = Arc::new(Self::new(site.into()));
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));

        let pool = WorkerPool::spawn(
            config.workers.max(1),
            Arc::clone(&session.root),
            rx,
            session.cancel.clone(),
            Arc::clone(&session.stats),
        );
        session.transition(CrawlStatus::Running);

        let sink = UrlSink::new(tx, session.cancel.clone());
        tokio::spawn(Arc::clone(&session).drive(discovery, sink, pool));

        tracing::info!(
            "Started crawl of {} with {} workers",
            session.site,
            config.workers
        );
        session
    }

    async fn drive(self: Arc<Self>, discovery: Arc<dyn Discovery>, sink: UrlSink, pool: WorkerPool) {
        // Discovery runs in its own task so a panic in it still ends the session.
        let site = self.site.clone();
        let producer = tokio::spawn(async move { discovery.discover(&site, sink).await });

        // The sink moved into the producer task, so the queue is closed once it ends.
        let discovered = match producer.await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(e) => Err(format!("discovery task failed: {}", e)),
        };

        pool.join().await;
        self.finish(discovered);
    }

    /// Records the terminal status
    ///
    /// The choice between `Stopped` and the producer's own outcome is made
    /// under the status lock, the same lock `stop` cancels under, so a stop
    /// either lands before this (and the session ends `Stopped`) or sees the
    /// terminal status and reports `AlreadyFinished`.
    fn finish(&self, discovered: std::result::Result<(), String>) -> CrawlStatus {
        *self
            .finished_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());

        let mut recorded = None;
        self.status.send_if_modified(|current| {
            let next = match &discovered {
                _ if self.cancel.is_cancelled() => CrawlStatus::Stopped,
                Ok(()) => CrawlStatus::Completed,
                Err(reason) => CrawlStatus::Failed(reason.clone()),
            };
            if !current.can_transition_to(&next) {
                return false;
            }
            *current = next.clone();
            recorded = Some(next);
            true
        });

        match recorded {
            Some(status) => {
                if let CrawlStatus::Failed(reason) = &status {
                    tracing::error!("Crawl of {} failed: {}", self.site, reason);
                }
                tracing::info!(
                    "Crawl of {} {} after {} URLs ({} nodes)",
                    self.site,
                    status,
                    self.stats.processed(),
                    self.root.node_count()
                );
                status
            }
            None => self.status(),
        }
    }

    fn transition(&self, next: CrawlStatus) -> bool {
        self.status.send_if_modified(|current| {
            if current.can_transition_to(&next) {
                *current = next.clone();
                true
            } else {
                tracing::debug!(
                    "Ignoring transition {} -> {} for {}",
                    current,
                    next,
                    self.site
                );
                false
            }
        })
    }

    /// Asks the crawl to stop
    ///
    /// Fires the cancellation token: the producer stops visiting, blocked
    /// sends and receives return, and workers exit without inserting any
    /// URL they receive afterwards. Idempotent; a no-op on a finished session.
    pub fn stop(&self) -> StopOutcome {
        let mut outcome = StopOutcome::AlreadyFinished;
        self.status.send_if_modified(|current| {
            if !current.is_terminal() {
                outcome = StopOutcome::Stopping;
                if !self.cancel.is_cancelled() {
                    tracing::info!("Stopping crawl of {}", self.site);
                    self.cancel.cancel();
                }
            }
            false
        });
        outcome
    }

    /// Waits until the session reaches a terminal status and returns it
    pub async fn wait(&self) -> CrawlStatus {
        let mut rx = self.status.subscribe();
        let status = match rx.wait_for(CrawlStatus::is_terminal).await {
            Ok(status) => status.clone(),
            Err(_) => self.status(),
        };
        status
    }

    /// The site key this session crawls
    pub fn site(&self) -> &str {
        &self.site
    }

    /// Current lifecycle status
    pub fn status(&self) -> CrawlStatus {
        self.status.borrow().clone()
    }

    /// Workers that have not yet exited
    pub fn active_workers(&self) -> usize {
        self.stats.active()
    }

    /// Worker counters
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// The live tree
    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    /// Owned copy of the tree as it is now
    pub fn snapshot(&self) -> TreeSnapshot {
        self.root.snapshot()
    }

    /// Tree plus progress, as returned by `list`
    pub fn listing(&self) -> TreeListing {
        TreeListing {
            site: self.site.clone(),
            status: self.status(),
            started_at: self.started_at,
            finished_at: *self
                .finished_at
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
            urls_processed: self.stats.processed(),
            tree: self.snapshot(),
        }
    }
}
