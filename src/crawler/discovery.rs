//! The seam between a crawl session and whatever finds its URLs
//!
//! A [`Discovery`] implementation walks a site and pushes every absolute URL
//! it visits into a [`UrlSink`]. The sink is the producer end of the
//! session's bounded queue: a full queue makes `send` wait, which throttles
//! discovery to the speed of the tree-building workers. The queue closes
//! once every clone of the sink has been dropped.

use crate::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A producer of URLs for one site
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Walks `site`, sending each visited URL to `sink`
    ///
    /// Implementations should stop issuing new visits once
    /// [`UrlSink::should_continue`] returns false, and return once their
    /// traversal has finished. Returning an error marks the session failed.
    async fn discover(&self, site: &str, sink: UrlSink) -> Result<()>;
}

/// Producer handle for a session's URL queue
///
/// Cancellation is advisory: it makes `send` give up and
/// `should_continue` return false, but nothing interrupts a visit the
/// producer has already started.
#[derive(Debug, Clone)]
pub struct UrlSink {
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
}

impl UrlSink {
    pub fn new(tx: mpsc::Sender<String>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    /// Queues a URL, waiting for space if the queue is full
    ///
    /// # Returns
    ///
    /// * `true` - The URL was queued
    /// * `false` - The session is stopping or its workers are gone; the URL was dropped
    pub async fn send(&self, url: impl Into<String>) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }

        let url = url.into();
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(url) => sent.is_ok(),
        }
    }

    /// Whether the producer should keep visiting links
    pub fn should_continue(&self) -> bool {
        !self.cancel.is_cancelled() && !self.tx.is_closed()
    }

    /// Resolves once the session has been asked to stop
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}
