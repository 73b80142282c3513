//! Tree-building worker pool
//!
//! `N` tasks share one receiver and drain the session queue. Each URL is
//! decomposed and inserted into the session tree. A worker exits when the
//! queue is closed and empty, or when the session is cancelled. A URL
//! received after cancellation is discarded, not inserted.

use crate::tree::Node;
use crate::url::decompose;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Counters shared between a pool and the session that owns it
#[derive(Debug, Default)]
pub struct PoolStats {
    active: AtomicUsize,
    processed: AtomicU64,
    skipped: AtomicU64,
    discarded: AtomicU64,
}

impl PoolStats {
    /// Workers that have not yet exited
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// URLs decomposed and inserted into the tree
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// URLs dropped because they could not be parsed
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// URLs dequeued after the session was stopped
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

/// Decrements the active count when a worker task ends, however it ends
struct ActiveWorker(Arc<PoolStats>);

impl ActiveWorker {
    fn enter(stats: Arc<PoolStats>) -> Self {
        stats.active.fetch_add(1, Ordering::SeqCst);
        Self(stats)
    }
}

impl Drop for ActiveWorker {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Everything a worker needs; cheap to clone
#[derive(Clone)]
struct WorkerContext {
    root: Arc<Node>,
    queue: Arc<Mutex<mpsc::Receiver<String>>>,
    cancel: CancellationToken,
    stats: Arc<PoolStats>,
}

/// A running set of tree-building workers
pub struct WorkerPool {
    tasks: JoinSet<()>,
}

impl WorkerPool {
    /// Spawns `count` workers draining `queue` into `root`
    ///
    /// `stats.active()` already counts every worker when this returns.
    pub fn spawn(
        count: usize,
        root: Arc<Node>,
        queue: mpsc::Receiver<String>,
        cancel: CancellationToken,
        stats: Arc<PoolStats>,
    ) -> Self {
        let ctx = WorkerContext {
            root,
            queue: Arc::new(Mutex::new(queue)),
            cancel,
            stats,
        };

        let mut tasks = JoinSet::new();
        for id in 0..count {
            let guard = ActiveWorker::enter(Arc::clone(&ctx.stats));
            let ctx = ctx.clone();
            tasks.spawn(async move {
                let _guard = guard;
                run_worker(id, ctx).await;
            });
        }

        Self { tasks }
    }

    /// Waits for every worker to exit
    pub async fn join(mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }
    }
}

async fn run_worker(id: usize, ctx: WorkerContext) {
    loop {
        let next = {
            let mut queue = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => break,
                queue = ctx.queue.lock() => queue,
            };
            tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => break,
                next = queue.recv() => next,
            }
        };

        let Some(raw) = next else {
            break;
        };

        if !handle_received(id, &ctx, &raw) {
            break;
        }
    }

    tracing::trace!(worker = id, "Stopping processing");
}

/// Handles one dequeued URL; returns false if the worker should exit
///
/// A receive can complete in the same instant the session is stopped. The
/// token is checked again here so such a URL is discarded, never inserted.
fn handle_received(id: usize, ctx: &WorkerContext, raw: &str) -> bool {
    if ctx.cancel.is_cancelled() {
        ctx.stats.discarded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(worker = id, "Discarding {} received after stop", raw);
        return false;
    }

    process_url(id, ctx, raw);
    true
}

fn process_url(id: usize, ctx: &WorkerContext, raw: &str) {
    match decompose(raw) {
        Ok(segments) => {
            let created = ctx.root.insert(&segments);
            ctx.stats.processed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(worker = id, created, "Processed {}", raw);
        }
        Err(e) => {
            ctx.stats.skipped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(worker = id, "Skipping {}: {}", raw, e);
        }
    }
}
