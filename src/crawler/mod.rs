//! Crawler module: sessions, their worker pools, and the registry of sessions
//!
//! This module contains the concurrent side of the crate:
//! - The `Discovery` seam and its queue handle, `UrlSink`
//! - `HttpDiscovery`, which walks a site over HTTP
//! - The worker pool that folds discovered URLs into a session's tree
//! - `CrawlSession` lifecycle and the `CrawlerRegistry` of named sessions
//!
//! ```text
//! Discovery ──send──► bounded queue ──recv──► N workers ──insert──► Node tree
//!                           ▲                      ▲
//!                           └──── CancellationToken (stop) ────┘
//! ```

mod discovery;
mod fetcher;
mod http_discovery;
mod parser;
mod registry;
mod session;
mod worker;

pub use discovery::{Discovery, UrlSink};
pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use http_discovery::HttpDiscovery;
pub use parser::extract_links;
pub use registry::{CrawlerRegistry, StartOutcome};
pub use session::{CrawlSession, StopOutcome};
pub use worker::{PoolStats, WorkerPool};
