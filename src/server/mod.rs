//! HTTP transport for the crawler registry
//!
//! | Route | Effect |
//! |-------|--------|
//! | `POST /crawlers/:site/start` | start a crawl, JSON ack |
//! | `POST /crawlers/:site/stop` | stop a crawl, JSON ack |
//! | `GET /crawlers/:site` | encoded [`crate::tree::TreeListing`], `204` if unknown |
//! | `GET /crawlers` | JSON list of known sites |

mod routes;

use crate::crawler::CrawlerRegistry;
use crate::{Result, SitetreeError};
use axum::{
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Acknowledgement returned by start and stop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub message: String,
}

impl Reply {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of `GET /crawlers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitesReply {
    pub sites: Vec<String>,
}

/// Builds the API router around a registry
pub fn router(registry: Arc<CrawlerRegistry>) -> Router {
    Router::new()
        .route("/crawlers", get(routes::list_sites))
        .route("/crawlers/:site", get(routes::list_tree))
        .route("/crawlers/:site/start", post(routes::start_crawler))
        .route("/crawlers/:site/stop", post(routes::stop_crawler))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

/// Serves the API on `listener` until `shutdown` resolves, then stops every crawl
pub async fn serve<F>(registry: Arc<CrawlerRegistry>, listener: TcpListener, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("Crawler server listening on {}", addr);

    axum::serve(listener, router(Arc::clone(&registry)))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| SitetreeError::Server(e.to_string()))?;

    tracing::info!("Server shut down, stopping crawls");
    registry.shutdown().await;
    Ok(())
}
