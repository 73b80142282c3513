//! Request handlers for the crawler API

use crate::crawler::{CrawlerRegistry, StartOutcome};
use crate::server::{Reply, SitesReply};
use crate::tree;
use crate::url::normalize_site;
use axum::{
    extract::{Path, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// `POST /crawlers/:site/start`
pub async fn start_crawler(
    State(registry): State<Arc<CrawlerRegistry>>,
    Path(site): Path<String>,
) -> (StatusCode, Json<Reply>) {
    match registry.start(&site).await {
        Ok(StartOutcome::AlreadyRunning { site }) => (
            StatusCode::OK,
            Json(Reply::new(format!("Crawler {} already running", site))),
        ),
        Ok(outcome) => (
            StatusCode::OK,
            Json(Reply::new(format!("Started Crawler {}", outcome.site()))),
        ),
        Err(e) => {
            tracing::warn!("Rejected start for {}: {}", site, e);
            (
                StatusCode::BAD_REQUEST,
                Json(Reply::new(format!("Cannot start crawler {}: {}", site, e))),
            )
        }
    }
}

/// `POST /crawlers/:site/stop`; succeeds whether or not the site is known
pub async fn stop_crawler(
    State(registry): State<Arc<CrawlerRegistry>>,
    Path(site): Path<String>,
) -> Json<Reply> {
    let outcome = registry.stop(&site).await;
    tracing::debug!("Stop {}: {:?}", site, outcome);

    let key = normalize_site(&site).unwrap_or(site);
    Json(Reply::new(format!("Stopped Crawler {}", key)))
}

/// `GET /crawlers/:site`: the encoded listing, or `204 No Content` for an unknown site
pub async fn list_tree(
    State(registry): State<Arc<CrawlerRegistry>>,
    Path(site): Path<String>,
) -> Response {
    let Some(listing) = registry.list(&site).await else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match tree::encode(&listing) {
        Ok(bytes) => ([(CONTENT_TYPE, "application/octet-stream")], bytes).into_response(),
        Err(e) => {
            tracing::error!("Failed to encode tree for {}: {}", site, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// `GET /crawlers`
pub async fn list_sites(State(registry): State<Arc<CrawlerRegistry>>) -> Json<SitesReply> {
    Json(SitesReply {
        sites: registry.sites().await,
    })
}
