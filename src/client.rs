//! Client for a running crawler server

use crate::server::{Reply, SitesReply};
use crate::tree::{self, TreeListing};
use crate::{Result, SitetreeError, UrlError};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use url::Url;

/// Default server address, matching the server's default `listen-addr`
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:50051";

/// Calls the start/stop/list API of a crawler server
#[derive(Debug, Clone)]
pub struct CrawlerClient {
    base: Url,
    http: Client,
}

impl CrawlerClient {
    /// Creates a client for the server at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(UrlError::Malformed(format!("Not a server URL: {}", base_url)).into());
        }

        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { base, http })
    }

    /// Starts crawling `site`; returns the server's acknowledgement
    pub async fn start(&self, site: &str) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint(&[site, "start"])?)
            .send()
            .await?;
        Self::message(response).await
    }

    /// Stops crawling `site`; returns the server's acknowledgement
    pub async fn stop(&self, site: &str) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint(&[site, "stop"])?)
            .send()
            .await?;
        Self::message(response).await
    }

    /// Fetches the current tree for `site`, or `None` if the server has never crawled it
    pub async fn list(&self, site: &str) -> Result<Option<TreeListing>> {
        let response = self.http.get(self.endpoint(&[site])?).send().await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(None),
            status if status.is_success() => {
                let bytes = response.bytes().await?;
                tracing::debug!("Received {} encoded bytes for {}", bytes.len(), site);
                Ok(Some(tree::decode(&bytes)?))
            }
            status => Err(SitetreeError::Server(format!(
                "list {} failed with {}: {}",
                site,
                status,
                response.text().await.unwrap_or_default()
            ))),
        }
    }

    /// Site keys known to the server
    pub async fn sites(&self) -> Result<Vec<String>> {
        let response = self.http.get(self.endpoint(&[])?).send().await?;
        if !response.status().is_success() {
            return Err(SitetreeError::Server(format!(
                "listing sites failed with {}",
                response.status()
            )));
        }
        Ok(response.json::<SitesReply>().await?.sites)
    }

    /// `{base}/crawlers/{parts...}`, each part percent-encoded as one segment
    fn endpoint(&self, parts: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| UrlError::Malformed(self.base.to_string()))?;
            segments.pop_if_empty().push("crawlers");
            segments.extend(parts);
        }
        Ok(url)
    }

    async fn message(response: Response) -> Result<String> {
        let status = response.status();
        let reply: Reply = response.json().await?;
        if status.is_success() {
            Ok(reply.message)
        } else {
            Err(SitetreeError::Server(reply.message))
        }
    }
}
