//! Sitetree: a concurrent site-map builder
//!
//! This crate runs named crawl jobs, one per site. Each job discovers pages on
//! its site and folds every discovered URL path into a tree of path segments,
//! using a pool of workers that share the tree. A registry of jobs is exposed
//! over HTTP so crawls can be started, stopped and listed remotely.

pub mod client;
pub mod config;
pub mod crawler;
pub mod server;
pub mod state;
pub mod tree;
pub mod url;

use thiserror::Error;

/// Main error type for Sitetree operations
#[derive(Debug, Error)]
pub enum SitetreeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Tree codec error: {0}")]
    Codec(#[from] tree::CodecError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Discovery failed for {site}: {message}")]
    Discovery { site: String, message: String },

    #[error("Server error: {0}")]
    Server(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Sitetree operations
pub type Result<T> = std::result::Result<T, SitetreeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use client::CrawlerClient;
pub use config::Config;
pub use crawler::{CrawlSession, CrawlerRegistry, Discovery, HttpDiscovery, UrlSink};
pub use state::CrawlStatus;
pub use tree::{Node, TreeListing, TreeSnapshot};
pub use url::{decompose, normalize_site};
