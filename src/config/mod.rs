//! Configuration module for Sitetree
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sitetree::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitetree.toml")).unwrap();
//! println!("Each crawl will run {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, ServerConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
