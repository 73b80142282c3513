//! State module for tracking crawl progress
//!
//! - `CrawlStatus`: lifecycle of one crawl session (created, running, and its
//!   terminal outcomes)

mod crawl_status;

pub use crawl_status::CrawlStatus;
