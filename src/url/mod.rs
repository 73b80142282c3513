//! URL handling module for Sitetree
//!
//! This module turns URLs into the keys the crawler works with: path
//! segments for the tree, site keys for the registry, and normalized links
//! for the discovery producer's visited set.

mod domain;
mod normalize;
mod segments;

// Re-export main functions
pub use domain::extract_domain;
pub use normalize::{normalize_link, normalize_site};
pub use segments::{decompose, split_path};
