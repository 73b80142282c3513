//! Site tree module
//!
//! The tree a crawl produces: one node per URL path segment, rooted at the
//! site key. [`Node`] is the live, concurrently mutated tree; [`TreeSnapshot`]
//! is an owned copy of it for listing, encoding and printing.

mod codec;
mod node;
mod render;
mod snapshot;

pub use codec::{decode, encode, CodecError};
pub use node::Node;
pub use render::render;
pub use snapshot::{TreeListing, TreeSnapshot};
