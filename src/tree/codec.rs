//! Wire encoding for tree listings: MessagePack, then zstd

use crate::tree::TreeListing;
use thiserror::Error;

/// Errors raised while encoding or decoding a listing
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("MessagePack encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("MessagePack decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("Zstd error: {0}")]
    Compression(#[from] std::io::Error),
}

/// Serializes and compresses a listing for transport
pub fn encode(listing: &TreeListing) -> Result<Vec<u8>, CodecError> {
    let bytes = rmp_serde::to_vec_named(listing)?;
    let compressed = zstd::encode_all(&bytes[..], 0)?;

    tracing::debug!(
        "Encoded listing for {}: {} bytes, {} compressed",
        listing.site,
        bytes.len(),
        compressed.len()
    );

    Ok(compressed)
}

/// Reverses [`encode`]
pub fn decode(bytes: &[u8]) -> Result<TreeListing, CodecError> {
    let decompressed = zstd::decode_all(bytes)?;
    Ok(rmp_serde::from_slice(&decompressed)?)
}
