use crate::{UrlError, UrlResult};
use percent_encoding::percent_decode_str;
use url::Url;

/// Splits a URL's path into the segment names used as tree keys
///
/// The path is percent-decoded, trimmed of leading and trailing `/` and split
/// on `/`. Decoding happens first, so an encoded `%2F` separates segments
/// like a literal slash. Invalid UTF-8 after decoding is replaced with
/// U+FFFD. Segments are taken up to the first empty one, so
/// `https://example.com/a//b` yields `["a"]`; every returned segment is
/// non-empty.
///
/// # Arguments
///
/// * `raw` - An absolute URL
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Ordered path segments (empty for `/` or an empty path)
/// * `Err(UrlError)` - The URL could not be parsed or has no hierarchical path
///
/// # Examples
///
/// ```
/// use sitetree::url::decompose;
///
/// assert_eq!(decompose("https://example.com/a/b/").unwrap(), vec!["a", "b"]);
/// assert!(decompose("https://example.com/").unwrap().is_empty());
/// ```
pub fn decompose(raw: &str) -> UrlResult<Vec<String>> {
    let url = Url::parse(raw).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if url.cannot_be_a_base() {
        return Err(UrlError::Malformed(format!(
            "URL has no hierarchical path: {}",
            raw
        )));
    }

    let path = percent_decode_str(url.path()).decode_utf8_lossy();
    Ok(split_path(&path))
}

/// Splits an already-extracted path into segments
pub fn split_path(path: &str) -> Vec<String> {
    path.trim_matches('/')
        .split('/')
        .take_while(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
