use crate::url::domain::extract_domain;
use crate::{UrlError, UrlResult};
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
];

/// Normalizes a discovered link so the same page is only visited once
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not HTTP or HTTPS
/// 3. Require a host
/// 4. Remove fragment (everything after #)
/// 5. Remove tracking query parameters and sort the rest
/// 6. Remove empty query string (trailing ?)
///
/// Host case is folded by the parser. The path is left alone: the tree
/// builder already ignores trailing slashes, and some sites serve
/// different pages for `/a` and `/a/`.
///
/// # Examples
///
/// ```
/// use sitetree::url::normalize_link;
///
/// let url = normalize_link("https://Example.com/docs?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// ```
pub fn normalize_link(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Normalizes a user-supplied site identifier into a registry key
///
/// Accepts a bare host (`example.com`), a host with port, or a full URL
/// (`https://Example.com/`). The key is the lowercase host, with the port
/// appended when it is not the scheme default.
///
/// # Examples
///
/// ```
/// use sitetree::url::normalize_site;
///
/// assert_eq!(normalize_site("Example.COM").unwrap(), "example.com");
/// assert_eq!(normalize_site("https://example.com/blog").unwrap(), "example.com");
/// assert_eq!(normalize_site("localhost:8080").unwrap(), "localhost:8080");
/// ```
pub fn normalize_site(input: &str) -> UrlResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::MissingDomain);
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| UrlError::Parse(format!("{}: {}", input, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    extract_domain(&url).ok_or(UrlError::MissingDomain)
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort();
    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
