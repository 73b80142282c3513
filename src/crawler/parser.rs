//! Link extraction from fetched HTML

use scraper::{Html, Selector};
use url::Url;

/// Selectors whose `href` points at another page worth visiting
const LINK_SELECTORS: &[&str] = &["a[href]:not([download])", "link[rel='canonical'][href]"];

/// Schemes that never lead to a crawlable page
const SKIPPED_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:", "#"];

/// Extracts every followable link from an HTML page, resolved against `base_url`
///
/// Anchors marked `download`, same-page fragments and non-HTTP schemes are
/// skipped. `rel="nofollow"` links are kept: the crawl maps the site, it does
/// not rank it. Order follows the document, duplicates included.
///
/// # Example
///
/// ```
/// use sitetree::crawler::extract_links;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/").unwrap();
/// let links = extract_links(r#"<a href="intro">Intro</a>"#, &base);
/// assert_eq!(links, vec!["https://example.com/docs/intro"]);
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for raw_selector in LINK_SELECTORS {
        let Ok(selector) = Selector::parse(raw_selector) else {
            continue;
        };

        for element in document.select(&selector) {
            if let Some(link) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.push(link);
            }
        }
    }

    links
}

/// Resolves an href to an absolute HTTP(S) URL, or `None` if it should not be followed
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    matches!(absolute.scheme(), "http" | "https").then(|| absolute.to_string())
}
