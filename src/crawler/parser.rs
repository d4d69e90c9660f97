//! HTML link extraction
//!
//! Only `<a href>` anchors inside `<body>` are followed. Links are resolved
//! against the page's final URL and normalized so that the visited set sees
//! one spelling per page.

use crate::url::normalize_url;
use scraper::{Html, Selector};
use url::Url;

/// Extracts the followable links of a page
///
/// # Exclusions
///
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
/// - Anything that is not http(s) after resolution
///
/// Duplicates are removed, first occurrence wins.
///
/// # Example
///
/// ```
/// use sitedex::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page/">Link</a><a href="/page#x">Again</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base_url);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/page");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links: Vec<Url> = Vec::new();

    if let Ok(a_selector) = Selector::parse("body a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_link(href, base_url) {
                    if !links.contains(&url) {
                        links.push(url);
                    }
                }
            }
        }
    }

    links
}

/// Resolves a link href to a normalized absolute URL
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    normalize_url(absolute.as_str()).ok()
}
