use dashmap::DashSet;

/// Process-wide record of the URLs claimed by crawl tasks
///
/// `mark_if_new` is the only deduplication point between concurrent tasks:
/// the underlying set insert is atomic, so exactly one caller wins a URL.
/// Claimed URLs stay in flight until the owning task calls `complete`.
#[derive(Debug, Default)]
pub struct VisitedUrls {
    visited: DashSet<String>,
    in_flight: DashSet<String>,
}

impl VisitedUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a URL; returns true only for the first caller
    pub fn mark_if_new(&self, url: &str) -> bool {
        if self.visited.insert(url.to_string()) {
            self.in_flight.insert(url.to_string());
            true
        } else {
            false
        }
    }

    /// Returns true if the URL was already claimed
    pub fn contains(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Marks a claimed URL as fully processed
    pub fn complete(&self, url: &str) {
        self.in_flight.remove(url);
    }

    /// Forgets every URL under a site home page
    pub fn clear(&self, site_prefix: &str) {
        self.visited.retain(|url| !is_under(url, site_prefix));
        self.in_flight.retain(|url| !is_under(url, site_prefix));
    }

    /// Returns true once no URL under the prefix is still in flight
    pub fn is_drained(&self, site_prefix: &str) -> bool {
        !self.in_flight.iter().any(|url| is_under(url.key(), site_prefix))
    }

    /// Number of claimed URLs
    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}

/// `https://a.ru/x` is under `https://a.ru` but `https://a.ruby.org/` is not
fn is_under(url: &str, site_prefix: &str) -> bool {
    match url.strip_prefix(site_prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}
