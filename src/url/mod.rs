//! URL handling module for Sitedex
//!
//! This module provides URL normalization, the home-page form used to
//! identify a site, same-site checks and the non-HTML file denylist.

mod normalize;

use crate::UrlError;
use std::fmt;
use url::Url;

pub use normalize::normalize_url;

/// File extensions that never lead to an HTML page
const FILE_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "jpg", "jpeg", "gif", "png", "bmp",
    "webp", "svg", "ico", "tif", "tiff", "eps", "fig", "mp3", "mp4", "aac", "wav", "avi", "mov",
    "webm", "json", "csv", "xml", "exe", "apk", "msi", "dmg", "rar", "zip", "gz", "tgz", "7z",
    "tar", "jar", "bin", "iso", "nc", "m",
];

/// Home page of a site: scheme, host and port with no trailing slash
///
/// Every page of the site is stored relative to this address.
///
/// # Examples
///
/// ```
/// use sitedex::url::SiteUrl;
/// use url::Url;
///
/// let site = SiteUrl::parse("https://Example.com/about/").unwrap();
/// assert_eq!(site.as_str(), "https://example.com");
///
/// let page = Url::parse("https://www.example.com/news?id=7").unwrap();
/// assert!(site.contains(&page));
/// assert_eq!(site.path_of(&page), "/news?id=7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SiteUrl {
    home: String,
    host: String,
    port: Option<u16>,
}

impl SiteUrl {
    /// Derives the site home page from any URL on the site
    pub fn parse(url_str: &str) -> Result<Self, UrlError> {
        let url = normalize_url(url_str)?;
        Self::from_url(&url)
    }

    /// Derives the site home page from a parsed URL
    pub fn from_url(url: &Url) -> Result<Self, UrlError> {
        let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();
        let port = url.port();
        let home = match port {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };

        Ok(Self {
            home,
            host: strip_www(&host).to_string(),
            port,
        })
    }

    /// The home page string, e.g. `https://example.com`
    pub fn as_str(&self) -> &str {
        &self.home
    }

    /// Returns true when the URL lives on this site
    ///
    /// Hosts are compared without a leading `www.` and the scheme is ignored.
    pub fn contains(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => {
                strip_www(&host.to_lowercase()) == self.host && url.port() == self.port
            }
            None => false,
        }
    }

    /// Path of a URL relative to the site, including the query string
    pub fn path_of(&self, url: &Url) -> String {
        match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        }
    }

    /// Absolute URL of the home page itself
    pub fn root(&self) -> Result<Url, UrlError> {
        self.join("/")
    }

    /// Resolves a site-relative path into an absolute URL
    pub fn join(&self, path: &str) -> Result<Url, UrlError> {
        let base = Url::parse(&format!("{}/", self.home))
            .map_err(|e| UrlError::Parse(e.to_string()))?;
        base.join(path).map_err(|e| UrlError::Parse(e.to_string()))
    }
}

impl fmt::Display for SiteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.home)
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Returns true if the URL path ends in a denylisted file extension
pub fn is_file_url(url: &Url) -> bool {
    let path = url.path();
    let last_segment = path.rsplit('/').next().unwrap_or("");
    match last_segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            FILE_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}
