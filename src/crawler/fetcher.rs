//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured identification headers
//! - GET requests that follow redirects and report any status code as a value
//! - Error classification for failed requests
//! - Best-effort status probing after a failure

use crate::config::{ConnectionConfig, CrawlerConfig, MessagesConfig};
use reqwest::header::{CONTENT_TYPE, REFERER};
use reqwest::{redirect::Policy, Client};
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum redirect hops followed per request
const MAX_REDIRECTS: usize = 10;

/// Status recorded when even the probe request fails
const FALLBACK_STATUS: u16 = 500;

/// Errors raised before a response status was received
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Request failed: {0}")]
    Other(String),
}

impl FetchError {
    /// Classifies a reqwest error
    ///
    /// Certificate and handshake problems are only visible in the source
    /// chain, so it is scanned before the connect check.
    pub fn classify(error: &reqwest::Error) -> Self {
        let message = error.to_string();

        if error.is_timeout() {
            return Self::Timeout(message);
        }

        let mut source = error.source();
        while let Some(cause) = source {
            if is_tls_failure(&cause.to_string()) {
                return Self::Tls(cause.to_string());
            }
            source = cause.source();
        }

        if error.is_connect() {
            Self::Connect(message)
        } else {
            Self::Other(message)
        }
    }

    /// Text written to the site's last error
    pub fn user_message(&self, messages: &MessagesConfig) -> String {
        match self {
            Self::Tls(_) => messages.certificate_error.clone(),
            Self::Other(_) => messages.unknown_error.clone(),
            Self::Timeout(_) | Self::Connect(_) => self.to_string(),
        }
    }
}

/// Returns true if an error message describes a certificate or handshake failure
fn is_tls_failure(text: &str) -> bool {
    let text = text.to_lowercase();
    text.contains("certificate") || text.contains("tls") || text.contains("handshake")
}

/// Response of a completed request
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Final URL after redirects
    pub final_url: Url,
    /// Page body; left empty for non-HTML responses
    pub body: String,
}

impl FetchedPage {
    /// Returns true for HTML responses
    ///
    /// A response without a Content-Type header is treated as HTML.
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            Some(content_type) => is_html_content_type(content_type),
            None => true,
        }
    }
}

fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

/// Builds the crawler's HTTP client
///
/// # Example
///
/// ```no_run
/// use sitedex::config::{ConnectionConfig, CrawlerConfig};
/// use sitedex::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default(), &ConnectionConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    connection: &ConnectionConfig,
) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_millis(crawler.fetch_timeout_ms);

    Client::builder()
        .user_agent(connection.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP collaborator of the crawl tasks
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    probe_client: Client,
    referrer: String,
}

impl Fetcher {
    pub fn new(crawler: &CrawlerConfig, connection: &ConnectionConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(crawler, connection)?;
        let probe_client = Client::builder()
            .timeout(Duration::from_millis(crawler.fetch_timeout_ms))
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            probe_client,
            referrer: connection.referrer.clone(),
        })
    }

    /// Fetches a URL
    ///
    /// Non-2xx responses are returned as values; only failures that happen
    /// before a status is received become errors. The body is read for HTML
    /// responses only.
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .header(REFERER, self.referrer.as_str())
            .send()
            .await
            .map_err(|e| FetchError::classify(&e))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut page = FetchedPage {
            status,
            content_type,
            final_url,
            body: String::new(),
        };

        if page.is_html() {
            page.body = response.text().await.map_err(|e| FetchError::classify(&e))?;
        }

        Ok(page)
    }

    /// Best-effort status code for a URL whose fetch failed
    ///
    /// Uses a plain request without the crawler headers and falls back to
    /// 500 when that fails as well.
    pub async fn probe_status_code(&self, url: &Url) -> u16 {
        match self.probe_client.get(url.as_str()).send().await {
            Ok(response) => response.status().as_u16(),
            Err(_) => FALLBACK_STATUS,
        }
    }
}
