use serde::Deserialize;

/// Main configuration structure for Sitedex
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of page fetches in flight across all sites
    #[serde(rename = "max-concurrent-fetches", default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: u32,

    /// Deadline for a single fetch (milliseconds)
    #[serde(rename = "fetch-timeout-ms", default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Pause before each fetch (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Store pages during the crawl and index each site afterwards in batches
    #[serde(rename = "deferred-indexing", default)]
    pub deferred_indexing: bool,

    /// Let a successful page put a FAILED site back into INDEXING
    #[serde(rename = "self-heal", default)]
    pub self_heal: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent_fetches(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            request_delay_ms: default_request_delay_ms(),
            deferred_indexing: false,
            self_heal: false,
        }
    }
}

/// Identification sent with every crawler request
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_referrer")]
    pub referrer: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            referrer: default_referrer(),
        }
    }
}

/// Lemma indexing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndexingConfig {
    /// Pages loaded and persisted per chunk in batch mode
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Chunk size below which lemma extraction stops splitting
    #[serde(rename = "split-threshold", default = "default_split_threshold")]
    pub split_threshold: usize,

    /// Weight applied to occurrences inside <title>
    #[serde(rename = "title-weight", default = "default_title_weight")]
    pub title_weight: f32,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            split_threshold: default_split_threshold(),
            title_weight: default_title_weight(),
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Lemmas found on more than this share of pages are ignored
    #[serde(rename = "frequency-threshold-percent", default)]
    pub frequency_threshold_percent: Option<f64>,

    /// Snippet window in characters
    #[serde(rename = "snippet-size", default = "default_snippet_size")]
    pub snippet_size: usize,

    #[serde(rename = "default-limit", default = "default_limit")]
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            frequency_threshold_percent: None,
            snippet_size: default_snippet_size(),
            default_limit: default_limit(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Messages written to a site's last error
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesConfig {
    #[serde(rename = "stopped-by-user", default = "default_stopped_by_user")]
    pub stopped_by_user: String,

    #[serde(rename = "certificate-error", default = "default_certificate_error")]
    pub certificate_error: String,

    #[serde(rename = "unknown-error", default = "default_unknown_error")]
    pub unknown_error: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            stopped_by_user: default_stopped_by_user(),
            certificate_error: default_certificate_error(),
            unknown_error: default_unknown_error(),
        }
    }
}

/// A site to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    /// Home page of the site
    pub url: String,

    /// Display name
    pub name: String,
}

fn default_max_concurrent_fetches() -> u32 {
    8
}

fn default_fetch_timeout_ms() -> u64 {
    30_000
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    "SitedexBot/0.1 (+https://github.com/sitedex/sitedex)".to_string()
}

fn default_referrer() -> String {
    "http://www.google.com".to_string()
}

fn default_batch_size() -> usize {
    500
}

fn default_split_threshold() -> usize {
    20
}

fn default_title_weight() -> f32 {
    1.0
}

fn default_snippet_size() -> usize {
    200
}

fn default_limit() -> usize {
    20
}

fn default_stopped_by_user() -> String {
    "Indexing stopped by user".to_string()
}

fn default_certificate_error() -> String {
    "Site certificate error".to_string()
}

fn default_unknown_error() -> String {
    "Unknown error".to_string()
}
