//! Storage module for persisting sites, pages and the lemma index
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Site rows and their indexing status
//! - Page rows with raw HTML content
//! - Site-scoped lemmas with document frequencies
//! - Postings (page, lemma, rank) forming the inverted index

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::SiteStatus;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// Storage handle shared between crawl tasks, the pipeline and search
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Wraps a storage backend into a [`SharedStorage`] handle
pub fn into_shared<S: Storage + Send + 'static>(storage: S) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Represents a site in the database
#[derive(Debug, Clone)]
pub struct SiteRecord {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub status_time: String,
    pub last_error: Option<String>,
}

/// Represents a stored page
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub id: i64,
    pub site_id: i64,
    /// Path relative to the site home page, including the query string
    pub path: String,
    pub code: u16,
    /// Raw HTML; empty unless `code` is 200
    pub content: String,
}

/// A page about to be inserted
#[derive(Debug, Clone)]
pub struct NewPage {
    pub site_id: i64,
    pub path: String,
    pub code: u16,
    pub content: String,
}

impl NewPage {
    /// Builds a page row, dropping the content for non-200 responses
    pub fn new(site_id: i64, path: impl Into<String>, code: u16, content: String) -> Self {
        Self {
            site_id,
            path: path.into(),
            code,
            content: if code == 200 { content } else { String::new() },
        }
    }

    /// Page row for a fetch that failed before any content arrived
    pub fn stub(site_id: i64, path: impl Into<String>, code: u16) -> Self {
        Self::new(site_id, path, code, String::new())
    }
}

/// Represents a site-scoped lemma
#[derive(Debug, Clone)]
pub struct LemmaRecord {
    pub id: i64,
    pub site_id: i64,
    pub lemma: String,
    /// Number of pages of the site containing the lemma
    pub frequency: u32,
}

/// A posting: the lemma occurs on the page with the given weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexRow {
    pub page_id: i64,
    pub lemma_id: i64,
    pub rank: f32,
}
