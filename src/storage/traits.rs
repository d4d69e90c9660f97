//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::SiteStatus;
use crate::storage::{IndexRow, LemmaRecord, NewPage, PageRecord, SiteRecord};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Site not found: {0}")]
    SiteNotFound(i64),

    #[error("Page not found: {0}")]
    PageNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every write is scoped by primary key or by a unique key so that callers
/// never need a freshly loaded record to update a row. Deleting a page or a
/// site index removes the postings first; lemma frequencies are maintained
/// by the caller through the lemma operations.
pub trait Storage {
    // ===== Sites =====

    /// Inserts a site and returns its ID
    fn save_site(&mut self, url: &str, name: &str, status: SiteStatus) -> StorageResult<i64>;

    /// Writes the status, status time and last error of a site
    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        time: DateTime<Utc>,
        error: Option<&str>,
    ) -> StorageResult<()>;

    /// Refreshes the status time only
    fn touch_site(&mut self, site_id: i64, time: DateTime<Utc>) -> StorageResult<()>;

    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>>;

    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord>;

    /// All sites ordered by ID
    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>>;

    /// Deletes every site, page, lemma and posting
    fn truncate_all(&mut self) -> StorageResult<()>;

    /// Marks every site still in INDEXING as FAILED with the given message
    ///
    /// Returns the number of sites updated.
    fn fail_indexing_sites(&mut self, message: &str, time: DateTime<Utc>) -> StorageResult<usize>;

    // ===== Pages =====

    /// Inserts a page
    ///
    /// Returns `None` when a page with the same site and path already exists.
    fn save_page(&mut self, page: &NewPage) -> StorageResult<Option<i64>>;

    fn find_page(&self, site_id: i64, path: &str) -> StorageResult<Option<PageRecord>>;

    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord>;

    /// Deletes a page together with its postings
    fn delete_page(&mut self, page_id: i64) -> StorageResult<()>;

    /// Counts pages of one site, or of all sites
    fn count_pages(&self, site_id: Option<i64>) -> StorageResult<u64>;

    /// One batch of a site's pages ordered by ID
    fn pages_page(&self, site_id: i64, batch_size: usize, offset: usize)
        -> StorageResult<Vec<PageRecord>>;

    // ===== Lemmas =====

    /// Inserts the lemma with frequency 1, or increments an existing one
    ///
    /// Returns the lemma ID.
    fn upsert_lemma(&mut self, site_id: i64, lemma: &str) -> StorageResult<i64>;

    /// Adds `count` to each lemma's frequency, inserting missing lemmas
    ///
    /// Runs in one transaction. Returns the lemma IDs in input order.
    fn upsert_lemmas(&mut self, site_id: i64, lemmas: &[(String, u32)]) -> StorageResult<Vec<i64>>;

    /// Increments an existing lemma; returns false if the lemma is unknown
    fn increment_lemma_frequency(&mut self, site_id: i64, lemma: &str) -> StorageResult<bool>;

    fn find_lemmas(&self, site_id: i64, lemmas: &[String]) -> StorageResult<Vec<LemmaRecord>>;

    /// Decrements the frequency of each lemma by one, never below zero
    fn decrement_lemma_frequencies(&mut self, lemma_ids: &[i64]) -> StorageResult<()>;

    /// Deletes the site's lemmas whose frequency dropped to zero
    fn delete_unused_lemmas(&mut self, site_id: i64) -> StorageResult<usize>;

    /// Deletes every lemma and posting of a site, keeping its pages
    fn clear_site_index(&mut self, site_id: i64) -> StorageResult<()>;

    fn count_lemmas(&self, site_id: Option<i64>) -> StorageResult<u64>;

    /// Number of pages containing the lemma, in one site or across all sites
    fn lemma_document_frequency(&self, lemma: &str, site_id: Option<i64>) -> StorageResult<u64>;

    /// IDs of the pages holding a posting for the lemma, ascending
    fn find_pages_matching_lemma(&self, lemma: &str, site_id: Option<i64>)
        -> StorageResult<Vec<i64>>;

    // ===== Postings =====

    /// IDs of the lemmas a page has postings for
    fn lemmas_for_page(&self, page_id: i64) -> StorageResult<Vec<i64>>;

    /// Indexes one page atomically: each lemma's frequency grows by one and
    /// one posting with the given rank is written
    ///
    /// Returns false and changes nothing if the page already has postings.
    fn index_page_lemmas(
        &mut self,
        site_id: i64,
        page_id: i64,
        lemmas: &[(String, f32)],
    ) -> StorageResult<bool>;

    /// Inserts postings in one transaction, skipping duplicates
    fn save_index_rows(&mut self, rows: &[IndexRow]) -> StorageResult<usize>;

    fn delete_index_rows_for_page(&mut self, page_id: i64) -> StorageResult<usize>;

    /// Sum of the page's posting ranks over the given lemma texts
    fn sum_rank_for_page_and_lemmas(&self, page_id: i64, lemmas: &[String]) -> StorageResult<f64>;
}
