use crate::config::IndexingConfig;
use crate::indexing::batch::{extract_batch, merge_batch};
use crate::indexing::extract::{extract_text, page_lemmas};
use crate::storage::{PageRecord, SharedStorage, StorageResult};
use tracing::{debug, info};

/// Turns stored or freshly fetched pages into lemmas and postings
#[derive(Clone)]
pub struct IndexingPipeline {
    storage: SharedStorage,
    config: IndexingConfig,
}

impl IndexingPipeline {
    pub fn new(storage: SharedStorage, config: IndexingConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &IndexingConfig {
        &self.config
    }

    /// Indexes one page
    ///
    /// Text extraction and lemmatization run without the storage lock. The
    /// lemma upserts and postings of the page are then written under a
    /// single lock acquisition in one transaction, so concurrent pages of
    /// the same site never lose a frequency increment. Returns the number of
    /// distinct lemmas written; a page that already has postings is left
    /// untouched and reports zero.
    pub fn index_page(&self, site_id: i64, page_id: i64, html: &str) -> StorageResult<usize> {
        let text = extract_text(html);
        let lemmas = page_lemmas(&text, self.config.title_weight);
        if lemmas.is_empty() {
            debug!("Page {} has no lemmas", page_id);
            return Ok(0);
        }

        let written = self
            .storage
            .lock()
            .index_page_lemmas(site_id, page_id, &lemmas)?;

        if written {
            debug!("Indexed page {} with {} lemmas", page_id, lemmas.len());
            Ok(lemmas.len())
        } else {
            debug!("Page {} is already indexed", page_id);
            Ok(0)
        }
    }

    /// Removes a page and its contribution to the site index
    ///
    /// Postings go first, then every lemma the page referenced loses one
    /// from its frequency, lemmas left at zero are deleted and finally the
    /// page row itself.
    pub fn remove_page(&self, page_id: i64) -> StorageResult<()> {
        let mut storage = self.storage.lock();

        let page = storage.get_page(page_id)?;
        let lemma_ids = storage.lemmas_for_page(page_id)?;

        storage.delete_index_rows_for_page(page_id)?;
        storage.decrement_lemma_frequencies(&lemma_ids)?;
        let removed = storage.delete_unused_lemmas(page.site_id)?;
        storage.delete_page(page_id)?;

        debug!(
            "Removed page {} ({} lemmas released, {} deleted)",
            page.path,
            lemma_ids.len(),
            removed
        );
        Ok(())
    }

    /// Indexes every stored page of a site in batch mode
    ///
    /// Pages are loaded `batch-size` at a time. Returns the number of pages
    /// that produced postings.
    pub fn index_site(&self, site_id: i64) -> StorageResult<usize> {
        let batch_size = self.config.batch_size.max(1);
        let mut offset = 0;
        let mut indexed = 0;

        loop {
            let pages = self.storage.lock().pages_page(site_id, batch_size, offset)?;
            if pages.is_empty() {
                break;
            }
            offset += pages.len();
            indexed += self.index_pages(site_id, &pages)?;
        }

        info!("Batch indexed {} pages of site {}", indexed, site_id);
        Ok(indexed)
    }

    /// Indexes a batch of stored pages
    ///
    /// Extraction fans out over the rayon pool; the merge and the writes run
    /// on the calling thread under one lock acquisition.
    pub fn index_pages(&self, site_id: i64, pages: &[PageRecord]) -> StorageResult<usize> {
        let extracted = extract_batch(pages, self.config.title_weight, self.config.split_threshold);
        let indexed = extracted.iter().filter(|(_, lemmas)| !lemmas.is_empty()).count();

        let mut storage = self.storage.lock();
        merge_batch(&mut *storage, site_id, &extracted, self.config.batch_size)?;

        Ok(indexed)
    }
}
