//! Batch indexing of stored pages
//!
//! Extraction is pure and runs in parallel: the page list is split in halves
//! until a chunk is at most `split_threshold` pages long, and the halves are
//! processed with `rayon::join`. The merge is sequential and writes lemma
//! increments and postings in bulk.

use crate::indexing::extract::{extract_text, page_lemmas};
use crate::storage::{IndexRow, PageRecord, Storage, StorageResult};
use std::collections::{BTreeMap, HashMap};

/// Lemmas of one page: (page ID, [(lemma, rank)])
pub type ExtractedPage = (i64, Vec<(String, f32)>);

/// Extracts the lemmas of every indexable page
///
/// Only pages stored with status 200 and non-empty content are indexable.
pub fn extract_batch(pages: &[PageRecord], title_weight: f32, split_threshold: usize) -> Vec<ExtractedPage> {
    if pages.len() <= split_threshold.max(1) {
        return pages
            .iter()
            .filter(|page| page.code == 200 && !page.content.is_empty())
            .map(|page| (page.id, page_lemmas(&extract_text(&page.content), title_weight)))
            .collect();
    }

    let (left, right) = pages.split_at(pages.len() / 2);
    let (mut left, right) = rayon::join(
        || extract_batch(left, title_weight, split_threshold),
        || extract_batch(right, title_weight, split_threshold),
    );
    left.extend(right);
    left
}

/// Persists extracted pages
///
/// Each lemma's frequency grows by the number of pages in the batch that
/// contain it; postings are written `chunk_size` rows per transaction.
pub fn merge_batch(
    storage: &mut dyn Storage,
    site_id: i64,
    pages: &[ExtractedPage],
    chunk_size: usize,
) -> StorageResult<usize> {
    let mut page_counts: BTreeMap<&str, u32> = BTreeMap::new();
    for (_, lemmas) in pages {
        for (lemma, _) in lemmas {
            *page_counts.entry(lemma.as_str()).or_insert(0) += 1;
        }
    }
    if page_counts.is_empty() {
        return Ok(0);
    }

    let increments: Vec<(String, u32)> = page_counts
        .iter()
        .map(|(lemma, count)| (lemma.to_string(), *count))
        .collect();
    let ids = storage.upsert_lemmas(site_id, &increments)?;
    let lemma_ids: HashMap<&str, i64> = increments
        .iter()
        .map(|(lemma, _)| lemma.as_str())
        .zip(ids)
        .collect();

    let rows: Vec<IndexRow> = pages
        .iter()
        .flat_map(|(page_id, lemmas)| {
            let lemma_ids = &lemma_ids;
            lemmas.iter().filter_map(move |(lemma, rank)| {
                lemma_ids.get(lemma.as_str()).map(|lemma_id| IndexRow {
                    page_id: *page_id,
                    lemma_id: *lemma_id,
                    rank: *rank,
                })
            })
        })
        .collect();

    let mut written = 0;
    for chunk in rows.chunks(chunk_size.max(1)) {
        written += storage.save_index_rows(chunk)?;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: i64, code: u16, body: &str) -> PageRecord {
        PageRecord {
            id,
            site_id: 1,
            path: format!("/{}", id),
            code,
            content: format!("<html><body>{}</body></html>", body),
        }
    }

    #[test]
    fn test_extract_batch_splits_and_keeps_all_pages() {
        let pages: Vec<PageRecord> = (0..9).map(|i| page(i, 200, "кот")).collect();

        let extracted = extract_batch(&pages, 1.0, 2);
        let mut ids: Vec<i64> = extracted.iter().map(|(id, _)| *id).collect();
        ids.sort();
        assert_eq!(ids, (0..9).collect::<Vec<_>>());
        assert!(extracted.iter().all(|(_, lemmas)| lemmas.len() == 1));
    }

    #[test]
    fn test_extract_batch_skips_error_pages() {
        let mut missing = page(2, 404, "");
        missing.content.clear();
        let pages = vec![page(1, 200, "кот"), missing];

        let extracted = extract_batch(&pages, 1.0, 20);
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0].0, 1);
    }
}
