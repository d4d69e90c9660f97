//! Indexing pipeline
//!
//! Turns page HTML into site-scoped lemmas and postings:
//! - `extract`: visible title/body text and per-page lemma ranks
//! - `pipeline`: single-page indexing, site batch indexing, page removal
//! - `batch`: parallel extraction and bulk merge for stored pages

mod batch;
mod extract;
mod pipeline;

pub use batch::{extract_batch, merge_batch, ExtractedPage};
pub use extract::{extract_text, page_lemmas, PageText};
pub use pipeline::IndexingPipeline;
