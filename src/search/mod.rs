//! Ranked full-text search
//!
//! Queries are reduced to lemmas with the same analyzer used for indexing.
//! Posting lists are intersected rarest lemma first, matching pages are
//! scored by their summed posting ranks and the requested page of results
//! is decorated with titles and snippets.
//!
//! ## Submodules
//! - **`engine`**: lemma selection, intersection, scoring and pagination
//! - **`snippet`**: match-centered body excerpts with highlighting
//! - **`types`**: queries and results

mod engine;
mod snippet;
mod types;

pub use engine::SearchEngine;
pub use snippet::build_snippet;
pub use types::{SearchHit, SearchQuery, SearchResponse};
