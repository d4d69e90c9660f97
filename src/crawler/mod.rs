//! Crawler module for site traversal and indexing runs
//!
//! This module contains the crawling logic, including:
//! - HTTP fetching with error classification
//! - Link extraction from fetched HTML
//! - Fetch slots and the politeness delay
//! - Recursive crawl tasks, one per URL
//! - The indexer that runs, stops and finalizes crawls

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;
mod task;

pub use coordinator::{IndexPageOutcome, Indexer, RunSummary, SiteOutcome};
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher};
pub use parser::extract_links;
pub use scheduler::{FetchScheduler, FetchSlot};
pub use task::{crawl, crawl_site, CrawlContext, CrawlFuture, SiteTarget};
