//! Output module for reporting runs, statistics and search results
//!
//! This module handles:
//! - Aggregating index statistics from storage
//! - Printing run summaries, statistics and ranked results to stdout

pub mod stats;

pub use stats::{load_statistics, print_statistics, IndexStatistics, SiteStatistics, TotalStatistics};

use crate::crawler::{IndexPageOutcome, RunSummary};
use crate::search::SearchResponse;

/// Prints the summary of a full indexing run
pub fn print_run_summary(summary: &RunSummary) {
    println!("=== Indexing Summary ===\n");

    if summary.stopped {
        println!("Run was stopped before completion");
    }
    println!("  Duration: {:.1}s", summary.elapsed.as_secs_f64());
    println!("  Pages stored: {}", summary.pages);
    println!("  Lemmas: {}", summary.lemmas);
    println!();

    println!("Sites:");
    for site in &summary.sites {
        println!("  {} ({}): {}", site.name, site.url, site.status);
        if let Some(error) = &site.last_error {
            println!("    Last error: {}", error);
        }
    }
    println!();
}

/// Prints the outcome of a single-page reindex
pub fn print_page_outcome(url: &str, outcome: &IndexPageOutcome) {
    match outcome {
        IndexPageOutcome::Indexed {
            path, code, lemmas, ..
        } => {
            println!("Reindexed {} as {} (HTTP {}, {} lemmas)", url, path, code, lemmas);
        }
        IndexPageOutcome::Skipped { content_type } => {
            println!(
                "Skipped {}: not an HTML page ({})",
                url,
                content_type.as_deref().unwrap_or("no content type")
            );
        }
    }
}

/// Prints one page of search results
pub fn print_search_results(query: &str, offset: usize, response: &SearchResponse) {
    if response.is_empty() {
        println!("No results for \"{}\"", query);
        return;
    }

    println!(
        "Results {}-{} of {} for \"{}\"\n",
        offset + 1,
        offset + response.results.len(),
        response.total,
        query
    );

    for (i, hit) in response.results.iter().enumerate() {
        let title = if hit.title.is_empty() { hit.path.as_str() } else { hit.title.as_str() };
        println!("{}. {} [{:.3}]", offset + i + 1, title, hit.relative_relevance);
        println!("   {}", hit.url());
        println!("   {} | relevance {:.1}", hit.site_name, hit.absolute_relevance);
        if !hit.snippet.is_empty() {
            println!("   {}", hit.snippet);
        }
        println!();
    }
}
