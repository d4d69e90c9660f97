//! Statistics over the stored index
//!
//! This module aggregates per-site page and lemma counts from the storage
//! layer and prints them.

use crate::state::SiteStatus;
use crate::storage::{Storage, StorageResult};
use serde::Serialize;

/// Totals over every stored site
#[derive(Debug, Clone, Default, Serialize)]
pub struct TotalStatistics {
    pub sites: u64,
    pub pages: u64,
    pub lemmas: u64,
    /// True while an indexing operation is running
    pub indexing: bool,
}

/// Statistics of one site
#[derive(Debug, Clone, Serialize)]
pub struct SiteStatistics {
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    /// Time of the last status write, RFC 3339
    pub status_time: String,
    pub error: Option<String>,
    pub pages: u64,
    pub lemmas: u64,
}

/// Index statistics summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStatistics {
    pub total: TotalStatistics,
    pub sites: Vec<SiteStatistics>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `indexing` - Whether an indexing operation is currently running
pub fn load_statistics(storage: &dyn Storage, indexing: bool) -> StorageResult<IndexStatistics> {
    let mut sites = Vec::new();
    for site in storage.list_sites()? {
        sites.push(SiteStatistics {
            pages: storage.count_pages(Some(site.id))?,
            lemmas: storage.count_lemmas(Some(site.id))?,
            url: site.url,
            name: site.name,
            status: site.status,
            status_time: site.status_time,
            error: site.last_error,
        });
    }

    let total = TotalStatistics {
        sites: sites.len() as u64,
        pages: storage.count_pages(None)?,
        lemmas: storage.count_lemmas(None)?,
        indexing,
    };

    Ok(IndexStatistics { total, sites })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &IndexStatistics) {
    println!("=== Index Statistics ===\n");

    println!("Overview:");
    println!("  Sites: {}", stats.total.sites);
    println!("  Pages: {}", stats.total.pages);
    println!("  Lemmas: {}", stats.total.lemmas);
    println!(
        "  Indexing: {}",
        if stats.total.indexing { "running" } else { "idle" }
    );
    println!();

    if stats.sites.is_empty() {
        println!("No sites indexed yet");
        return;
    }

    println!("Sites:");
    for site in &stats.sites {
        println!("  {} ({})", site.name, site.url);
        println!("    Status: {} since {}", site.status, site.status_time);
        println!("    Pages: {}, lemmas: {}", site.pages, site.lemmas);
        if let Some(error) = &site.error {
            println!("    Last error: {}", error);
        }
    }
    println!();
}
