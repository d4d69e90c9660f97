//! Recursive crawl tasks
//!
//! One task explores one URL: it claims the URL, fetches and stores the
//! page, indexes it and then spawns one child task per new same-site link.
//! A task returns only after all of its children have returned, so the root
//! task of a site finishes when the whole reachable site has been crawled.
//!
//! Dropping a task aborts its children as well: they live in a `JoinSet`
//! owned by the parent, so aborting a root cancels the whole tree.

use crate::config::MessagesConfig;
use crate::crawler::fetcher::{FetchedPage, Fetcher};
use crate::crawler::parser::extract_links;
use crate::crawler::scheduler::FetchScheduler;
use crate::indexing::IndexingPipeline;
use crate::state::{StatusManager, VisitedUrls};
use crate::storage::{NewPage, SharedStorage};
use crate::url::{is_file_url, SiteUrl};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};
use url::Url;

/// Future of a crawl task
pub type CrawlFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Everything a crawl task needs, shared by all tasks of a run
pub struct CrawlContext {
    pub storage: SharedStorage,
    pub fetcher: Fetcher,
    pub scheduler: FetchScheduler,
    pub visited: Arc<VisitedUrls>,
    pub status: Arc<StatusManager>,
    pub pipeline: IndexingPipeline,
    pub messages: MessagesConfig,
    /// Store pages only; the site is indexed in batch after the crawl
    pub deferred_indexing: bool,
    pub stop: Arc<AtomicBool>,
}

impl CrawlContext {
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst) || self.scheduler.is_closed()
    }
}

/// A site being crawled
#[derive(Debug, Clone)]
pub struct SiteTarget {
    pub id: i64,
    pub name: String,
    pub home: SiteUrl,
}

impl SiteTarget {
    /// Key of a URL in the visited set
    ///
    /// Built from the site home page and the relative path, so every
    /// spelling of a page that maps to the same stored path is one key.
    pub fn visit_key(&self, url: &Url) -> String {
        format!("{}{}", self.home, self.home.path_of(url))
    }

    /// Returns true if the URL belongs to this site and may be an HTML page
    pub fn accepts(&self, url: &Url) -> bool {
        self.home.contains(url) && !is_file_url(url)
    }
}

/// Crawls `url` and everything reachable from it on the same site
pub fn crawl(ctx: Arc<CrawlContext>, site: Arc<SiteTarget>, url: Url) -> CrawlFuture {
    Box::pin(async move {
        if !site.accepts(&url) {
            return;
        }

        let key = site.visit_key(&url);
        if !ctx.visited.mark_if_new(&key) {
            return;
        }

        let links = visit(&ctx, &site, &url).await;

        let mut children = JoinSet::new();
        for link in links {
            children.spawn(crawl(Arc::clone(&ctx), Arc::clone(&site), link));
        }
        while let Some(result) = children.join_next().await {
            if let Err(e) = result {
                if e.is_panic() {
                    error!("Crawl task under {} panicked: {}", url, e);
                }
            }
        }

        ctx.visited.complete(&key);
    })
}

/// Crawls a whole site from its home page and finalizes it
///
/// The site's status is written as soon as its own traversal (and, in
/// deferred mode, its batch indexing) ends, independent of the other sites
/// of the run. A stopped site is left INDEXING for the run's stop sweep.
pub async fn crawl_site(ctx: Arc<CrawlContext>, site: Arc<SiteTarget>, root: Url) {
    crawl(Arc::clone(&ctx), Arc::clone(&site), root).await;
    if ctx.is_stopped() {
        return;
    }

    if ctx.deferred_indexing {
        index_backlog(&ctx, &site).await;
        if ctx.is_stopped() {
            return;
        }
    }

    let status = ctx.status.finalize(site.id);
    info!("Site {} finished as {}", site.home, status);

    ctx.visited.clear(site.home.as_str());
    ctx.status.forget(site.id);
}

/// Second phase of deferred indexing
async fn index_backlog(ctx: &CrawlContext, site: &SiteTarget) {
    let pipeline = ctx.pipeline.clone();
    let site_id = site.id;

    match tokio::task::spawn_blocking(move || pipeline.index_site(site_id)).await {
        Ok(Ok(pages)) => debug!("Indexed {} stored pages of {}", pages, site.home),
        Ok(Err(e)) => error!("Batch indexing of {} failed: {}", site.home, e),
        Err(e) => error!("Batch indexing task of {} failed: {}", site.home, e),
    }
}

/// Fetches, stores and indexes one page; returns the links to follow
async fn visit(ctx: &CrawlContext, site: &SiteTarget, url: &Url) -> Vec<Url> {
    if ctx.is_stopped() {
        return Vec::new();
    }

    let slot = match ctx.scheduler.acquire().await {
        Some(slot) => slot,
        None => return Vec::new(),
    };
    if ctx.is_stopped() {
        return Vec::new();
    }

    let path = site.home.path_of(url);
    debug!("Fetching {}", url);
    let fetched = ctx.fetcher.fetch(url).await;
    drop(slot);

    match fetched {
        Ok(page) => {
            if !page.is_html() {
                debug!(
                    "Skipping non-HTML page {} ({})",
                    url,
                    page.content_type.as_deref().unwrap_or("unknown")
                );
                return Vec::new();
            }
            store_page(ctx, site, path, page).await
        }
        Err(e) => {
            let code = ctx.fetcher.probe_status_code(url).await;
            ctx.status
                .record_page_failure(site.id, &path, code, &e.user_message(&ctx.messages));
            Vec::new()
        }
    }
}

async fn store_page(ctx: &CrawlContext, site: &SiteTarget, path: String, page: FetchedPage) -> Vec<Url> {
    let status = page.status;
    let new_page = NewPage::new(site.id, path, status, page.body);

    let saved = ctx.storage.lock().save_page(&new_page);
    let page_id = match saved {
        Ok(Some(id)) => id,
        Ok(None) => {
            debug!("Page {} is already stored", new_page.path);
            return Vec::new();
        }
        Err(e) => {
            error!("Failed to store page {}: {}", new_page.path, e);
            return Vec::new();
        }
    };

    if status != 200 {
        debug!("Stored {} with status {}", new_page.path, status);
        ctx.status.touch(site.id);
        return Vec::new();
    }
    ctx.status.record_success(site.id);

    let pipeline = ctx.pipeline.clone();
    let deferred = ctx.deferred_indexing;
    let site_id = site.id;
    let base_url = page.final_url;
    let html = new_page.content;

    let outcome = tokio::task::spawn_blocking(move || {
        let indexed = if deferred {
            Ok(0)
        } else {
            pipeline.index_page(site_id, page_id, &html)
        };
        (indexed, extract_links(&html, &base_url))
    })
    .await;

    let links = match outcome {
        Ok((Ok(_), links)) => links,
        Ok((Err(e), links)) => {
            error!("Failed to index page {}: {}", page_id, e);
            links
        }
        Err(e) => {
            error!("Indexing task for page {} failed: {}", page_id, e);
            return Vec::new();
        }
    };

    links
        .into_iter()
        .filter(|link| site.accepts(link) && !ctx.visited.contains(&site.visit_key(link)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> SiteTarget {
        SiteTarget {
            id: 1,
            name: "Example".to_string(),
            home: SiteUrl::parse("https://example.com").unwrap(),
        }
    }

    #[test]
    fn test_visit_key_ignores_www_and_scheme() {
        let site = target();
        let a = Url::parse("https://www.example.com/news?id=1").unwrap();
        let b = Url::parse("http://example.com/news?id=1").unwrap();

        assert_eq!(site.visit_key(&a), "https://example.com/news?id=1");
        assert_eq!(site.visit_key(&a), site.visit_key(&b));
    }

    #[test]
    fn test_accepts() {
        let site = target();
        assert!(site.accepts(&Url::parse("https://example.com/page").unwrap()));
        assert!(!site.accepts(&Url::parse("https://example.com/file.pdf").unwrap()));
        assert!(!site.accepts(&Url::parse("https://other.com/page").unwrap()));
    }
}
