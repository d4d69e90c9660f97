//! Indexing orchestration
//!
//! The [`Indexer`] owns everything a run needs and exposes the entry points:
//! - full runs over every configured site
//! - graceful and forceful stops of a running crawl
//! - single-page reindexing
//! - rebuilding a site's index from its stored pages
//!
//! A global flag admits one of these operations at a time.

use crate::config::{Config, SiteEntry};
use crate::crawler::fetcher::{FetchedPage, Fetcher};
use crate::crawler::scheduler::FetchScheduler;
use crate::crawler::task::{crawl_site, CrawlContext, SiteTarget};
use crate::indexing::IndexingPipeline;
use crate::state::{SiteStatus, StatusManager, VisitedUrls};
use crate::storage::{NewPage, SharedStorage};
use crate::url::{normalize_url, SiteUrl};
use crate::IndexingError;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, error, info, warn};
use url::Url;

/// Final state of one site after a run
#[derive(Debug, Clone)]
pub struct SiteOutcome {
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub last_error: Option<String>,
}

/// Summary of a full indexing run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub sites: Vec<SiteOutcome>,
    pub pages: u64,
    pub lemmas: u64,
    pub stopped: bool,
    pub elapsed: Duration,
}

/// Result of a single-page reindex
#[derive(Debug, Clone, PartialEq)]
pub enum IndexPageOutcome {
    /// The page was stored (and indexed when it answered 200)
    Indexed {
        site_id: i64,
        page_id: i64,
        path: String,
        code: u16,
        lemmas: usize,
    },
    /// The URL does not serve HTML; nothing was written
    Skipped { content_type: Option<String> },
}

/// Handles of the crawl in progress
struct ActiveRun {
    scheduler: FetchScheduler,
    roots: Vec<AbortHandle>,
}

/// Coordinates crawling, indexing and status bookkeeping
pub struct Indexer {
    config: Arc<Config>,
    storage: SharedStorage,
    fetcher: Fetcher,
    pipeline: IndexingPipeline,
    visited: Arc<VisitedUrls>,
    status: Arc<StatusManager>,
    indexing: AtomicBool,
    stop: Arc<AtomicBool>,
    active: Mutex<Option<ActiveRun>>,
}

impl Indexer {
    /// Creates an indexer over a storage backend
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn new(config: Config, storage: SharedStorage) -> crate::Result<Self> {
        let fetcher = Fetcher::new(&config.crawler, &config.connection)?;
        let pipeline = IndexingPipeline::new(storage.clone(), config.indexing.clone());
        let status = StatusManager::new(storage.clone(), config.crawler.self_heal);

        Ok(Self {
            config: Arc::new(config),
            storage,
            fetcher,
            pipeline,
            visited: Arc::new(VisitedUrls::new()),
            status: Arc::new(status),
            indexing: AtomicBool::new(false),
            stop: Arc::new(AtomicBool::new(false)),
            active: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Returns true while any indexing operation is running
    pub fn is_indexing(&self) -> bool {
        self.indexing.load(Ordering::SeqCst)
    }

    /// Crawls and indexes every configured site from scratch
    ///
    /// All stored data is dropped first. Root tasks for all sites start
    /// together and the call returns once every site's crawl has finished
    /// or the run was stopped.
    ///
    /// # Errors
    ///
    /// Returns [`IndexingError::AlreadyRunning`] if another operation holds
    /// the indexing flag. Page-level failures never fail the run; they are
    /// reflected in the site statuses.
    pub async fn run_full_indexing(&self) -> Result<RunSummary, IndexingError> {
        self.begin()?;
        self.stop.store(false, Ordering::SeqCst);

        let result = self.run_sites().await;

        self.active.lock().take();
        self.indexing.store(false, Ordering::SeqCst);
        result
    }

    async fn run_sites(&self) -> Result<RunSummary, IndexingError> {
        let start = Instant::now();

        let mut homes = Vec::with_capacity(self.config.sites.len());
        for entry in &self.config.sites {
            let home = SiteUrl::parse(&entry.url)?;
            let root = home.root()?;
            homes.push((entry.name.clone(), home, root));
        }

        self.storage.lock().truncate_all()?;
        info!("Starting full indexing of {} sites", homes.len());

        let mut targets = Vec::with_capacity(homes.len());
        let mut roots = Vec::with_capacity(homes.len());
        for (name, home, root) in homes {
            let id = self
                .storage
                .lock()
                .save_site(home.as_str(), &name, SiteStatus::Indexing)?;
            self.status.initialize(id);
            targets.push(Arc::new(SiteTarget { id, name, home }));
            roots.push(root);
        }

        let scheduler = FetchScheduler::new(&self.config.crawler);
        let ctx = Arc::new(CrawlContext {
            storage: self.storage.clone(),
            fetcher: self.fetcher.clone(),
            scheduler: scheduler.clone(),
            visited: Arc::clone(&self.visited),
            status: Arc::clone(&self.status),
            pipeline: self.pipeline.clone(),
            messages: self.config.messages.clone(),
            deferred_indexing: self.config.crawler.deferred_indexing,
            stop: Arc::clone(&self.stop),
        });

        let mut tasks = JoinSet::new();
        let handles = targets
            .iter()
            .zip(roots)
            .map(|(target, root)| {
                debug!("Spawning root task for {}", target.home);
                tasks.spawn(crawl_site(Arc::clone(&ctx), Arc::clone(target), root))
            })
            .collect();

        *self.active.lock() = Some(ActiveRun { scheduler, roots: handles });

        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => debug!("Root task cancelled"),
                Err(e) => error!("Root task panicked: {}", e),
            }
        }

        let stopped = self.is_stop_requested();
        self.finish(&targets, stopped);

        let summary = self.summarize(&targets, stopped, start.elapsed())?;
        info!(
            "Indexing finished in {:?}: {} pages, {} lemmas{}",
            summary.elapsed,
            summary.pages,
            summary.lemmas,
            if stopped { " (stopped)" } else { "" }
        );
        Ok(summary)
    }

    /// Fails every site still INDEXING and drops per-run state
    ///
    /// Sites that completed their traversal were finalized by their own root
    /// task; what remains was stopped, or its root task died.
    fn finish(&self, targets: &[Arc<SiteTarget>], stopped: bool) {
        let message = if stopped {
            &self.config.messages.stopped_by_user
        } else {
            &self.config.messages.unknown_error
        };

        let result = self.storage.lock().fail_indexing_sites(message, Utc::now());
        match result {
            Ok(0) => {}
            Ok(count) if stopped => info!("Indexing stopped by user, {} sites marked failed", count),
            Ok(count) => warn!("{} sites did not finish and were marked failed", count),
            Err(e) => error!("Failed to mark unfinished sites: {}", e),
        }

        for target in targets {
            let prefix = target.home.as_str();
            if !self.visited.is_drained(prefix) {
                debug!("Dropping unfinished URLs of {}", prefix);
            }
            self.visited.clear(prefix);
            self.status.forget(target.id);
        }
    }

    fn summarize(
        &self,
        targets: &[Arc<SiteTarget>],
        stopped: bool,
        elapsed: Duration,
    ) -> Result<RunSummary, IndexingError> {
        let storage = self.storage.lock();

        let mut sites = Vec::with_capacity(targets.len());
        for target in targets {
            let site = storage.get_site(target.id)?;
            sites.push(SiteOutcome {
                url: site.url,
                name: site.name,
                status: site.status,
                last_error: site.last_error,
            });
        }

        Ok(RunSummary {
            sites,
            pages: storage.count_pages(None)?,
            lemmas: storage.count_lemmas(None)?,
            stopped,
            elapsed,
        })
    }

    /// Stops the run gracefully
    ///
    /// No new fetch starts; fetches already in flight complete and their
    /// pages are stored before the run finishes.
    pub fn request_stop(&self) -> Result<(), IndexingError> {
        if !self.is_indexing() {
            return Err(IndexingError::NotRunning);
        }

        info!("Stop requested");
        self.stop.store(true, Ordering::SeqCst);
        if let Some(run) = self.active.lock().as_ref() {
            run.scheduler.close();
        }
        Ok(())
    }

    /// Stops the run immediately, aborting every crawl task in flight
    pub fn force_stop(&self) -> Result<(), IndexingError> {
        if !self.is_indexing() {
            return Err(IndexingError::NotRunning);
        }

        warn!("Forced stop requested");
        self.stop.store(true, Ordering::SeqCst);
        if let Some(run) = self.active.lock().as_ref() {
            run.scheduler.close();
            for root in &run.roots {
                root.abort();
            }
        }
        Ok(())
    }

    fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<(), IndexingError> {
        self.indexing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| IndexingError::AlreadyRunning)
    }

    /// Fetches one page again and replaces it in the index
    ///
    /// # Errors
    ///
    /// - [`IndexingError::OutsideConfiguredSites`] when the URL belongs to no
    ///   configured site; nothing is written
    /// - [`IndexingError::AlreadyRunning`] while another operation runs
    /// - [`IndexingError::Fetch`] when the page cannot be fetched
    pub async fn index_page_url(&self, url: &str) -> Result<IndexPageOutcome, IndexingError> {
        let url = normalize_url(url)?;
        let (entry, home) = self
            .configured_site_for(&url)
            .ok_or_else(|| IndexingError::OutsideConfiguredSites(url.to_string()))?;

        self.begin()?;
        let result = self.reindex_page(entry, &home, &url).await;
        self.indexing.store(false, Ordering::SeqCst);
        result
    }

    fn configured_site_for(&self, url: &Url) -> Option<(&SiteEntry, SiteUrl)> {
        self.config.sites.iter().find_map(|entry| {
            let home = SiteUrl::parse(&entry.url).ok()?;
            home.contains(url).then_some((entry, home))
        })
    }

    async fn reindex_page(
        &self,
        entry: &SiteEntry,
        home: &SiteUrl,
        url: &Url,
    ) -> Result<IndexPageOutcome, IndexingError> {
        let page = self.fetcher.fetch(url).await?;
        if !page.is_html() {
            debug!("Not reindexing non-HTML page {}", url);
            return Ok(IndexPageOutcome::Skipped {
                content_type: page.content_type,
            });
        }

        let existing = self.storage.lock().find_site_by_url(home.as_str())?;
        let site_id = match existing {
            Some(site) => site.id,
            None => self
                .storage
                .lock()
                .save_site(home.as_str(), &entry.name, SiteStatus::Indexing)?,
        };
        self.status.initialize(site_id);

        let path = home.path_of(url);
        let code = page.status;
        let outcome = self.settle(site_id, self.replace_page(site_id, path, page))?;

        let status = self.status.finalize(site_id);
        self.status.forget(site_id);
        info!("Reindexed {} ({}), site is {}", url, code, status);
        Ok(outcome)
    }

    /// Deletes the stored copy of a page and stores and indexes the new one
    fn replace_page(
        &self,
        site_id: i64,
        path: String,
        page: FetchedPage,
    ) -> Result<IndexPageOutcome, IndexingError> {
        let old = self.storage.lock().find_page(site_id, &path)?;
        if let Some(old) = old {
            debug!("Removing stored copy of {}", path);
            self.pipeline.remove_page(old.id)?;
        }

        let code = page.status;
        let new_page = NewPage::new(site_id, path.as_str(), code, page.body);
        let saved = self.storage.lock().save_page(&new_page)?;

        let (page_id, lemmas) = match saved {
            Some(page_id) if code == 200 => {
                let lemmas = self.pipeline.index_page(site_id, page_id, &new_page.content)?;
                (page_id, lemmas)
            }
            Some(page_id) => (page_id, 0),
            None => {
                warn!("Page {} was stored concurrently", path);
                let page_id = self
                    .storage
                    .lock()
                    .find_page(site_id, &path)?
                    .map(|p| p.id)
                    .unwrap_or_default();
                (page_id, 0)
            }
        };

        Ok(IndexPageOutcome::Indexed {
            site_id,
            page_id,
            path,
            code,
            lemmas,
        })
    }

    /// Marks the site FAILED when work on an initialized site went wrong
    ///
    /// The site must not stay INDEXING once the operation has returned.
    fn settle<T>(&self, site_id: i64, result: Result<T, IndexingError>) -> Result<T, IndexingError> {
        if let Err(e) = &result {
            error!("Indexing site {} failed: {}", site_id, e);
            self.status.fail(site_id, &e.to_string());
            self.status.forget(site_id);
        }
        result
    }

    /// Clears a site's lemmas and postings and indexes its stored pages again
    ///
    /// Returns the number of pages that produced postings.
    pub fn rebuild_site_index(&self, site_url: &str) -> Result<usize, IndexingError> {
        let home = SiteUrl::parse(site_url)?;
        self.begin()?;
        let result = self.rebuild(&home);
        self.indexing.store(false, Ordering::SeqCst);
        result
    }

    fn rebuild(&self, home: &SiteUrl) -> Result<usize, IndexingError> {
        let site = self
            .storage
            .lock()
            .find_site_by_url(home.as_str())?
            .ok_or_else(|| IndexingError::UnknownSite(home.to_string()))?;

        info!("Rebuilding index of {}", home);
        self.status.initialize(site.id);
        let indexed = self.settle(site.id, self.reindex_stored_pages(site.id))?;

        self.status.finalize(site.id);
        self.status.forget(site.id);
        Ok(indexed)
    }

    fn reindex_stored_pages(&self, site_id: i64) -> Result<usize, IndexingError> {
        self.storage.lock().clear_site_index(site_id)?;
        Ok(self.pipeline.index_site(site_id)?)
    }
}
