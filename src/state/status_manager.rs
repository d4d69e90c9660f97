use crate::state::SiteStatus;
use crate::storage::{NewPage, SharedStorage};
use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, error, warn};

/// Per-site indexing state machine
///
/// Keeps an in-memory error flag per site next to the persisted status.
/// Every write goes through a primary-key scoped update, so concurrent crawl
/// tasks never overwrite each other with stale site records. Persistence
/// failures are logged and swallowed: status bookkeeping must never abort a
/// crawl.
pub struct StatusManager {
    storage: SharedStorage,
    error_flags: DashMap<i64, bool>,
    self_heal: bool,
}

impl StatusManager {
    /// Creates a manager; `self_heal` enables the FAILED to INDEXING recovery
    pub fn new(storage: SharedStorage, self_heal: bool) -> Self {
        Self {
            storage,
            error_flags: DashMap::new(),
            self_heal,
        }
    }

    /// Puts the site into INDEXING and clears its error flag
    pub fn initialize(&self, site_id: i64) {
        self.error_flags.insert(site_id, false);
        self.write_status(site_id, SiteStatus::Indexing, None);
    }

    /// Stores a page stub for a failed fetch and marks the site FAILED
    pub fn record_page_failure(&self, site_id: i64, path: &str, code: u16, message: &str) {
        warn!("Page {} of site {} failed with {}: {}", path, site_id, code, message);

        {
            let mut storage = self.storage.lock();
            if let Err(e) = storage.save_page(&NewPage::stub(site_id, path, code)) {
                error!("Failed to store failed page {}: {}", path, e);
            }
        }

        self.fail(site_id, message);
    }

    /// Marks the site FAILED with the given error
    pub fn fail(&self, site_id: i64, message: &str) {
        self.error_flags.insert(site_id, true);
        self.write_status(site_id, SiteStatus::Failed, Some(message));
    }

    /// Called after a page of the site was fetched and stored successfully
    ///
    /// With self-healing enabled a pending error is cleared and the site goes
    /// back to INDEXING; otherwise only the status time is refreshed.
    pub fn record_success(&self, site_id: i64) {
        if self.self_heal && self.has_error(site_id) {
            self.record_recovery(site_id);
            return;
        }

        self.touch(site_id);
    }

    /// Refreshes the status time of the site
    pub fn touch(&self, site_id: i64) {
        if let Err(e) = self.storage.lock().touch_site(site_id, Utc::now()) {
            error!("Failed to refresh status time of site {}: {}", site_id, e);
        }
    }

    /// Clears the error flag and writes INDEXING again
    pub fn record_recovery(&self, site_id: i64) {
        debug!("Site {} recovered from a page failure", site_id);
        self.error_flags.insert(site_id, false);
        self.write_status(site_id, SiteStatus::Indexing, None);
    }

    /// Writes INDEXED unless a failure is pending; returns the final status
    pub fn finalize(&self, site_id: i64) -> SiteStatus {
        if self.has_error(site_id) {
            return SiteStatus::Failed;
        }

        self.write_status(site_id, SiteStatus::Indexed, None);
        SiteStatus::Indexed
    }

    /// Returns true if a page failure is pending for the site
    pub fn has_error(&self, site_id: i64) -> bool {
        self.error_flags
            .get(&site_id)
            .map(|flag| *flag)
            .unwrap_or(false)
    }

    /// Drops the in-memory flag of a site
    pub fn forget(&self, site_id: i64) {
        self.error_flags.remove(&site_id);
    }

    fn write_status(&self, site_id: i64, status: SiteStatus, message: Option<&str>) {
        let result = self
            .storage
            .lock()
            .update_site_status(site_id, status, Utc::now(), message);

        if let Err(e) = result {
            error!("Failed to write status {} for site {}: {}", status, site_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{into_shared, SqliteStorage};

    fn setup(self_heal: bool) -> (SharedStorage, StatusManager, i64) {
        let storage = into_shared(SqliteStorage::new_in_memory().unwrap());
        let site_id = storage
            .lock()
            .save_site("https://a.ru", "A", SiteStatus::Indexing)
            .unwrap();
        let manager = StatusManager::new(storage.clone(), self_heal);
        manager.initialize(site_id);
        (storage, manager, site_id)
    }

    fn status(storage: &SharedStorage, site_id: i64) -> SiteStatus {
        storage.lock().get_site(site_id).unwrap().status
    }

    #[test]
    fn test_clean_run_is_indexed() {
        let (storage, manager, site_id) = setup(false);
        manager.record_success(site_id);

        assert_eq!(manager.finalize(site_id), SiteStatus::Indexed);
        assert_eq!(status(&storage, site_id), SiteStatus::Indexed);
    }

    #[test]
    fn test_failure_is_sticky_without_self_heal() {
        let (storage, manager, site_id) = setup(false);

        manager.record_page_failure(site_id, "/broken", 500, "Unknown error");
        manager.record_success(site_id);

        assert_eq!(manager.finalize(site_id), SiteStatus::Failed);
        let site = storage.lock().get_site(site_id).unwrap();
        assert_eq!(site.status, SiteStatus::Failed);
        assert_eq!(site.last_error.as_deref(), Some("Unknown error"));

        let page = storage.lock().find_page(site_id, "/broken").unwrap().unwrap();
        assert_eq!(page.code, 500);
        assert!(page.content.is_empty());
    }

    #[test]
    fn test_self_heal_recovers() {
        let (storage, manager, site_id) = setup(true);

        manager.record_page_failure(site_id, "/broken", 500, "Unknown error");
        assert_eq!(status(&storage, site_id), SiteStatus::Failed);

        manager.record_success(site_id);
        assert!(!manager.has_error(site_id));
        assert_eq!(status(&storage, site_id), SiteStatus::Indexing);

        assert_eq!(manager.finalize(site_id), SiteStatus::Indexed);
    }

    #[test]
    fn test_initialize_clears_flag() {
        let (_storage, manager, site_id) = setup(false);
        manager.record_page_failure(site_id, "/x", 404, "gone");
        assert!(manager.has_error(site_id));

        manager.initialize(site_id);
        assert!(!manager.has_error(site_id));
    }

    #[test]
    fn test_fail_is_final() {
        let (storage, manager, site_id) = setup(true);
        manager.fail(site_id, "Page not found: 7");

        assert_eq!(manager.finalize(site_id), SiteStatus::Failed);
        let site = storage.lock().get_site(site_id).unwrap();
        assert_eq!(site.status, SiteStatus::Failed);
        assert_eq!(site.last_error.as_deref(), Some("Page not found: 7"));
    }

    #[test]
    fn test_missing_site_does_not_panic() {
        let (_storage, manager, _) = setup(false);
        manager.record_page_failure(999, "/x", 500, "boom");
        assert_eq!(manager.finalize(999), SiteStatus::Failed);
    }
}
