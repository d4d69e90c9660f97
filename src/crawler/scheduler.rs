//! Fetch scheduling for crawl tasks
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore shared by all sites
//! - The politeness delay applied before every request
//! - Closing the gate when a run is stopped

use crate::config::CrawlerConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Permission to perform one fetch
///
/// The slot is released when dropped.
pub struct FetchSlot {
    _permit: OwnedSemaphorePermit,
}

/// Limits the number of fetches in flight across all crawl tasks
///
/// Crawl tasks are spawned freely, one per discovered link; only the fetch
/// itself waits for a slot. Slots must be released before a task waits for
/// its children, otherwise a deep site could hold every slot while waiting.
#[derive(Debug, Clone)]
pub struct FetchScheduler {
    semaphore: Arc<Semaphore>,
    delay: Duration,
}

impl FetchScheduler {
    pub fn new(config: &CrawlerConfig) -> Self {
        Self::with_limits(
            config.max_concurrent_fetches as usize,
            Duration::from_millis(config.request_delay_ms),
        )
    }

    pub fn with_limits(max_concurrent: usize, delay: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            delay,
        }
    }

    /// Waits for a free slot, then for the politeness delay
    ///
    /// Returns `None` once the scheduler has been closed.
    pub async fn acquire(&self) -> Option<FetchSlot> {
        let permit = self.semaphore.clone().acquire_owned().await.ok()?;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.semaphore.is_closed() {
            return None;
        }

        Some(FetchSlot { _permit: permit })
    }

    /// Refuses every pending and future `acquire`
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Number of free slots
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
