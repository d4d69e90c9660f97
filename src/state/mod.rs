//! State module for tracking indexing progress
//!
//! # Components
//!
//! - `SiteStatus`: persisted status of a site (INDEXING, INDEXED, FAILED)
//! - `StatusManager`: per-site state machine with an in-memory error flag
//! - `VisitedUrls`: concurrent set of URLs already claimed by crawl tasks

mod site_status;
mod status_manager;
mod visited;

pub use site_status::SiteStatus;
pub use status_manager::StatusManager;
pub use visited::VisitedUrls;
