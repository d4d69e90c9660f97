//! Indexing status of a site
//!
//! A site enters `Indexing` when a run starts and leaves it exactly once for
//! `Indexed` or `Failed`. The only way back to `Indexing` is a new run or,
//! when self-healing is enabled, a successful page after a failed one.

use serde::Serialize;
use std::fmt;

/// Status stored in the `sites` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteStatus {
    /// Crawl or indexing in progress
    Indexing,

    /// Run finished without errors
    Indexed,

    /// Run finished with an error or was stopped by the user
    Failed,
}

impl SiteStatus {
    /// Returns true if the site is still being processed
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Indexing)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// Any status may restart into `Indexing`. `Indexed` and `Failed` can only
    /// be reached from `Indexing`.
    pub fn can_transition_to(&self, next: SiteStatus) -> bool {
        match next {
            Self::Indexing => true,
            Self::Indexed | Self::Failed => *self == Self::Indexing,
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Indexing => "INDEXING",
            Self::Indexed => "INDEXED",
            Self::Failed => "FAILED",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "INDEXING" => Some(Self::Indexing),
            "INDEXED" => Some(Self::Indexed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
