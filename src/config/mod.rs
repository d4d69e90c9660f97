//! Configuration module for Sitedex
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sitedex::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitedex.toml")).unwrap();
//! println!("Crawling {} sites", config.sites.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ConnectionConfig, CrawlerConfig, IndexingConfig, MessagesConfig, SearchConfig,
    SiteEntry, StorageConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
