use crate::config::types::{
    Config, ConnectionConfig, CrawlerConfig, IndexingConfig, SearchConfig, SiteEntry,
    StorageConfig,
};
use crate::url::SiteUrl;
use crate::ConfigError;
use std::collections::HashSet;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_connection_config(&config.connection)?;
    validate_indexing_config(&config.indexing)?;
    validate_search_config(&config.search)?;
    validate_storage_config(&config.storage)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 256 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-fetches must be between 1 and 256, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.fetch_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "fetch-timeout-ms must be >= 100ms, got {}ms",
            config.fetch_timeout_ms
        )));
    }

    Ok(())
}

/// Validates the identification headers
fn validate_connection_config(config: &ConnectionConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_indexing_config(config: &IndexingConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(
            "batch-size must be >= 1".to_string(),
        ));
    }

    if config.split_threshold < 1 {
        return Err(ConfigError::Validation(
            "split-threshold must be >= 1".to_string(),
        ));
    }

    if !config.title_weight.is_finite() || config.title_weight < 0.0 {
        return Err(ConfigError::Validation(format!(
            "title-weight must be a non-negative number, got {}",
            config.title_weight
        )));
    }

    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if let Some(percent) = config.frequency_threshold_percent {
        if !(percent > 0.0 && percent <= 100.0) {
            return Err(ConfigError::Validation(format!(
                "frequency-threshold-percent must be in (0, 100], got {}",
                percent
            )));
        }
    }

    if config.snippet_size < 20 {
        return Err(ConfigError::Validation(format!(
            "snippet-size must be >= 20, got {}",
            config.snippet_size
        )));
    }

    if config.default_limit < 1 {
        return Err(ConfigError::Validation(
            "default-limit must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the site list: at least one site, parseable and unique home pages
fn validate_sites(sites: &[SiteEntry]) -> Result<(), ConfigError> {
    if sites.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[sites]] entry is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in sites {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' must have a name",
                entry.url
            )));
        }

        let home = SiteUrl::parse(&entry.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid site URL '{}': {}", entry.url, e))
        })?;

        if !seen.insert(home.as_str().to_string()) {
            return Err(ConfigError::Validation(format!(
                "Site '{}' is configured more than once",
                home
            )));
        }
    }

    Ok(())
}
