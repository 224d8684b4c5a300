use crate::config::types::{
    BrowserConfig, Config, CrawlConfig, ListingConfig, OutputConfig, RetryConfig, SiteConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_listing_config(&config.listing)?;
    validate_crawl_config(&config.crawl)?;
    validate_retry_config(&config.retry)?;
    validate_browser_config(&config.browser)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the remote site layout settings
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.match_path.is_empty() || config.match_path.contains('/') {
        return Err(ConfigError::Validation(format!(
            "match-path must be a single path segment, got '{}'",
            config.match_path
        )));
    }

    if config.stats_link_text.trim().is_empty() {
        return Err(ConfigError::Validation(
            "stats-link-text cannot be empty".to_string(),
        ));
    }

    if Selector::parse(&config.no_results_selector).is_err() {
        return Err(ConfigError::Validation(format!(
            "no-results-selector is not a valid CSS selector: '{}'",
            config.no_results_selector
        )));
    }

    Ok(())
}

/// Validates pagination and listing filters
fn validate_listing_config(config: &ListingConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 {
        return Err(ConfigError::Validation(
            "page-size must be >= 1".to_string(),
        ));
    }

    if let (Some(start), Some(end)) = (config.start_date, config.end_date) {
        if start > end {
            return Err(ConfigError::Validation(format!(
                "start-date {} is after end-date {}",
                start, end
            )));
        }
    }

    if let Some(stars) = config.min_stars {
        if stars > 5 {
            return Err(ConfigError::Validation(format!(
                "min-stars must be between 0 and 5, got {}",
                stars
            )));
        }
    }

    if let Some(extra) = &config.extra_query {
        if !extra.is_empty() && !extra.starts_with('&') {
            return Err(ConfigError::Validation(format!(
                "extra-query must start with '&', got '{}'",
                extra
            )));
        }
    }

    Ok(())
}

/// Validates crawl termination settings
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.consecutive_failure_threshold < 1 {
        return Err(ConfigError::Validation(
            "consecutive-failure-threshold must be >= 1".to_string(),
        ));
    }

    if config.target_matches == Some(0) {
        return Err(ConfigError::Validation(
            "target-matches must be >= 1 when set".to_string(),
        ));
    }

    if config.table_indices.is_empty() {
        return Err(ConfigError::Validation(
            "table-indices cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates retry settings
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 20 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 20, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates browser launch settings
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.window_width == 0 || config.window_height == 0 {
        return Err(ConfigError::Validation(format!(
            "window size must be non-zero, got {}x{}",
            config.window_width, config.window_height
        )));
    }

    if let Some(executable) = &config.executable {
        if executable.trim().is_empty() {
            return Err(ConfigError::Validation(
                "executable cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}
