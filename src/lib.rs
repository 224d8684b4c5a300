//! Match-Harvest: an incremental match statistics harvester
//!
//! This crate drives an automated browser through a paginated results listing,
//! collects match identifiers and stores the per-player statistic tables of
//! every match as one CSV file. The output directory is the only crawl state:
//! a match is done when its file exists, so an interrupted crawl resumes by
//! simply running again.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

/// Main error type for Match-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser error: {0}")]
    Browser(#[from] browser::DriverError),

    #[error("HTML parse error: {0}")]
    Parse(#[from] crawler::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Match-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlController, ListingPage};
pub use output::{CrawlSummary, MatchRecord, OutputStore};
pub use state::{CrawlProgress, MatchId, SessionState, StopReason};
