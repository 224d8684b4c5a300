//! Configuration module for Match-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so a minimal file only needs an output directory.
//!
//! # Example
//!
//! ```no_run
//! use match_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Writing records to: {}", config.output.directory);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, CrawlConfig, DelayConfig, ListingConfig, OutputConfig, RetryConfig,
    SiteConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
