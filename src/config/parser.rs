//! Config file loading
//!
//! The file is read once per call. The hash covers the raw file text,
//! comments and key order included.

use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Loads, parses and validates the TOML file at `path`
///
/// Missing tables and keys fall back to their defaults.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use match_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Failure threshold: {}", config.crawl.consecutive_failure_threshold);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&fs::read_to_string(path)?)
}

/// Hex-encoded SHA-256 of the file at `path`
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(hash_source(&fs::read_to_string(path)?))
}

/// Same as [`load_config`], plus the hash of exactly the text that was parsed
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let source = fs::read_to_string(path)?;
    let config = parse_config(&source)?;
    tracing::debug!("Parsed configuration from {}", path.display());
    Ok((config, hash_source(&source)))
}

fn parse_config(source: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(source)?;
    validate(&config)?;
    Ok(config)
}

fn hash_source(source: &str) -> String {
    hex::encode(Sha256::digest(source.as_bytes()))
}
