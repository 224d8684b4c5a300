//! Output module for match records and crawl reports
//!
//! This module handles:
//! - Normalizing statistic tables into per-match records
//! - Writing records atomically to the output directory
//! - Scanning the output directory for completed matches
//! - Crawl summaries and directory statistics

mod record;
pub mod stats;
mod store;
mod summary;

pub use record::{MatchRecord, TeamTable, PLAYERS_COLUMN, TEAM_COLUMN};
pub use stats::{load_statistics, print_statistics, HarvestStatistics};
pub use store::OutputStore;
pub use summary::{print_summary, CrawlSummary};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Record already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
