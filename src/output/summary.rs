//! Final crawl summary

use crate::state::StopReason;
use chrono::{DateTime, Utc};

/// What a crawl achieved and why it ended
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stop_reason: StopReason,

    /// Records written during this run
    pub saved: usize,

    /// Matches skipped because a record already existed
    pub skipped: usize,

    /// Matches that failed and were left for a later run
    pub failed: usize,

    /// Listing pages loaded
    pub pages_visited: usize,

    /// Records in the output directory at the end of the run
    pub total_on_disk: usize,

    /// Listing offset the crawl stopped at
    pub final_offset: u64,

    /// Browser restarts after session failures
    pub restarts: u32,
}

impl CrawlSummary {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");
    println!("  Stop reason: {}", summary.stop_reason);
    println!("  Matches saved this run: {}", summary.saved);
    println!("  Matches already on disk (skipped): {}", summary.skipped);
    println!("  Matches failed: {}", summary.failed);
    println!("  Records on disk: {}", summary.total_on_disk);
    println!("  Listing pages visited: {}", summary.pages_visited);
    println!("  Final offset: {}", summary.final_offset);
    println!("  Browser restarts: {}", summary.restarts);
    println!(
        "  Duration: {}s ({} -> {})",
        summary.duration_seconds(),
        summary.started_at.format("%Y-%m-%d %H:%M:%S"),
        summary.finished_at.format("%Y-%m-%d %H:%M:%S")
    );
}
