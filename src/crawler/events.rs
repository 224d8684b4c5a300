//! Crawl events and the logging capability
//!
//! Components report what they do through an [`EventLog`] handed to them by
//! the controller. [`TracingLog`] forwards events to `tracing`; tests record
//! them instead.

use crate::output::CrawlSummary;
use crate::state::{MatchId, StopReason};
use std::path::PathBuf;
use std::time::Duration;

/// Something worth reporting during a crawl
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    /// A listing page is about to be loaded
    PageStarted {
        offset: u64,
        completed: usize,
        target: Option<usize>,
    },

    /// Match identifiers were found on a listing page
    LinksFound { offset: u64, count: usize },

    /// A listing page had no match identifiers
    EmptyPage {
        offset: u64,
        exhausted: bool,
        consecutive_failures: u32,
    },

    /// A navigation attempt failed
    AttemptFailed {
        label: String,
        attempt: u32,
        max_attempts: u32,
        error: String,
    },

    /// All attempts of a navigation failed
    RetriesExhausted { label: String, attempts: u32 },

    /// The browser is being restarted after a session failure
    SessionRestarting { wait: Duration },

    /// A match is already on disk
    MatchSkipped {
        id: MatchId,
        position: usize,
        target: Option<usize>,
    },

    /// A match is about to be fetched
    MatchStarted {
        id: MatchId,
        position: usize,
        target: Option<usize>,
    },

    MatchSaved { id: MatchId, path: PathBuf },

    /// A match could not be harvested and was skipped
    MatchFailed { id: MatchId, reason: String },

    /// The crawl loop ended
    Stopped { reason: StopReason },

    /// Final summary, emitted once after teardown
    Finished(CrawlSummary),
}

/// Logging capability handed to crawl components
pub trait EventLog: Send + Sync {
    fn record(&self, event: &CrawlEvent);
}

/// Writes crawl events as `tracing` log lines
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

fn progress_label(position: usize, target: Option<usize>) -> String {
    match target {
        Some(target) => format!("{}/{}", position, target),
        None => position.to_string(),
    }
}

impl EventLog for TracingLog {
    fn record(&self, event: &CrawlEvent) {
        match event {
            CrawlEvent::PageStarted {
                offset,
                completed,
                target,
            } => {
                tracing::info!(
                    "Processing results page (offset {}), progress: {} matches",
                    offset,
                    progress_label(*completed, *target)
                );
            }
            CrawlEvent::LinksFound { offset, count } => {
                tracing::info!("Found {} match links at offset {}", count, offset);
            }
            CrawlEvent::EmptyPage {
                offset,
                exhausted: true,
                ..
            } => {
                tracing::info!("No results left at offset {}", offset);
            }
            CrawlEvent::EmptyPage {
                offset,
                consecutive_failures,
                ..
            } => {
                tracing::warn!(
                    "No matches found at offset {} (failure #{})",
                    offset,
                    consecutive_failures
                );
            }
            CrawlEvent::AttemptFailed {
                label,
                attempt,
                max_attempts,
                error,
            } => {
                tracing::warn!(
                    "Loading {} failed (attempt {}/{}): {}",
                    label,
                    attempt,
                    max_attempts,
                    error
                );
            }
            CrawlEvent::RetriesExhausted { label, attempts } => {
                tracing::error!("Failed to load {} after {} attempts", label, attempts);
            }
            CrawlEvent::SessionRestarting { wait } => {
                tracing::warn!("Session dead, restarting browser in {:?}", wait);
            }
            CrawlEvent::MatchSkipped {
                id,
                position,
                target,
            } => {
                tracing::info!(
                    "({}) Skipping {} (already scraped)",
                    progress_label(*position, *target),
                    id
                );
            }
            CrawlEvent::MatchStarted {
                id,
                position,
                target,
            } => {
                tracing::info!(
                    "({}) Scraping match {}",
                    progress_label(*position, *target),
                    id
                );
            }
            CrawlEvent::MatchSaved { id, path } => {
                tracing::info!("Match {} saved to {}", id, path.display());
            }
            CrawlEvent::MatchFailed { id, reason } => {
                tracing::warn!("Skipping match {}: {}", id, reason);
            }
            CrawlEvent::Stopped { reason } => {
                tracing::info!("Stopping crawl: {}", reason);
            }
            CrawlEvent::Finished(summary) => {
                tracing::info!(
                    "Crawl finished: {} matches saved this run, {} on disk, stop reason: {}",
                    summary.saved,
                    summary.total_on_disk,
                    summary.stop_reason
                );
            }
        }
    }
}
