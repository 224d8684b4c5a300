//! Crawler module for listing traversal and match harvesting
//!
//! This module contains the core crawling logic, including:
//! - Browser session lifecycle and failure classification
//! - Retry logic with linear backoff and browser restarts
//! - HTML parsing of listing, overview and statistics pages
//! - Overall crawl coordination and progress events

mod coordinator;
mod events;
mod fetcher;
mod parser;
mod retry;
mod session;

pub use coordinator::CrawlController;
pub use events::{CrawlEvent, EventLog, TracingLog};
pub use fetcher::{MatchError, MatchPageFetcher};
pub use parser::{find_stats_link, parse_stats_tables, LinkExtractor, ListingPage, ParseError};
pub use retry::{RetryError, RetryPolicy};
pub use session::{BrowserSession, NavigationError};

use crate::browser::ChromeLauncher;
use crate::config::Config;
use crate::output::CrawlSummary;
use crate::HarvestError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the output directory
/// 2. Launch Chrome and open the site root
/// 3. Walk the results listing, harvesting every match without a record
/// 4. Close the browser and report a summary
///
/// # Arguments
///
/// * `config` - The validated crawl configuration
/// * `cancel` - Trip to stop the crawl at the next page or match boundary
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl ended; see `stop_reason` for why
/// * `Err(HarvestError)` - The crawl could not be set up
pub async fn crawl(
    config: Config,
    cancel: CancellationToken,
) -> Result<CrawlSummary, HarvestError> {
    let launcher = ChromeLauncher::new(config.browser.clone());
    let mut controller =
        CrawlController::new(config, Box::new(launcher), Arc::new(TracingLog), cancel)?;
    Ok(controller.run().await)
}
