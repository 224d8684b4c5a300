//! Crawl controller - main crawl orchestration logic
//!
//! The controller walks the results listing page by page and harvests every
//! match that has no record yet. It owns the browser session and the crawl
//! progress, and every way out of the loop converges on a single teardown
//! path that closes the browser once and reports a summary.

use crate::browser::Launcher;
use crate::config::Config;
use crate::crawler::events::{CrawlEvent, EventLog};
use crate::crawler::fetcher::MatchPageFetcher;
use crate::crawler::parser::{LinkExtractor, ListingPage};
use crate::crawler::retry::{RetryError, RetryPolicy};
use crate::crawler::session::BrowserSession;
use crate::output::{CrawlSummary, OutputStore};
use crate::state::{CrawlProgress, MatchId, StopReason};
use crate::HarvestError;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Per-run counters reported in the summary
#[derive(Debug, Default)]
struct RunCounters {
    saved: usize,
    skipped: usize,
    failed: usize,
    pages_visited: usize,
}

/// Main crawl controller structure
pub struct CrawlController {
    config: Config,
    session: BrowserSession,
    retry: RetryPolicy,
    extractor: LinkExtractor,
    fetcher: MatchPageFetcher,
    store: OutputStore,
    log: Arc<dyn EventLog>,
    cancel: CancellationToken,
    progress: CrawlProgress,
    counters: RunCounters,
}

impl CrawlController {
    /// Creates a new controller
    ///
    /// # Arguments
    ///
    /// * `config` - Validated crawl configuration
    /// * `launcher` - Starts the browser when the crawl begins
    /// * `log` - Receives every crawl event
    /// * `cancel` - Checked between listing pages and between matches
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlController)` - Ready to run
    /// * `Err(HarvestError)` - The output directory or the listing selectors are unusable
    pub fn new(
        config: Config,
        launcher: Box<dyn Launcher>,
        log: Arc<dyn EventLog>,
        cancel: CancellationToken,
    ) -> Result<Self, HarvestError> {
        let store = OutputStore::new(&config.output.directory)?;
        let extractor =
            LinkExtractor::new(&config.site.match_path, &config.site.no_results_selector)?;
        let session = BrowserSession::new(launcher, config.site.root(), config.delays.page_delay());
        let progress = CrawlProgress::new(config.listing.start_offset, 0);

        Ok(Self {
            retry: RetryPolicy::from_config(&config.retry),
            fetcher: MatchPageFetcher::from_config(&config),
            session,
            extractor,
            store,
            log,
            cancel,
            progress,
            counters: RunCounters::default(),
            config,
        })
    }

    /// Runs the crawl until it stops and returns the summary
    ///
    /// Never fails: an unrecoverable browser failure ends the crawl with
    /// `StopReason::UnrecoverableError` and is reported in the summary.
    pub async fn run(&mut self) -> CrawlSummary {
        let started_at = Utc::now();
        tracing::info!(
            "Starting crawl at offset {} into {}",
            self.progress.current_offset,
            self.store.directory().display()
        );

        let reason = match self.session.open().await {
            Ok(()) => self.crawl_loop().await,
            Err(e) => StopReason::UnrecoverableError(e.to_string()),
        };

        self.session.close().await;
        self.log.record(&CrawlEvent::Stopped {
            reason: reason.clone(),
        });

        let total_on_disk = match self.store.completed_ids() {
            Ok(ids) => ids.len(),
            Err(e) => {
                tracing::warn!("Failed to rescan output directory: {}", e);
                self.progress.completed
            }
        };

        let summary = CrawlSummary {
            started_at,
            finished_at: Utc::now(),
            stop_reason: reason,
            saved: self.counters.saved,
            skipped: self.counters.skipped,
            failed: self.counters.failed,
            pages_visited: self.counters.pages_visited,
            total_on_disk,
            final_offset: self.progress.current_offset,
            restarts: self.session.restarts(),
        };
        self.log.record(&CrawlEvent::Finished(summary.clone()));

        summary
    }

    /// Processes listing pages until a stop condition holds
    async fn crawl_loop(&mut self) -> StopReason {
        let target = self.config.crawl.target_matches;

        loop {
            if self.cancel.is_cancelled() {
                return StopReason::UserInterrupt;
            }

            let mut completed = match self.store.completed_ids() {
                Ok(ids) => ids,
                Err(e) => {
                    return StopReason::UnrecoverableError(format!(
                        "cannot scan output directory: {}",
                        e
                    ))
                }
            };
            self.progress.completed = completed.len();

            if self.progress.target_reached(target) {
                return StopReason::TargetCountReached;
            }

            let offset = self.progress.current_offset;
            self.log.record(&CrawlEvent::PageStarted {
                offset,
                completed: self.progress.completed,
                target,
            });

            let listing = match self.fetch_listing(offset).await {
                Ok(listing) => listing,
                Err(reason) => return reason,
            };
            self.counters.pages_visited += 1;

            match listing {
                ListingPage::Found(ids) => {
                    self.progress.record_found();
                    self.log.record(&CrawlEvent::LinksFound {
                        offset,
                        count: ids.len(),
                    });

                    if let Some(reason) = self.harvest_page(&ids, &mut completed).await {
                        return reason;
                    }
                    self.progress.advance(self.config.listing.page_size);
                }
                ListingPage::EmptyExhausted => {
                    self.log.record(&CrawlEvent::EmptyPage {
                        offset,
                        exhausted: true,
                        consecutive_failures: self.progress.consecutive_failures,
                    });

                    if self.config.crawl.stop_on_exhausted {
                        return StopReason::ListingExhausted;
                    }
                    self.progress.advance(self.config.listing.page_size);
                }
                ListingPage::EmptyTransient => {
                    let failures = self.progress.record_transient();
                    self.log.record(&CrawlEvent::EmptyPage {
                        offset,
                        exhausted: false,
                        consecutive_failures: failures,
                    });

                    if failures >= self.config.crawl.consecutive_failure_threshold {
                        return StopReason::TooManyConsecutiveEmptyPages;
                    }
                    if self.config.crawl.advance_on_transient {
                        self.progress.advance(self.config.listing.page_size);
                    }
                }
            }
        }
    }

    /// Loads and classifies the listing page at `offset`
    ///
    /// A page that cannot be loaded within the retry budget counts as a
    /// transient empty page. Only a failed browser restart is an error.
    async fn fetch_listing(&mut self, offset: u64) -> Result<ListingPage, StopReason> {
        let url = self.config.listing_url(offset);
        let settle = self.config.delays.listing_settle();
        let label = format!("results page (offset {})", offset);

        let result = self
            .retry
            .with_retry(&mut self.session, self.log.as_ref(), &label, |s| {
                let url = url.clone();
                Box::pin(async move {
                    s.navigate(&url).await?;
                    sleep(settle).await;
                    s.page_source().await
                })
            })
            .await;

        match result {
            Ok(html) => {
                let listing = self.extractor.extract(&html);
                sleep(self.config.delays.page_delay()).await;
                Ok(listing)
            }
            Err(RetryError::Exhausted { .. }) => Ok(ListingPage::EmptyTransient),
            Err(RetryError::Unrecoverable(e)) => Err(StopReason::UnrecoverableError(e.to_string())),
        }
    }

    /// Harvests the matches of one listing page
    ///
    /// Returns a stop reason if the crawl must end before the page is done.
    async fn harvest_page(
        &mut self,
        ids: &[MatchId],
        completed: &mut BTreeSet<MatchId>,
    ) -> Option<StopReason> {
        let target = self.config.crawl.target_matches;

        for id in ids {
            if self.cancel.is_cancelled() {
                return Some(StopReason::UserInterrupt);
            }
            if self.progress.target_reached(target) {
                return Some(StopReason::TargetCountReached);
            }

            if completed.contains(id) {
                self.counters.skipped += 1;
                self.log.record(&CrawlEvent::MatchSkipped {
                    id: id.clone(),
                    position: self.progress.completed,
                    target,
                });
                continue;
            }

            self.log.record(&CrawlEvent::MatchStarted {
                id: id.clone(),
                position: self.progress.completed + 1,
                target,
            });

            let result = self
                .fetcher
                .fetch(
                    &mut self.session,
                    &self.retry,
                    self.log.as_ref(),
                    &self.store,
                    id,
                )
                .await;

            match result {
                Ok(path) => {
                    self.counters.saved += 1;
                    self.progress.completed += 1;
                    completed.insert(id.clone());
                    self.log.record(&CrawlEvent::MatchSaved {
                        id: id.clone(),
                        path,
                    });
                }
                Err(e) if e.is_fatal() => {
                    return Some(StopReason::UnrecoverableError(e.to_string()));
                }
                Err(e) => {
                    self.counters.failed += 1;
                    self.log.record(&CrawlEvent::MatchFailed {
                        id: id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        None
    }
}
