//! Match page fetching
//!
//! Harvesting one match takes two navigations: the match overview, which
//! links to the detailed statistics page, and the statistics page itself.
//! Both go through the retry policy; the parsed tables are written to the
//! output store only once everything succeeded.

use crate::browser::DriverError;
use crate::config::{Config, SiteConfig};
use crate::crawler::events::EventLog;
use crate::crawler::parser::{find_stats_link, parse_stats_tables, ParseError};
use crate::crawler::retry::{RetryError, RetryPolicy};
use crate::crawler::session::BrowserSession;
use crate::output::{OutputError, OutputStore};
use crate::state::MatchId;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use url::Url;

/// Why a match could not be harvested
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("no detailed stats link on match {0}")]
    MissingStatsLink(MatchId),

    #[error("invalid match URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to parse statistics: {0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Navigation(RetryError),

    #[error("browser could not be restarted: {0}")]
    Unrecoverable(DriverError),

    #[error("failed to save record: {0}")]
    Output(#[from] OutputError),
}

impl From<RetryError> for MatchError {
    fn from(error: RetryError) -> Self {
        match error {
            RetryError::Unrecoverable(e) => Self::Unrecoverable(e),
            exhausted => Self::Navigation(exhausted),
        }
    }
}

impl MatchError {
    /// Returns true if the crawl cannot continue after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unrecoverable(_))
    }
}

/// Fetches, parses and stores single matches
#[derive(Debug, Clone)]
pub struct MatchPageFetcher {
    site: SiteConfig,
    table_indices: Vec<usize>,
    match_settle: Duration,
    page_delay: Duration,
}

impl MatchPageFetcher {
    pub fn from_config(config: &Config) -> Self {
        Self {
            site: config.site.clone(),
            table_indices: config.crawl.table_indices.clone(),
            match_settle: config.delays.match_settle(),
            page_delay: config.delays.page_delay(),
        }
    }

    /// Harvests one match into the output store
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the written record
    /// * `Err(MatchError)` - Nothing was written; only `Unrecoverable` is fatal
    pub async fn fetch(
        &self,
        session: &mut BrowserSession,
        retry: &RetryPolicy,
        log: &dyn EventLog,
        store: &OutputStore,
        id: &MatchId,
    ) -> Result<PathBuf, MatchError> {
        let match_url = self.site.match_url(id);
        let base = Url::parse(&match_url).map_err(|e| MatchError::InvalidUrl {
            url: match_url.clone(),
            reason: e.to_string(),
        })?;

        let overview = self
            .load(session, retry, log, &format!("match {}", id), &match_url, self.match_settle)
            .await?;

        let stats_url = find_stats_link(&overview, &self.site.stats_link_text, &base)
            .ok_or_else(|| MatchError::MissingStatsLink(id.clone()))?;
        tracing::debug!("Stats page for {}: {}", id, stats_url);

        let stats = self
            .load(
                session,
                retry,
                log,
                &format!("stats of match {}", id),
                stats_url.as_str(),
                self.page_delay,
            )
            .await?;

        let record = parse_stats_tables(&stats, &self.table_indices)?;
        tracing::debug!("Parsed {} player rows for {}", record.len(), id);

        Ok(store.write_record(id, &record)?)
    }

    /// Navigates to `url`, lets it settle, and returns its markup
    async fn load(
        &self,
        session: &mut BrowserSession,
        retry: &RetryPolicy,
        log: &dyn EventLog,
        label: &str,
        url: &str,
        settle: Duration,
    ) -> Result<String, RetryError> {
        let url = url.to_string();
        retry
            .with_retry(session, log, label, |s| {
                let url = url.clone();
                Box::pin(async move {
                    s.navigate(&url).await?;
                    sleep(settle).await;
                    s.page_source().await
                })
            })
            .await
    }
}
