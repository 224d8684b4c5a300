use crate::state::MatchId;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Match-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub listing: ListingConfig,
    pub crawl: CrawlConfig,
    pub retry: RetryConfig,
    pub delays: DelayConfig,
    pub browser: BrowserConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Builds the results listing URL for the given offset, filters included
    ///
    /// # Example
    ///
    /// ```
    /// use match_harvest::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.listing_url(200), "https://www.hltv.org/results?offset=200");
    /// ```
    pub fn listing_url(&self, offset: u64) -> String {
        let mut url = format!("{}/results?offset={}", self.site.root(), offset);

        if let Some(start) = self.listing.start_date {
            url.push_str(&format!("&startDate={}", start.format("%Y-%m-%d")));
        }
        if let Some(end) = self.listing.end_date {
            url.push_str(&format!("&endDate={}", end.format("%Y-%m-%d")));
        }
        if let Some(stars) = self.listing.min_stars {
            url.push_str(&format!("&stars={}", stars));
        }
        if let Some(extra) = &self.listing.extra_query {
            url.push_str(extra);
        }

        url
    }

    /// Builds the overview URL for a single match
    ///
    /// The trailing slug is ignored by the site, so a placeholder is used.
    pub fn match_url(&self, id: &MatchId) -> String {
        self.site.match_url(id)
    }
}

/// Remote site layout
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Site root, opened right after the browser starts
    pub base_url: String,

    /// Path segment that precedes match identifiers in links
    pub match_path: String,

    /// Anchor text of the link to the detailed statistics page
    pub stats_link_text: String,

    /// CSS selector of the "no results for this filter" marker
    pub no_results_selector: String,
}

impl SiteConfig {
    /// Site root without a trailing slash
    pub fn root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn match_url(&self, id: &MatchId) -> String {
        format!("{}/{}/{}/x", self.root(), self.match_path, id)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.hltv.org".to_string(),
            match_path: "matches".to_string(),
            stats_link_text: "Detailed stats".to_string(),
            no_results_selector: ".results-none, .no-results".to_string(),
        }
    }
}

/// Results listing pagination and filters
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ListingConfig {
    /// Offset of the first listing page to visit
    pub start_offset: u64,

    /// Number of results per listing page
    pub page_size: u64,

    /// Only list matches played on or after this date
    pub start_date: Option<NaiveDate>,

    /// Only list matches played on or before this date
    pub end_date: Option<NaiveDate>,

    /// Minimum event tier ("stars") of listed matches
    pub min_stars: Option<u8>,

    /// Raw query string appended verbatim, e.g. `&event=1234`
    pub extra_query: Option<String>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            start_offset: 0,
            page_size: 100,
            start_date: None,
            end_date: None,
            min_stars: None,
            extra_query: None,
        }
    }
}

/// Crawl termination and table selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Stop once this many records exist in the output directory
    pub target_matches: Option<usize>,

    /// Number of transient empty listing pages in a row that stops the crawl
    pub consecutive_failure_threshold: u32,

    /// Stop when the listing reports no results; otherwise skip past the page
    pub stop_on_exhausted: bool,

    /// Move to the next offset after a transient empty page instead of reloading it
    pub advance_on_transient: bool,

    /// Positions of the whole-match statistic tables on the stats page
    pub table_indices: Vec<usize>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            target_matches: None,
            consecutive_failure_threshold: 3,
            stop_on_exhausted: true,
            advance_on_transient: false,
            table_indices: vec![0, 3],
        }
    }
}

/// Navigation retry behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Attempts per navigation, the first one included
    pub max_attempts: u32,

    /// Network errors wait `backoff-step-ms * attempt` before the next attempt
    pub backoff_step_ms: u64,

    /// Wait after errors that are neither network nor session failures
    pub other_error_delay_ms: u64,

    /// Pause between closing a dead browser and launching a new one
    pub restart_wait_ms: u64,
}

impl RetryConfig {
    pub fn backoff_step(&self) -> Duration {
        Duration::from_millis(self.backoff_step_ms)
    }

    pub fn other_error_delay(&self) -> Duration {
        Duration::from_millis(self.other_error_delay_ms)
    }

    pub fn restart_wait(&self) -> Duration {
        Duration::from_millis(self.restart_wait_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step_ms: 5_000,
            other_error_delay_ms: 0,
            restart_wait_ms: 60_000,
        }
    }
}

/// Scheduled pauses that let pages render and keep the request rate low
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DelayConfig {
    /// Wait after loading a listing page before reading it
    pub listing_settle_ms: u64,

    /// Wait after loading a match overview page before reading it
    pub match_settle_ms: u64,

    /// Short pause after other page loads and after opening the browser
    pub page_delay_ms: u64,
}

impl DelayConfig {
    pub fn listing_settle(&self) -> Duration {
        Duration::from_millis(self.listing_settle_ms)
    }

    pub fn match_settle(&self) -> Duration {
        Duration::from_millis(self.match_settle_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            listing_settle_ms: 15_000,
            match_settle_ms: 5_000,
            page_delay_ms: 2_000,
        }
    }
}

/// Browser launch options
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    /// Chrome binary; auto-detected when unset
    pub executable: Option<String>,

    pub headless: bool,

    pub window_width: u32,

    pub window_height: u32,

    /// Additional command-line switches passed to Chrome
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            window_width: 1920,
            window_height: 1080,
            extra_args: Vec::new(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory holding one `match_<id>.csv` per harvested match
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "./matches".to_string(),
        }
    }
}
