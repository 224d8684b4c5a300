/// Crawl progress bookkeeping
///
/// Owned by the crawl controller. `completed` is refreshed from the output
/// directory at the start of every listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrawlProgress {
    /// Offset of the listing page being processed
    pub current_offset: u64,

    /// Transient empty listing pages seen in a row
    pub consecutive_failures: u32,

    /// Records present in the output directory
    pub completed: usize,
}

impl CrawlProgress {
    pub fn new(start_offset: u64, completed: usize) -> Self {
        Self {
            current_offset: start_offset,
            consecutive_failures: 0,
            completed,
        }
    }

    /// A listing page yielded match identifiers
    pub fn record_found(&mut self) {
        self.consecutive_failures = 0;
    }

    /// A listing page came back empty without the "no results" marker
    ///
    /// Returns the updated failure streak.
    pub fn record_transient(&mut self) -> u32 {
        self.consecutive_failures += 1;
        self.consecutive_failures
    }

    pub fn advance(&mut self, page_size: u64) {
        self.current_offset += page_size;
    }

    /// Returns true once `completed` reaches the optional target
    pub fn target_reached(&self, target: Option<usize>) -> bool {
        target.is_some_and(|target| self.completed >= target)
    }
}
