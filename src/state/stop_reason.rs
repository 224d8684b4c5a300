use std::fmt;

/// Why a crawl stopped
///
/// Every way out of the crawl loop ends in exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Cancellation was requested (Ctrl-C)
    UserInterrupt,

    /// Too many transient empty listing pages in a row
    TooManyConsecutiveEmptyPages,

    /// The configured number of records exists on disk
    TargetCountReached,

    /// The listing reported that no results are left for the filter
    ListingExhausted,

    /// The browser could not be started or restarted
    UnrecoverableError(String),
}

impl StopReason {
    /// Returns true for the stop reasons that indicate a failed crawl
    pub fn is_error(&self) -> bool {
        matches!(self, Self::UnrecoverableError(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserInterrupt => write!(f, "interrupted by user"),
            Self::TooManyConsecutiveEmptyPages => {
                write!(f, "too many consecutive empty listing pages")
            }
            Self::TargetCountReached => write!(f, "target match count reached"),
            Self::ListingExhausted => write!(f, "no more results for this filter"),
            Self::UnrecoverableError(message) => write!(f, "unrecoverable error: {}", message),
        }
    }
}
