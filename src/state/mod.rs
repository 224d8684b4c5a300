//! State module for tracking crawl progress
//!
//! This module provides the small value types the crawl loop passes around.
//!
//! # Components
//!
//! - `MatchId`: Identifier of one match, the key for dedup and output naming
//! - `SessionState`: Whether the browser session can currently navigate
//! - `CrawlProgress`: Offset, failure streak and completed count of a crawl
//! - `StopReason`: Why a crawl ended

mod match_id;
mod progress;
mod session_state;
mod stop_reason;

// Re-export main types
pub use match_id::MatchId;
pub use progress::CrawlProgress;
pub use session_state::SessionState;
pub use stop_reason::StopReason;
