//! Driver traits and error types

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a browser driver
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    /// The automation backend could not be started
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    /// The browser crashed, was closed, or lost its debugging connection
    #[error("Browser session is no longer valid: {0}")]
    SessionInvalid(String),

    /// Connectivity or DNS failure while loading a page
    #[error("Network error: {0}")]
    Network(String),

    #[error("Browser error: {0}")]
    Other(String),
}

/// One running browser instance with a single tab
#[async_trait]
pub trait Driver: Send {
    /// Loads `url` in the tab and waits for the navigation to finish
    async fn goto(&mut self, url: &str) -> Result<(), DriverError>;

    /// Returns the rendered markup of the current page
    async fn page_source(&mut self) -> Result<String, DriverError>;

    /// Shuts the browser down
    async fn quit(&mut self) -> Result<(), DriverError>;
}

/// Starts browser instances
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn Driver>, DriverError>;
}
