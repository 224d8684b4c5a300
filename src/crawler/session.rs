//! Browser session lifecycle
//!
//! A [`BrowserSession`] owns at most one running browser. It opens the site
//! root on start, classifies navigation failures, and can be closed any
//! number of times.

use crate::browser::{Driver, DriverError, Launcher};
use crate::state::SessionState;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

/// Why a navigation did not complete
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NavigationError {
    /// The browser died; a restart is required
    #[error("session invalid: {0}")]
    SessionInvalid(String),

    /// Connectivity or DNS failure
    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Other(String),
}

impl From<DriverError> for NavigationError {
    fn from(error: DriverError) -> Self {
        match error {
            DriverError::SessionInvalid(message) => Self::SessionInvalid(message),
            DriverError::Network(message) => Self::Network(message),
            DriverError::Launch(message) | DriverError::Other(message) => Self::Other(message),
        }
    }
}

/// The single browser session of a crawl
pub struct BrowserSession {
    launcher: Box<dyn Launcher>,
    driver: Option<Box<dyn Driver>>,
    state: SessionState,
    site_root: String,
    open_delay: Duration,
    restarts: u32,
}

impl BrowserSession {
    /// Creates a closed session
    ///
    /// # Arguments
    ///
    /// * `launcher` - Starts the browser on `open`
    /// * `site_root` - Page loaded right after every launch
    /// * `open_delay` - Pause after loading the site root
    pub fn new(launcher: Box<dyn Launcher>, site_root: impl Into<String>, open_delay: Duration) -> Self {
        Self {
            launcher,
            driver: None,
            state: SessionState::Closed,
            site_root: site_root.into(),
            open_delay,
            restarts: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of successful restarts so far
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Starts the browser and opens the site root
    ///
    /// Fails only when the browser itself cannot be started. A site root that
    /// does not load is logged and left for the next navigation to report.
    pub async fn open(&mut self) -> Result<(), DriverError> {
        self.close().await;

        tracing::info!("Launching browser");
        let mut driver = self.launcher.launch().await?;

        tracing::info!("Opening {}...", self.site_root);
        if let Err(e) = driver.goto(&self.site_root).await {
            tracing::warn!("Failed to open {}: {}", self.site_root, e);
        }

        self.driver = Some(driver);
        self.state = SessionState::Active;
        sleep(self.open_delay).await;
        Ok(())
    }

    /// Loads `url` in the browser tab
    ///
    /// A session failure marks the session `Dead`; it stays dead until
    /// `restart` or `open` succeeds.
    pub async fn navigate(&mut self, url: &str) -> Result<(), NavigationError> {
        let driver = self.active_driver()?;
        let result = driver.goto(url).await;
        self.observe(result)
    }

    /// Returns the rendered markup of the current page
    pub async fn page_source(&mut self) -> Result<String, NavigationError> {
        let driver = self.active_driver()?;
        let result = driver.page_source().await;
        self.observe(result)
    }

    /// Releases the browser
    ///
    /// Safe to call on a closed or dead session; quit errors are logged only.
    pub async fn close(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            match driver.quit().await {
                Ok(()) => tracing::debug!("Browser closed"),
                Err(e) => tracing::debug!("Browser already gone ({}), ignored", e),
            }
        }
        self.state = SessionState::Closed;
    }

    /// Closes the browser, waits `wait`, then opens a fresh one
    pub async fn restart(&mut self, wait: Duration) -> Result<(), DriverError> {
        tracing::info!("Restarting browser...");
        self.close().await;
        sleep(wait).await;
        self.open().await?;
        self.restarts += 1;
        Ok(())
    }

    fn active_driver(&mut self) -> Result<&mut Box<dyn Driver>, NavigationError> {
        match (self.state, self.driver.as_mut()) {
            (SessionState::Active, Some(driver)) => Ok(driver),
            (state, _) => Err(NavigationError::SessionInvalid(format!(
                "browser session is {}",
                state
            ))),
        }
    }

    fn observe<T>(&mut self, result: Result<T, DriverError>) -> Result<T, NavigationError> {
        result.map_err(|e| {
            let error = NavigationError::from(e);
            if matches!(error, NavigationError::SessionInvalid(_)) {
                self.state = SessionState::Dead;
            }
            error
        })
    }
}
