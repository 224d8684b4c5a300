//! Retry logic with linear backoff and session recovery.
//!
//! Navigation failures come in three kinds and each gets its own treatment:
//! network errors back off linearly, session failures restart the browser,
//! anything else is retried straight away.

use crate::browser::DriverError;
use crate::config::RetryConfig;
use crate::crawler::events::{CrawlEvent, EventLog};
use crate::crawler::session::{BrowserSession, NavigationError};
use futures::future::BoxFuture;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

/// Failure of a retried action
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RetryError {
    /// Every attempt failed; the caller decides what to skip
    #[error("{label} failed after {attempts} attempts: {last}")]
    Exhausted {
        label: String,
        attempts: u32,
        last: NavigationError,
    },

    /// The browser could not be restarted
    #[error("browser restart failed: {0}")]
    Unrecoverable(DriverError),
}

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per action, the first one included
    pub max_attempts: u32,
    /// Network errors wait `backoff_step * attempt`
    pub backoff_step: Duration,
    /// Wait after other errors
    pub other_error_delay: Duration,
    /// Pause between closing and relaunching a dead browser
    pub restart_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_step: config.backoff_step(),
            other_error_delay: config.other_error_delay(),
            restart_wait: config.restart_wait(),
        }
    }

    /// Delay after a network error on the given 1-based attempt
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }

    /// Runs `action` against the session until it succeeds or attempts run out
    ///
    /// A session failure restarts the browser before the next attempt and
    /// still counts as an attempt. There is no wait after the final attempt.
    ///
    /// # Arguments
    ///
    /// * `session` - The browser session handed to every attempt
    /// * `log` - Receives one `AttemptFailed` event per failed attempt
    /// * `label` - Human-readable name of the action for logs
    /// * `action` - Builds the future for one attempt
    pub async fn with_retry<T, F>(
        &self,
        session: &mut BrowserSession,
        log: &dyn EventLog,
        label: &str,
        mut action: F,
    ) -> Result<T, RetryError>
    where
        F: for<'s> FnMut(&'s mut BrowserSession) -> BoxFuture<'s, Result<T, NavigationError>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            let error = match action(session).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!("{} succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            log.record(&CrawlEvent::AttemptFailed {
                label: label.to_string(),
                attempt,
                max_attempts: self.max_attempts,
                error: error.to_string(),
            });

            let attempts_left = attempt < self.max_attempts;
            match &error {
                NavigationError::Network(_) => {
                    if attempts_left {
                        sleep(self.backoff_for_attempt(attempt)).await;
                    }
                }
                NavigationError::SessionInvalid(_) => {
                    // Restart even after the last attempt so the next caller
                    // gets a working browser.
                    log.record(&CrawlEvent::SessionRestarting {
                        wait: self.restart_wait,
                    });
                    session
                        .restart(self.restart_wait)
                        .await
                        .map_err(RetryError::Unrecoverable)?;
                }
                NavigationError::Other(_) => {
                    if attempts_left && !self.other_error_delay.is_zero() {
                        sleep(self.other_error_delay).await;
                    }
                }
            }

            last_error = Some(error);
        }

        log.record(&CrawlEvent::RetriesExhausted {
            label: label.to_string(),
            attempts: self.max_attempts,
        });

        Err(RetryError::Exhausted {
            label: label.to_string(),
            attempts: self.max_attempts,
            last: last_error
                .unwrap_or_else(|| NavigationError::Other("no attempts were made".to_string())),
        })
    }
}
