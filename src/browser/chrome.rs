//! Browser automation using chromiumoxide.

use crate::browser::{Driver, DriverError, Launcher};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::page::Page;
use chromiumoxide::Handler;
use futures::StreamExt;
use tokio::task::JoinHandle;

/// Chrome error fragments that mean the network, not the browser, failed
const NETWORK_MARKERS: &[&str] = &[
    "net::err_name_not_resolved",
    "net::err_internet_disconnected",
    "net::err_network_changed",
    "net::err_connection_",
    "net::err_address_unreachable",
    "net::err_timed_out",
    "dns",
];

/// Error fragments that mean the browser or its debugging connection is gone
const SESSION_MARKERS: &[&str] = &[
    "invalid session id",
    "target closed",
    "session closed",
    "browser closed",
    "channel",
    "receiver",
    "websocket",
    "connection closed",
    "no response",
];

/// Command-line switches for a Chrome instance
///
/// Keeps the window off-screen and hides the automation flag, which the
/// target site uses for bot detection.
pub fn chrome_args(config: &BrowserConfig) -> Vec<String> {
    let mut args = vec![
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-software-rasterizer".to_string(),
        "--disable-blink-features=AutomationControlled".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
    ];

    if !config.headless {
        args.push("--window-position=-32000,-32000".to_string());
    }

    args.extend(config.extra_args.iter().cloned());
    args
}

/// Maps a chromiumoxide error message onto the driver error taxonomy
pub fn classify_cdp_message(message: &str) -> DriverError {
    let lower = message.to_lowercase();

    if NETWORK_MARKERS.iter().any(|marker| lower.contains(marker)) {
        DriverError::Network(message.to_string())
    } else if SESSION_MARKERS.iter().any(|marker| lower.contains(marker)) {
        DriverError::SessionInvalid(message.to_string())
    } else {
        DriverError::Other(message.to_string())
    }
}

/// Launches Chrome through the DevTools protocol
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    config: BrowserConfig,
}

impl ChromeLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Launcher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn Driver>, DriverError> {
        let mut builder = CdpBrowserConfig::builder()
            .no_sandbox()
            .window_size(self.config.window_width, self.config.window_height);

        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(executable) = &self.config.executable {
            builder = builder.chrome_executable(executable);
        }

        for arg in chrome_args(&self.config) {
            builder = builder.arg(arg);
        }

        let cdp_config = builder
            .build()
            .map_err(|e| DriverError::Launch(format!("Failed to build browser config: {}", e)))?;

        let (mut browser, handler) = CdpBrowser::launch(cdp_config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;
        let handle = spawn_handler(handler);

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_error) = shut_down(&mut browser, &handle).await {
                    tracing::debug!("Failed to close browser after launch error: {}", close_error);
                }
                return Err(DriverError::Launch(format!("Failed to open tab: {}", e)));
            }
        };

        Ok(Box::new(ChromeDriver {
            browser,
            page,
            handle,
        }))
    }
}

/// Drives the CDP connection until Chrome goes away
///
/// The browser does not work unless this task keeps running.
fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::debug!("CDP handler error: {}", e);
            }
        }
    })
}

/// Closes Chrome, reaps the process and stops the handler task
async fn shut_down(browser: &mut CdpBrowser, handle: &JoinHandle<()>) -> Result<(), DriverError> {
    let closed = browser.close().await;
    match browser.wait().await {
        Ok(status) => tracing::debug!("Chrome exited with status {:?}", status),
        Err(e) => tracing::debug!("Failed to wait for Chrome to exit: {}", e),
    }
    handle.abort();

    closed
        .map(|_| ())
        .map_err(|e| DriverError::Other(e.to_string()))
}

/// A running Chrome instance with one tab
pub struct ChromeDriver {
    browser: CdpBrowser,
    page: Page,
    handle: JoinHandle<()>,
}

impl ChromeDriver {
    fn ensure_connected(&self) -> Result<(), DriverError> {
        if self.handle.is_finished() {
            return Err(DriverError::SessionInvalid(
                "DevTools connection closed".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Driver for ChromeDriver {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.ensure_connected()?;
        self.page
            .goto(url)
            .await
            .map(|_| ())
            .map_err(|e| classify_cdp_message(&e.to_string()))
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        self.ensure_connected()?;
        self.page
            .content()
            .await
            .map_err(|e| classify_cdp_message(&e.to_string()))
    }

    async fn quit(&mut self) -> Result<(), DriverError> {
        shut_down(&mut self.browser, &self.handle).await
    }
}
