//! Browser automation seam
//!
//! The crawler never talks to Chrome directly. It drives a [`Driver`] obtained
//! from a [`Launcher`], which keeps the crawl logic independent of the
//! automation backend and lets tests script page loads.

mod chrome;
mod traits;

pub use chrome::{chrome_args, classify_cdp_message, ChromeDriver, ChromeLauncher};
pub use traits::{Driver, DriverError, Launcher};
