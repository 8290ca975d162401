//! # ytlatest-resolver
//!
//! Finds the newest upload on a channel. The `/videos` listing is populated by
//! client-side script, so the page is loaded in a headless browser and the
//! first video thumbnail link is read once it appears.

pub mod chromium;
pub mod driver;
#[cfg(any(test, feature = "test-util"))]
pub mod mock_driver;
pub mod resolver;

pub use chromium::{ChromiumConfig, ChromiumDriver};
pub use driver::{BrowserDriver, BrowserSession};
#[cfg(any(test, feature = "test-util"))]
pub use mock_driver::MockBrowserDriver;
pub use resolver::{ResolverConfig, VideoResolver, LISTING_SELECTOR};
