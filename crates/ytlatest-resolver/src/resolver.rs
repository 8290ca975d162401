//! Latest-upload resolution against the channel listing page.

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use ytlatest_core::{ChannelHandle, Error, Result, VideoReference};

use crate::driver::{BrowserDriver, BrowserSession};

/// Thumbnail links of the listing grid. The first match is the newest upload.
pub const LISTING_SELECTOR: &str = r#"a#thumbnail[href^="/watch"]"#;

/// Timing for the listing wait.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// How long to wait for the listing to populate.
    pub wait_timeout: Duration,
    /// Delay between DOM probes.
    pub poll_interval: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// Resolves a channel handle to the URL of its most recent video.
///
/// Every call launches its own browser session and closes it before
/// returning, whatever the outcome.
#[derive(Clone)]
pub struct VideoResolver {
    driver: Arc<dyn BrowserDriver>,
    config: ResolverConfig,
}

impl VideoResolver {
    pub fn new(driver: Arc<dyn BrowserDriver>, config: ResolverConfig) -> Self {
        Self { driver, config }
    }

    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Validate a raw handle, then resolve it.
    ///
    /// An empty handle fails with `InvalidInput` without touching the browser.
    pub async fn resolve_handle(&self, raw: &str, cancel: &CancellationToken) -> Result<VideoReference> {
        let channel = ChannelHandle::parse(raw)?;
        self.resolve(&channel, cancel).await
    }

    /// Find the newest upload on `channel`.
    pub async fn resolve(&self, channel: &ChannelHandle, cancel: &CancellationToken) -> Result<VideoReference> {
        let listing = channel.listing_url()?;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        debug!("Opening browser session for {channel}");
        let mut session = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            opened = self.driver.open() => opened.map_err(resolution_failure)?,
        };

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            found = self.first_video_href(session.as_mut(), listing.as_str()) => found,
        };

        if let Err(e) = session.close().await {
            warn!("Failed to close browser session: {e}");
        }

        let href = outcome?;
        let reference = VideoReference::from_href(&href)?;
        info!("Latest upload on {channel}: {reference}");
        Ok(reference)
    }

    async fn first_video_href(&self, session: &mut dyn BrowserSession, listing: &str) -> Result<String> {
        debug!("Navigating to {listing}");
        session.navigate(listing).await.map_err(resolution_failure)?;

        tokio::time::timeout(
            self.config.wait_timeout,
            poll_first_href(session, self.config.poll_interval),
        )
        .await
        .map_err(|_| {
            Error::NotFound(format!(
                "No videos appeared on {listing} within {}s",
                self.config.wait_timeout.as_secs()
            ))
        })?
    }
}

async fn poll_first_href(session: &mut dyn BrowserSession, interval: Duration) -> Result<String> {
    loop {
        if let Some(href) = session
            .first_href(LISTING_SELECTOR)
            .await
            .map_err(resolution_failure)?
        {
            return Ok(href);
        }
        tokio::time::sleep(interval).await;
    }
}

fn resolution_failure(e: Error) -> Error {
    match e {
        Error::ResolutionFailure(_) | Error::Cancelled => e,
        other => Error::ResolutionFailure(other.to_string()),
    }
}
