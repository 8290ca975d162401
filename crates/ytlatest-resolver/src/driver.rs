//! Browser automation seams.

use async_trait::async_trait;
use ytlatest_core::Result;

/// Opens isolated browser sessions.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Launch a fresh session with its own profile.
    ///
    /// Failures are reported as `Error::ResolutionFailure`.
    async fn open(&self) -> Result<Box<dyn BrowserSession>>;
}

/// One live page in a launched browser.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate to `url` and wait for the load to finish.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// `href` attribute of the first element matching `selector`, in document
    /// order, or `None` if nothing matches yet.
    async fn first_href(&mut self, selector: &str) -> Result<Option<String>>;

    /// Shut the browser down and release its resources.
    async fn close(self: Box<Self>) -> Result<()>;
}
