//! Scripted browser driver for tests.
//!
//! The fake page is a list of anchor `href`s in document order. Probes apply
//! the `[href^="..."]` clause of the selector and return the first match, the
//! way `document.querySelector` does.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use ytlatest_core::{Error, Result};

use crate::driver::{BrowserDriver, BrowserSession};

/// In-memory driver that serves a fixed listing and counts session lifecycle events.
#[derive(Clone, Default)]
pub struct MockBrowserDriver {
    hrefs: Arc<Vec<String>>,
    populate_after: usize,
    fail_launch: bool,
    fail_navigation: bool,
    counters: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    probes: AtomicUsize,
    navigations: Mutex<Vec<String>>,
}

impl MockBrowserDriver {
    /// A page whose anchors, in document order, are present as soon as it loads.
    pub fn with_listing<I, S>(hrefs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hrefs: Arc::new(hrefs.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// A listing that never populates.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Report no match for the first `probes` probes of each session.
    #[must_use]
    pub const fn populate_after(mut self, probes: usize) -> Self {
        self.populate_after = probes;
        self
    }

    #[must_use]
    pub const fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    #[must_use]
    pub const fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.counters.probes.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.counters.navigations.lock().clone()
    }
}

#[async_trait]
impl BrowserDriver for MockBrowserDriver {
    async fn open(&self) -> Result<Box<dyn BrowserSession>> {
        if self.fail_launch {
            return Err(Error::ResolutionFailure("browser failed to launch".to_string()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            driver: self.clone(),
            probes: 0,
        }))
    }
}

struct MockSession {
    driver: MockBrowserDriver,
    probes: usize,
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.driver.counters.navigations.lock().push(url.to_string());
        if self.driver.fail_navigation {
            return Err(Error::ResolutionFailure(format!("navigation to {url} failed")));
        }
        Ok(())
    }

    async fn first_href(&mut self, selector: &str) -> Result<Option<String>> {
        self.driver.counters.probes.fetch_add(1, Ordering::SeqCst);
        self.probes += 1;
        if self.probes <= self.driver.populate_after {
            return Ok(None);
        }
        let prefix = href_prefix(selector).unwrap_or_default();
        Ok(self
            .driver
            .hrefs
            .iter()
            .find(|href| href.starts_with(prefix))
            .cloned())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.driver.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Value of a `[href^="..."]` attribute clause.
fn href_prefix(selector: &str) -> Option<&str> {
    let (_, rest) = selector.split_once("[href^=\"")?;
    rest.split_once('"').map(|(prefix, _)| prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_href_prefix() {
        assert_eq!(href_prefix(r#"a#thumbnail[href^="/watch"]"#), Some("/watch"));
        assert_eq!(href_prefix("a#thumbnail"), None);
    }
}
