//! Chromium-backed browser driver over the DevTools protocol.

use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use chromiumoxide::{
    cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams, Browser, BrowserConfig,
    Page,
};
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use ytlatest_core::{Error, Result};

use crate::driver::{BrowserDriver, BrowserSession};

/// Desktop Chrome identity presented to the listing page.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Flags for running inside containers and other restricted environments.
const LAUNCH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--no-first-run",
    "--no-zygote",
    "--disable-gpu",
];

const HIDE_WEBDRIVER: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

/// Browser launch settings.
#[derive(Debug, Clone)]
pub struct ChromiumConfig {
    /// Chrome/Chromium binary. Auto-detected when `None`.
    pub executable: Option<PathBuf>,
    pub user_agent: String,
    pub headless: bool,
    pub launch_timeout: Duration,
}

impl Default for ChromiumConfig {
    fn default() -> Self {
        Self {
            executable: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headless: true,
            launch_timeout: Duration::from_secs(20),
        }
    }
}

/// Launches one Chromium process per session, each with a throwaway profile.
#[derive(Debug, Clone, Default)]
pub struct ChromiumDriver {
    config: ChromiumConfig,
}

impl ChromiumDriver {
    pub const fn new(config: ChromiumConfig) -> Self {
        Self { config }
    }

    fn browser_config(&self, profile: &TempDir) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(profile.path())
            .launch_timeout(self.config.launch_timeout)
            .args(LAUNCH_ARGS.iter().copied())
            .arg(format!("--user-agent={}", self.config.user_agent));

        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &self.config.executable {
            builder = builder.chrome_executable(executable);
        }

        builder.build().map_err(Error::ResolutionFailure)
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn open(&self) -> Result<Box<dyn BrowserSession>> {
        let profile = tempfile::Builder::new()
            .prefix("ytlatest-chrome-")
            .tempdir()
            .map_err(|e| Error::ResolutionFailure(format!("Failed to create browser profile: {e}")))?;
        let config = self.browser_config(&profile)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::ResolutionFailure(format!("Failed to launch browser: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler: {e}");
                }
            }
        });

        let mut session = ChromiumSession {
            browser: Some(browser),
            page: None,
            handler_task,
            _profile: profile,
        };

        match session.prepare_page().await {
            Ok(page) => {
                session.page = Some(page);
                Ok(Box::new(session))
            }
            Err(e) => {
                if let Err(close_err) = Box::new(session).close().await {
                    warn!("Failed to close browser after setup error: {close_err}");
                }
                Err(e)
            }
        }
    }
}

/// A launched browser with one page.
struct ChromiumSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    _profile: TempDir,
}

impl ChromiumSession {
    async fn prepare_page(&self) -> Result<Page> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| Error::ResolutionFailure("Browser already closed".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::ResolutionFailure(format!("Failed to open page: {e}")))?;

        page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(HIDE_WEBDRIVER))
            .await
            .map_err(|e| Error::ResolutionFailure(format!("Failed to install page script: {e}")))?;

        Ok(page)
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| Error::ResolutionFailure("No page open".to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page()?
            .goto(url)
            .await
            .map_err(|e| Error::ResolutionFailure(format!("Navigation to {url} failed: {e}")))?
            .wait_for_navigation()
            .await
            .map_err(|e| Error::ResolutionFailure(format!("Load of {url} failed: {e}")))?;
        Ok(())
    }

    async fn first_href(&mut self, selector: &str) -> Result<Option<String>> {
        let script = probe_script(selector)?;
        let href: String = self
            .page()?
            .evaluate(script.as_str())
            .await
            .map_err(|e| Error::ResolutionFailure(format!("DOM probe failed: {e}")))?
            .into_value()
            .map_err(|e| Error::ResolutionFailure(format!("Unexpected DOM probe result: {e}")))?;

        Ok(Some(href).filter(|h| !h.is_empty()))
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        self.page = None;
        let result = match self.browser.take() {
            Some(mut browser) => {
                let closed = browser.close().await;
                if let Err(e) = browser.wait().await {
                    warn!("Failed waiting for browser exit: {e}");
                }
                closed
                    .map(|_| ())
                    .map_err(|e| Error::ResolutionFailure(format!("Failed to close browser: {e}")))
            }
            None => Ok(()),
        };
        self.handler_task.abort();
        result
    }
}

/// Script returning the `href` of the first element matching `selector` in
/// document order, or `''` when nothing matches.
pub(crate) fn probe_script(selector: &str) -> Result<String> {
    let selector = serde_json::to_string(selector)?;
    Ok(format!(
        "(() => {{ const a = document.querySelector({selector}); return a ? (a.getAttribute('href') || '') : ''; }})()"
    ))
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler_task.abort();
        if let Some(mut browser) = self.browser.take() {
            // Dropped without close(), e.g. the request future was cancelled.
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    if let Some(Err(e)) = browser.kill().await {
                        warn!("Failed to kill abandoned browser: {e}");
                    }
                });
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChromiumConfig::default();
        assert!(config.headless);
        assert!(config.executable.is_none());
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_probe_script_queries_first_match() {
        let script = probe_script(crate::LISTING_SELECTOR).unwrap();
        assert_eq!(
            script,
            r#"(() => { const a = document.querySelector("a#thumbnail[href^=\"/watch\"]"); return a ? (a.getAttribute('href') || '') : ''; })()"#
        );
    }

    #[test]
    fn test_probe_script_escapes_selector() {
        let script = probe_script(r#"a[title="x"]'); alert(1); ('"#).unwrap();
        assert!(script.contains(r#"document.querySelector("a[title=\"x\"]'); alert(1); ('")"#));
    }

    #[test]
    fn test_launch_args_hide_automation() {
        assert!(LAUNCH_ARGS.contains(&"--disable-blink-features=AutomationControlled"));
        assert!(LAUNCH_ARGS.contains(&"--disable-dev-shm-usage"));
    }
}
