//! Session cookies exported from a browser as JSON.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};
use ytlatest_core::Result;

/// One exported cookie. Extra fields such as `domain` or `expires` are ignored.
#[derive(Debug, Deserialize)]
struct CookieEntry {
    name: String,
    value: String,
}

/// Join a JSON cookie export (`[{"name": .., "value": ..}, ..]`) into a
/// `Cookie` header value. An empty export yields `None`.
pub fn parse_cookie_header(json: &str) -> Result<Option<String>> {
    let entries: Vec<CookieEntry> = serde_json::from_str(json)?;
    let header = entries
        .iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ");
    Ok(Some(header).filter(|h| !h.is_empty()))
}

/// Load the cookie header from `path`.
///
/// A missing or malformed file is logged and treated as "no cookies".
pub fn load_cookie_header(path: &Path) -> Option<String> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to read cookie file {}: {e}", path.display());
            return None;
        }
    };

    match parse_cookie_header(&json) {
        Ok(header) => {
            if header.is_some() {
                info!("Loaded cookies from {}", path.display());
            }
            header
        }
        Err(e) => {
            error!("Failed to parse cookie file {}: {e}", path.display());
            None
        }
    }
}
