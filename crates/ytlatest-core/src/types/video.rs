//! Video references and metadata.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::channel::PLATFORM_ORIGIN;
use super::format::FormatDescriptor;
use crate::{Error, Result};

/// Hosts accepted as video URLs.
const VALID_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "gaming.youtube.com",
];

/// Short-link host whose first path segment is the video id.
const SHORT_HOST: &str = "youtu.be";

/// Path prefixes whose next segment is the video id.
const ID_PATH_PREFIXES: &[&str] = &["shorts", "embed", "v", "live"];

/// A fully-qualified URL naming exactly one video.
///
/// Only constructed through [`VideoReference::parse`] and the helpers built on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoReference {
    url: Url,
    video_id: String,
}

impl VideoReference {
    /// Parse and validate a video URL.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim())
            .map_err(|e| Error::InvalidReference(format!("{raw}: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidReference(format!(
                "{raw}: unsupported scheme {}",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidReference(format!("{raw}: missing host")))?
            .to_ascii_lowercase();

        let candidate = if host == SHORT_HOST {
            url.path_segments().and_then(|mut s| s.next()).map(str::to_string)
        } else if VALID_HOSTS.contains(&host.as_str()) {
            id_from_platform_url(&url)
        } else {
            return Err(Error::InvalidReference(format!(
                "{raw}: not a video host ({host})"
            )));
        };

        let video_id = candidate
            .filter(|id| is_valid_video_id(id))
            .ok_or_else(|| Error::InvalidReference(format!("{raw}: no valid video id")))?;

        Ok(Self { url, video_id })
    }

    /// Resolve a listing-page `href` (usually `/watch?v=...`) against the platform origin.
    pub fn from_href(href: &str) -> Result<Self> {
        let base = Url::parse(PLATFORM_ORIGIN)
            .map_err(|e| Error::Internal(format!("Invalid platform origin: {e}")))?;
        let absolute = base
            .join(href)
            .map_err(|e| Error::InvalidReference(format!("{href}: {e}")))?;
        Self::parse(absolute.as_str())
    }

    /// Build the canonical watch URL for a bare video id.
    pub fn from_video_id(video_id: &str) -> Result<Self> {
        Self::parse(&format!("{PLATFORM_ORIGIN}/watch?v={video_id}"))
    }

    pub const fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Canonical `https://www.youtube.com/watch?v=<id>` form, without extra query params.
    pub fn canonical_url(&self) -> String {
        format!("{PLATFORM_ORIGIN}/watch?v={}", self.video_id)
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

fn id_from_platform_url(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    match segments.next()? {
        "watch" => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
        prefix if ID_PATH_PREFIXES.contains(&prefix) => segments.next().map(str::to_string),
        _ => None,
    }
}

/// Video ids are 11 characters of URL-safe base64.
fn is_valid_video_id(id: &str) -> bool {
    id.len() == 11
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Metadata the platform reports for one video.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoInfo {
    pub video_id: String,
    pub title: String,
    pub author: Option<String>,
    /// Length in seconds (if known).
    pub length_seconds: Option<u64>,
    /// Available renditions, in the order the platform listed them.
    pub formats: Vec<FormatDescriptor>,
}

impl VideoInfo {
    pub fn new(video_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_formats(mut self, formats: Vec<FormatDescriptor>) -> Self {
        self.formats = formats;
        self
    }
}
