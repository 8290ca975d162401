//! Channel handle supplied by the caller.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Platform origin used to build listing URLs and resolve relative links.
pub const PLATFORM_ORIGIN: &str = "https://www.youtube.com";

/// An opaque, non-empty channel identifier such as `@somechannel` or `somechannel`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelHandle(String);

impl ChannelHandle {
    /// Parse a handle, trimming whitespace and one leading `@`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let handle = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
        if handle.is_empty() {
            return Err(Error::InvalidInput(
                "channelYouTube must be a non-empty channel handle".to_string(),
            ));
        }
        Ok(Self(handle.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL of the channel's video listing page, newest upload first.
    pub fn listing_url(&self) -> Result<Url> {
        let mut url = Url::parse(PLATFORM_ORIGIN)
            .map_err(|e| Error::Internal(format!("Invalid platform origin: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| Error::Internal("Platform origin cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&format!("@{}", self.0))
            .push("videos");
        Ok(url)
    }
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl TryFrom<String> for ChannelHandle {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ChannelHandle> for String {
    fn from(handle: ChannelHandle) -> Self {
        handle.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_at_and_whitespace() {
        let handle = ChannelHandle::parse("  @SomeChannel ").unwrap();
        assert_eq!(handle.as_str(), "SomeChannel");
        assert_eq!(handle.to_string(), "@SomeChannel");
    }

    #[test]
    fn test_parse_rejects_empty() {
        for raw in ["", "   ", "@", " @ "] {
            assert!(matches!(
                ChannelHandle::parse(raw),
                Err(Error::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_listing_url() {
        let handle = ChannelHandle::parse("lofigirl").unwrap();
        assert_eq!(
            handle.listing_url().unwrap().as_str(),
            "https://www.youtube.com/@lofigirl/videos"
        );
    }

    #[test]
    fn test_listing_url_encodes_path_characters() {
        let handle = ChannelHandle::parse("a/b c").unwrap();
        assert_eq!(
            handle.listing_url().unwrap().as_str(),
            "https://www.youtube.com/@a%2Fb%20c/videos"
        );
    }
}
