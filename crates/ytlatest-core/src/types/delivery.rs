//! Metadata attached to a delivered audio file.

use serde::{Deserialize, Serialize};

/// MIME type announced for every delivered file.
pub const AUDIO_MIME_TYPE: &str = "audio/mpeg";

/// Name used when a title sanitizes down to nothing.
const FALLBACK_TITLE: &str = "audio";

/// Display title and download name for one response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryMetadata {
    title: String,
}

impl DeliveryMetadata {
    /// Build metadata from a raw video title.
    pub fn from_title(raw_title: &str) -> Self {
        let sanitized = sanitize_title(raw_title);
        let title = if sanitized.trim().is_empty() {
            FALLBACK_TITLE.to_string()
        } else {
            sanitized
        };
        Self { title }
    }

    /// Sanitized title, safe for headers and filenames.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn filename(&self) -> String {
        format!("{}.mp3", self.title)
    }

    /// `Content-Disposition` value for an attachment download.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename())
    }

    pub const fn mime_type(&self) -> &'static str {
        AUDIO_MIME_TYPE
    }
}

/// Keep only ASCII letters, digits and whitespace.
///
/// Whitespace is limited to space and tab so the result is always a valid
/// header value.
pub fn sanitize_title(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '\t')
        .collect()
}
