//! InnerTube-specific request and response structures.

use serde::{Deserialize, Serialize};

/// Request body for `InnerTube` endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct InnerTubeRequest<T> {
    pub context: crate::ClientContext,
    #[serde(flatten)]
    pub payload: T,
}

impl<T> InnerTubeRequest<T> {
    pub const fn new(context: crate::ClientContext, payload: T) -> Self {
        Self { context, payload }
    }
}

/// Player request payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPayload {
    pub video_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_check_ok: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub racy_check_ok: Option<bool>,
}

/// Raw `InnerTube` response for player.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlayerResponse {
    pub playability_status: Option<PlayabilityStatus>,
    pub streaming_data: Option<StreamingData>,
    pub video_details: Option<VideoDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayabilityStatus {
    pub status: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingData {
    pub formats: Option<Vec<Format>>,
    pub adaptive_formats: Option<Vec<Format>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Format {
    pub itag: u32,
    pub url: Option<String>,
    pub signature_cipher: Option<String>,
    pub cipher: Option<String>,
    pub mime_type: String,
    pub bitrate: Option<u32>,
    pub content_length: Option<String>,
    pub audio_quality: Option<String>,
}

impl Format {
    /// Get the content length as u64.
    pub fn content_length_u64(&self) -> Option<u64> {
        self.content_length.as_ref()?.parse().ok()
    }

    /// Whether the URL is only available through a signature cipher.
    pub const fn is_ciphered(&self) -> bool {
        self.url.is_none() && (self.signature_cipher.is_some() || self.cipher.is_some())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    pub length_seconds: Option<String>,
    pub author: Option<String>,
}
