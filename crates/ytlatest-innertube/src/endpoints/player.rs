//! Player endpoint: video metadata and available renditions.

use tracing::debug;
use ytlatest_core::{Error, FormatDescriptor, Result, VideoInfo};

use crate::{
    types::{Format, InnerTubeRequest, PlayerPayload, RawPlayerResponse},
    InnerTubeClient,
};

impl InnerTubeClient {
    /// Get title, length and renditions for a video.
    ///
    /// Renditions keep the platform's order: muxed `formats` first, then
    /// `adaptiveFormats`. Renditions that only offer a ciphered URL are skipped.
    pub async fn video_info(&self, video_id: &str) -> Result<VideoInfo> {
        let response = self.player_response(video_id).await?;
        parse_video_info(video_id, response)
    }

    async fn player_response(&self, video_id: &str) -> Result<RawPlayerResponse> {
        let payload = PlayerPayload {
            video_id: video_id.to_string(),
            content_check_ok: Some(true),
            racy_check_ok: Some(true),
        };

        let request = InnerTubeRequest::new(self.context.clone(), payload);

        self.post("player", &request).await.map_err(|e| match e {
            Error::ParseError(_) => e,
            other => Error::InnerTube(format!("Player request failed: {other}")),
        })
    }
}

pub(crate) fn parse_video_info(video_id: &str, response: RawPlayerResponse) -> Result<VideoInfo> {
    if let Some(status) = &response.playability_status {
        if status.status != "OK" {
            let reason = status.reason.as_deref().unwrap_or("Unknown error");
            return Err(Error::ContentNotAvailable(format!("{video_id}: {reason}")));
        }
    }

    let details = response
        .video_details
        .ok_or_else(|| Error::ParseError(format!("{video_id}: missing videoDetails")))?;

    let streaming_data = response
        .streaming_data
        .ok_or_else(|| Error::ContentNotAvailable(format!("{video_id}: no streaming data")))?;

    let raw_formats: Vec<Format> = streaming_data
        .formats
        .into_iter()
        .flatten()
        .chain(streaming_data.adaptive_formats.into_iter().flatten())
        .collect();

    let ciphered = raw_formats.iter().filter(|f| f.is_ciphered()).count();
    if ciphered > 0 {
        debug!("Skipped {ciphered} ciphered renditions for {video_id}");
    }
    let formats: Vec<FormatDescriptor> = raw_formats.iter().filter_map(parse_format).collect();

    Ok(VideoInfo {
        video_id: details.video_id,
        title: details.title,
        author: details.author,
        length_seconds: details.length_seconds.and_then(|s| s.parse().ok()),
        formats,
    })
}

/// `None` for renditions without a direct URL.
fn parse_format(format: &Format) -> Option<FormatDescriptor> {
    if format.is_ciphered() {
        return None;
    }
    let url = format.url.clone()?;

    let mut descriptor = FormatDescriptor::new(format.itag, format.mime_type.clone(), url);
    descriptor.bitrate = format.bitrate;
    descriptor.audio_quality = format.audio_quality.clone();
    descriptor.content_length = format.content_length_u64();

    Some(descriptor)
}
