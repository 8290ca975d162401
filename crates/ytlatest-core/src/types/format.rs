//! Renditions and audio format selection.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What a rendition carries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    AudioOnly,
    AudioVideo,
    VideoOnly,
}

impl MediaKind {
    /// Classify from a MIME type such as `audio/webm; codecs="opus"`.
    ///
    /// A `video/*` type listing more than one codec is muxed audio+video.
    pub fn from_mime(mime: &str) -> Self {
        let mime_lower = mime.to_lowercase();
        if mime_lower.starts_with("audio/") {
            return Self::AudioOnly;
        }

        let codec_count = mime_lower
            .split_once("codecs=")
            .map_or(1, |(_, codecs)| codecs.split(',').count());

        if codec_count > 1 {
            Self::AudioVideo
        } else {
            Self::VideoOnly
        }
    }

    pub const fn has_audio(&self) -> bool {
        matches!(self, Self::AudioOnly | Self::AudioVideo)
    }
}

/// Audio codec/container.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// Opus codec.
    Opus,
    /// AAC codec.
    Aac,
    /// MP3 codec.
    Mp3,
    /// FLAC codec (lossless).
    Flac,
    /// Vorbis codec.
    Vorbis,
    /// `WebM` container with audio.
    WebM,
    /// MP4/M4A container.
    M4a,
    /// Unknown format.
    #[default]
    Unknown,
}

impl AudioFormat {
    /// Parse from MIME type or format string.
    pub fn from_mime(mime: &str) -> Self {
        let mime_lower = mime.to_lowercase();

        if mime_lower.contains("opus") {
            Self::Opus
        } else if mime_lower.contains("aac") || mime_lower.contains("mp4a") {
            Self::Aac
        } else if mime_lower.contains("mp3") || mime_lower.contains("mpeg") {
            Self::Mp3
        } else if mime_lower.contains("flac") {
            Self::Flac
        } else if mime_lower.contains("vorbis") {
            Self::Vorbis
        } else if mime_lower.contains("webm") {
            Self::WebM
        } else if mime_lower.contains("m4a") {
            Self::M4a
        } else {
            Self::Unknown
        }
    }

    /// Get the file extension for this format.
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Opus => "opus",
            Self::Aac | Self::M4a => "m4a",
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Vorbis => "ogg",
            Self::WebM => "webm",
            Self::Unknown => "audio",
        }
    }
}

/// One encoded rendition the platform exposes for a video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Platform format identifier.
    pub itag: u32,
    pub kind: MediaKind,
    pub mime_type: String,
    /// Audio codec/container, parsed from the MIME type.
    pub codec: AudioFormat,
    /// Bitrate in bits per second (if known).
    pub bitrate: Option<u32>,
    /// Platform quality hint, e.g. `AUDIO_QUALITY_MEDIUM`.
    pub audio_quality: Option<String>,
    /// Content length in bytes (if known).
    pub content_length: Option<u64>,
    /// Direct media URL. Empty when the platform only offered a ciphered URL.
    pub url: String,
}

impl FormatDescriptor {
    pub fn new(itag: u32, mime_type: impl Into<String>, url: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        Self {
            itag,
            kind: MediaKind::from_mime(&mime_type),
            codec: AudioFormat::from_mime(&mime_type),
            mime_type,
            bitrate: None,
            audio_quality: None,
            content_length: None,
            url: url.into(),
        }
    }

    pub const fn with_bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    pub const fn with_content_length(mut self, content_length: u64) -> Self {
        self.content_length = Some(content_length);
        self
    }

    pub const fn is_audio_only(&self) -> bool {
        matches!(self.kind, MediaKind::AudioOnly)
    }
}

/// How the pipeline picks among audio-only renditions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FormatPolicy {
    /// First audio-only entry in upstream order.
    #[default]
    FirstListed,
    /// Audio-only entry with the highest bitrate.
    HighestBitrate,
}

impl FormatPolicy {
    pub fn select(self, formats: &[FormatDescriptor]) -> Result<&FormatDescriptor> {
        match self {
            Self::FirstListed => select_audio_format(formats),
            Self::HighestBitrate => select_best_audio_format(formats),
        }
    }
}

/// Pick the first audio-only rendition, in the order the platform returned them.
///
/// This is "first listed", not "best": the list is not sorted by bitrate or
/// codec. Callers who want the best quality should use
/// [`select_best_audio_format`] or sort beforehand.
///
/// Renditions offered only through a signature cipher never reach this list,
/// so when the platform's first audio rendition is ciphered the first
/// directly playable one is chosen instead.
pub fn select_audio_format(formats: &[FormatDescriptor]) -> Result<&FormatDescriptor> {
    formats
        .iter()
        .find(|f| f.is_audio_only())
        .ok_or_else(|| no_audio_format(formats))
}

/// Pick the audio-only rendition with the highest bitrate; ties keep upstream order.
pub fn select_best_audio_format(formats: &[FormatDescriptor]) -> Result<&FormatDescriptor> {
    formats
        .iter()
        .filter(|f| f.is_audio_only())
        .rev()
        .max_by_key(|f| f.bitrate.unwrap_or(0))
        .ok_or_else(|| no_audio_format(formats))
}

fn no_audio_format(formats: &[FormatDescriptor]) -> Error {
    Error::NoAudioFormat(format!("none of {} renditions is audio-only", formats.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(itag: u32) -> FormatDescriptor {
        FormatDescriptor::new(itag, "video/mp4; codecs=\"avc1.640028\"", "v")
    }

    fn audio(itag: u32, bitrate: u32) -> FormatDescriptor {
        FormatDescriptor::new(itag, "audio/webm; codecs=\"opus\"", "a").with_bitrate(bitrate)
    }

    #[test]
    fn test_media_kind_from_mime() {
        assert_eq!(
            MediaKind::from_mime("audio/mp4; codecs=\"mp4a.40.2\""),
            MediaKind::AudioOnly
        );
        assert_eq!(
            MediaKind::from_mime("video/mp4; codecs=\"avc1.42001E, mp4a.40.2\""),
            MediaKind::AudioVideo
        );
        assert_eq!(
            MediaKind::from_mime("video/webm; codecs=\"vp9\""),
            MediaKind::VideoOnly
        );
    }

    #[test]
    fn test_audio_format_from_mime() {
        assert_eq!(
            AudioFormat::from_mime("audio/webm; codecs=\"opus\""),
            AudioFormat::Opus
        );
        assert_eq!(
            AudioFormat::from_mime("audio/mp4; codecs=\"mp4a.40.2\""),
            AudioFormat::Aac
        );
        assert_eq!(AudioFormat::from_mime("audio/mpeg"), AudioFormat::Mp3);
    }

    #[test]
    fn test_select_first_listed_audio() {
        // Bitrates deliberately favour B: selection must still return A.
        let formats = vec![video(137), audio(1, 48_000), audio(2, 160_000)];
        let chosen = select_audio_format(&formats).unwrap();
        assert_eq!(chosen.itag, 1);
    }

    #[test]
    fn test_select_fails_without_audio() {
        let formats = vec![video(137), video(248)];
        assert!(matches!(
            select_audio_format(&formats),
            Err(Error::NoAudioFormat(_))
        ));
        assert!(matches!(
            select_audio_format(&[]),
            Err(Error::NoAudioFormat(_))
        ));
    }

    #[test]
    fn test_select_best_by_bitrate() {
        let formats = vec![video(137), audio(1, 48_000), audio(2, 160_000), audio(3, 160_000)];
        assert_eq!(select_best_audio_format(&formats).unwrap().itag, 2);
        assert_eq!(
            FormatPolicy::HighestBitrate.select(&formats).unwrap().itag,
            2
        );
        assert_eq!(FormatPolicy::FirstListed.select(&formats).unwrap().itag, 1);
    }

    #[test]
    fn test_muxed_formats_are_not_audio_only() {
        let muxed = FormatDescriptor::new(18, "video/mp4; codecs=\"avc1.42001E, mp4a.40.2\"", "m");
        assert!(muxed.kind.has_audio());
        assert!(select_audio_format(&[muxed]).is_err());
    }
}
