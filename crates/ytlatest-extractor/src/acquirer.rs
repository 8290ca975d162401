//! One acquisition pipeline, two strategies.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;
use ytlatest_core::{DeliveryMetadata, Error, FormatPolicy, Result, VideoReference};
use ytlatest_innertube::MediaRequest;

use crate::{
    relay::RelayStream,
    source::MediaSource,
    ytdlp::{ScopedAudioFile, YtDlp},
};

/// How audio is obtained. Chosen once at startup.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AcquisitionStrategy {
    /// Relay an audio-only rendition straight from the platform.
    #[default]
    StreamRelay,
    /// Extract to an MP3 file with yt-dlp, then serve the file.
    ExternalTool,
}

/// Audio ready for delivery.
pub enum AudioAsset {
    /// Live chunk stream of unknown final length.
    Stream(RelayStream),
    /// Completed file in a request-scoped directory.
    File(ScopedAudioFile),
}

/// Result of one acquisition.
pub struct Acquired {
    pub asset: AudioAsset,
    pub metadata: DeliveryMetadata,
}

enum Pipeline {
    StreamRelay {
        source: Arc<dyn MediaSource>,
        request: MediaRequest,
        policy: FormatPolicy,
    },
    ExternalTool(YtDlp),
}

/// Turns a video reference into deliverable audio.
#[derive(Clone)]
pub struct AudioAcquirer {
    pipeline: Arc<Pipeline>,
}

impl AudioAcquirer {
    /// Relay renditions from `source`, sending `request` headers with each media fetch.
    pub fn stream_relay(source: Arc<dyn MediaSource>, request: MediaRequest, policy: FormatPolicy) -> Self {
        Self {
            pipeline: Arc::new(Pipeline::StreamRelay {
                source,
                request,
                policy,
            }),
        }
    }

    /// Extract files with yt-dlp.
    pub fn external_tool(ytdlp: YtDlp) -> Self {
        Self {
            pipeline: Arc::new(Pipeline::ExternalTool(ytdlp)),
        }
    }

    pub fn strategy(&self) -> AcquisitionStrategy {
        match *self.pipeline {
            Pipeline::StreamRelay { .. } => AcquisitionStrategy::StreamRelay,
            Pipeline::ExternalTool(_) => AcquisitionStrategy::ExternalTool,
        }
    }

    /// Acquire the audio track of `reference`.
    ///
    /// The reference is re-validated before any network or process work.
    /// For stream assets, `cancel` also stops the relay task later on.
    pub async fn acquire(&self, reference: &VideoReference, cancel: &CancellationToken) -> Result<Acquired> {
        let reference = VideoReference::parse(reference.as_str())?;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        match &*self.pipeline {
            Pipeline::StreamRelay {
                source,
                request,
                policy,
            } => relay_audio(source.as_ref(), request, *policy, &reference, cancel).await,
            Pipeline::ExternalTool(ytdlp) => {
                let extracted = ytdlp.extract(&reference, cancel).await?;
                let metadata = DeliveryMetadata::from_title(
                    extracted.title.as_deref().unwrap_or_default(),
                );
                Ok(Acquired {
                    asset: AudioAsset::File(extracted.file),
                    metadata,
                })
            }
        }
    }
}

async fn relay_audio(
    source: &dyn MediaSource,
    request: &MediaRequest,
    policy: FormatPolicy,
    reference: &VideoReference,
    cancel: &CancellationToken,
) -> Result<Acquired> {
    let info = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(Error::Cancelled),
        info = source.video_info(reference) => info?,
    };

    let metadata = DeliveryMetadata::from_title(&info.title);
    if let Some(seconds) = info.length_seconds {
        info!("{} is {}m{:02}s long", reference.video_id(), seconds / 60, seconds % 60);
    }

    let format = policy.select(&info.formats)?;
    info!(
        "Relaying itag {} ({}, {} bps)",
        format.itag,
        format.mime_type,
        format.bitrate.unwrap_or(0)
    );

    let bytes = source.open_stream(format, request)?;
    let stream = RelayStream::spawn(bytes, format.content_length, cancel.clone());

    Ok(Acquired {
        asset: AudioAsset::Stream(stream),
        metadata,
    })
}
