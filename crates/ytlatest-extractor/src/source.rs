//! Platform metadata and media access.

use async_trait::async_trait;
use ytlatest_core::{FormatDescriptor, Result, VideoInfo, VideoReference};
use ytlatest_innertube::{ByteStream, InnerTubeClient, MediaRequest};

/// Where stream-relay acquisition gets its metadata and bytes from.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Title, length and renditions in upstream order.
    async fn video_info(&self, reference: &VideoReference) -> Result<VideoInfo>;

    /// Open a forward-only byte stream for one rendition.
    fn open_stream(&self, format: &FormatDescriptor, request: &MediaRequest) -> Result<ByteStream>;
}

#[async_trait]
impl MediaSource for InnerTubeClient {
    async fn video_info(&self, reference: &VideoReference) -> Result<VideoInfo> {
        Self::video_info(self, reference.video_id()).await
    }

    fn open_stream(&self, format: &FormatDescriptor, request: &MediaRequest) -> Result<ByteStream> {
        self.open_media(format, request)
    }
}
