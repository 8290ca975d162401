//! Scripted media source for tests.
//!
//! Serves fixed metadata and body chunks, optionally failing after a number of
//! chunks, and records which renditions were opened.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use parking_lot::Mutex;
use ytlatest_core::{Error, FormatDescriptor, Result, VideoInfo, VideoReference};
use ytlatest_innertube::{ByteStream, MediaRequest};

use crate::source::MediaSource;

type ErrorFactory = Arc<dyn Fn() -> Error + Send + Sync>;

/// In-memory media source with fixed metadata and body chunks.
#[derive(Clone)]
pub struct MockMediaSource {
    info: Arc<VideoInfo>,
    chunks: Arc<Vec<Bytes>>,
    fail_after: Option<usize>,
    info_error: Option<ErrorFactory>,
    info_requests: Arc<AtomicUsize>,
    opened: Arc<Mutex<Vec<u32>>>,
}

impl MockMediaSource {
    pub fn new(info: VideoInfo, chunks: Vec<Bytes>) -> Self {
        Self {
            info: Arc::new(info),
            chunks: Arc::new(chunks),
            fail_after: None,
            info_error: None,
            info_requests: Arc::new(AtomicUsize::new(0)),
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Emit the first `chunks` chunks, then fail the stream.
    #[must_use]
    pub const fn failing_after(mut self, chunks: usize) -> Self {
        self.fail_after = Some(chunks);
        self
    }

    /// Fail metadata lookups with the error built by `error`.
    #[must_use]
    pub fn failing_info(mut self, error: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        self.info_error = Some(Arc::new(error));
        self
    }

    pub fn info_requests(&self) -> usize {
        self.info_requests.load(Ordering::SeqCst)
    }

    /// Itags of every stream opened so far.
    pub fn opened_itags(&self) -> Vec<u32> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl MediaSource for MockMediaSource {
    async fn video_info(&self, _reference: &VideoReference) -> Result<VideoInfo> {
        self.info_requests.fetch_add(1, Ordering::SeqCst);
        match &self.info_error {
            Some(error) => Err(error()),
            None => Ok(VideoInfo::clone(&self.info)),
        }
    }

    fn open_stream(&self, format: &FormatDescriptor, _request: &MediaRequest) -> Result<ByteStream> {
        self.opened.lock().push(format.itag);

        let items: Vec<Result<Bytes>> = match self.fail_after {
            Some(n) => self
                .chunks
                .iter()
                .take(n)
                .cloned()
                .map(Ok)
                .chain(std::iter::once(Err(Error::Network(
                    "connection reset by peer".to_string(),
                ))))
                .collect(),
            None => self.chunks.iter().cloned().map(Ok).collect(),
        };
        Ok(Box::pin(stream::iter(items)))
    }
}
