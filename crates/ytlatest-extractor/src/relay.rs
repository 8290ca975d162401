//! Forwarding a source byte stream through a bounded channel.

use std::{
    pin::Pin,
    task::{ready, Context, Poll},
};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use ytlatest_core::{Result, StreamChunk};
use ytlatest_innertube::ByteStream;

/// Chunks buffered between the source and the consumer.
const RELAY_BUFFER: usize = 16;

/// Live audio stream fed by a background relay task.
///
/// The stream ends when the source completes. A source failure also ends it,
/// without an error item: bytes already relayed stay valid and the consumer
/// sees a short stream. Dropping the stream aborts the relay task.
pub struct RelayStream {
    rx: mpsc::Receiver<StreamChunk>,
    task: JoinHandle<()>,
    length_hint: Option<u64>,
    finished: bool,
}

impl RelayStream {
    /// Start relaying `source` until it ends, the consumer drops, or `cancel` fires.
    pub fn spawn(source: ByteStream, length_hint: Option<u64>, cancel: CancellationToken) -> Self {
        let (tx, rx) = mpsc::channel(RELAY_BUFFER);
        let task = tokio::spawn(relay(source, tx, cancel));
        Self {
            rx,
            task,
            length_hint,
            finished: false,
        }
    }

    /// Approximate total size, when the platform reported one.
    pub const fn length_hint(&self) -> Option<u64> {
        self.length_hint
    }
}

impl Stream for RelayStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match ready!(self.rx.poll_recv(cx)) {
            Some(StreamChunk::Data(bytes)) => Poll::Ready(Some(Ok(bytes))),
            Some(StreamChunk::Error(message)) => {
                warn!("Audio stream ended early: {message}");
                self.finished = true;
                Poll::Ready(None)
            }
            Some(StreamChunk::Complete) | None => {
                self.finished = true;
                Poll::Ready(None)
            }
        }
    }
}

impl Drop for RelayStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn relay(mut source: ByteStream, tx: mpsc::Sender<StreamChunk>, cancel: CancellationToken) {
    let mut total = 0u64;
    let mut last_logged = 0u64;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Relay cancelled after {total} bytes");
                return;
            }
            next = source.next() => next,
        };

        let chunk = match next {
            Some(Ok(bytes)) if bytes.is_empty() => continue,
            Some(Ok(bytes)) => {
                total += bytes.len() as u64;
                StreamChunk::Data(bytes)
            }
            Some(Err(e)) => {
                warn!("Source failed after {total} bytes: {e}");
                if tx.send(StreamChunk::Error(e.to_string())).await.is_err() {
                    debug!("Receiver dropped before error notification");
                }
                return;
            }
            None => {
                debug!("Relay complete: {total} bytes");
                if tx.send(StreamChunk::Complete).await.is_err() {
                    debug!("Receiver dropped before completion notification");
                }
                return;
            }
        };

        if tx.send(chunk).await.is_err() {
            debug!("Receiver dropped, stopping relay after {total} bytes");
            return;
        }

        if total >= last_logged + 1024 * 1024 {
            last_logged = total;
            debug!("Relayed {} KB so far", total / 1024);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::stream;
    use std::time::Duration;
    use ytlatest_core::Error;

    fn source(items: Vec<Result<Bytes>>) -> ByteStream {
        Box::pin(stream::iter(items))
    }

    async fn collect(stream: RelayStream) -> Vec<u8> {
        stream
            .map(|item| item.unwrap())
            .collect::<Vec<_>>()
            .await
            .concat()
    }

    #[tokio::test]
    async fn test_relays_all_chunks_in_order() {
        let relay = RelayStream::spawn(
            source(vec![
                Ok(Bytes::from_static(b"ID3")),
                Ok(Bytes::new()),
                Ok(Bytes::from_static(b"abc")),
            ]),
            Some(6),
            CancellationToken::new(),
        );
        assert_eq!(relay.length_hint(), Some(6));
        assert_eq!(collect(relay).await, b"ID3abc");
    }

    #[tokio::test]
    async fn test_source_error_ends_stream_cleanly() {
        let relay = RelayStream::spawn(
            source(vec![
                Ok(Bytes::from_static(b"first")),
                Err(Error::Network("connection reset".to_string())),
                Ok(Bytes::from_static(b"never")),
            ]),
            None,
            CancellationToken::new(),
        );
        assert_eq!(collect(relay).await, b"first");
    }

    #[tokio::test]
    async fn test_cancellation_stops_relay() {
        let cancel = CancellationToken::new();
        let pending: ByteStream = Box::pin(
            stream::once(async { Ok(Bytes::from_static(b"head")) }).chain(stream::pending()),
        );
        let mut relay = RelayStream::spawn(pending, None, cancel.clone());

        assert_eq!(relay.next().await.unwrap().unwrap(), Bytes::from_static(b"head"));
        cancel.cancel();
        let end = tokio::time::timeout(Duration::from_secs(5), relay.next()).await.unwrap();
        assert!(end.is_none());
    }

    #[tokio::test]
    async fn test_drop_aborts_task() {
        let pending: ByteStream = Box::pin(stream::pending());
        let relay = RelayStream::spawn(pending, None, CancellationToken::new());
        let task = relay.task.abort_handle();
        drop(relay);
        tokio::time::timeout(Duration::from_secs(5), async {
            while !task.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }
}
