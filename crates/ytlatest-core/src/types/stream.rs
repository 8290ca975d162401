//! Chunks flowing through a relayed audio stream.

use bytes::Bytes;

/// One message from a relay task to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// Audio bytes, in order.
    Data(Bytes),
    /// The source finished normally.
    Complete,
    /// The source failed; no more data follows.
    Error(String),
}
