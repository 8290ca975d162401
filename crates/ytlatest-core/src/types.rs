//! Core domain types for ytlatest.

pub mod channel;
pub mod delivery;
pub mod format;
pub mod stream;
pub mod video;

pub use channel::ChannelHandle;
pub use delivery::{sanitize_title, DeliveryMetadata};
pub use format::{
    select_audio_format, select_best_audio_format, AudioFormat, FormatDescriptor, FormatPolicy,
    MediaKind,
};
pub use stream::StreamChunk;
pub use video::{VideoInfo, VideoReference};
