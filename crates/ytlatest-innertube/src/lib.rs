//! # ytlatest-innertube
//!
//! `YouTube` `InnerTube` client for ytlatest.
//!
//! Only the `player` endpoint is used: it reports a video's title, length and
//! the renditions available for it. Media bytes are then fetched from the
//! rendition URLs in ranged chunks.

pub mod client;
pub mod context;
pub mod endpoints;
pub mod media;
pub mod types;

pub use client::InnerTubeClient;
pub use context::ClientContext;
pub use media::{ByteStream, MediaRequest};
