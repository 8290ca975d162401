//! `InnerTube` endpoint implementations.

pub mod player;
