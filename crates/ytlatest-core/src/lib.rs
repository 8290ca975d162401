//! # ytlatest-core
//!
//! Core types, format selection, and error handling for ytlatest: the service
//! that finds a channel's newest upload and hands back its audio track.

pub mod error;
pub mod types;

pub use error::{Error, ErrorClass, HttpError, Result};
pub use types::*;
