//! Error types for ytlatest.

use thiserror::Error;

/// Result type alias using ytlatest's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ytlatest.
#[derive(Error, Debug)]
pub enum Error {
    // Caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid video reference: {0}")]
    InvalidReference(String),

    // Nothing to deliver
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No audio-only format available for {0}")]
    NoAudioFormat(String),

    #[error("Content not available: {0}")]
    ContentNotAvailable(String),

    // Pipeline stage failures
    #[error("Failed to resolve latest video: {0}")]
    ResolutionFailure(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailure(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] HttpError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("InnerTube API error: {0}")]
    InnerTube(String),

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// HTTP-specific errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed with status {status}: {message}")]
    StatusError { status: u16, message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Coarse classification used to pick the response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller sent something unusable (400).
    InvalidInput,
    /// Nothing matching the request exists (404).
    NotFound,
    /// A pipeline stage failed (500).
    Failure,
    /// The caller went away; there is nobody to answer.
    Cancelled,
}

impl Error {
    /// Classify this error for the HTTP layer.
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidInput(_) | Self::InvalidReference(_) => ErrorClass::InvalidInput,
            Self::NotFound(_) | Self::NoAudioFormat(_) | Self::ContentNotAvailable(_) => {
                ErrorClass::NotFound
            }
            Self::Cancelled => ErrorClass::Cancelled,
            Self::ResolutionFailure(_)
            | Self::ExtractionFailure(_)
            | Self::Http(_)
            | Self::Network(_)
            | Self::InnerTube(_)
            | Self::ParseError(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Internal(_) => ErrorClass::Failure,
        }
    }

    /// Returns true if this error came from the caller's input.
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self.class(), ErrorClass::InvalidInput)
    }

    /// Returns true if this error is a cancellation.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_class() {
        assert_eq!(
            Error::InvalidInput("empty".into()).class(),
            ErrorClass::InvalidInput
        );
        assert_eq!(
            Error::InvalidReference("bad".into()).class(),
            ErrorClass::InvalidInput
        );
        assert_eq!(Error::NotFound("x".into()).class(), ErrorClass::NotFound);
        assert_eq!(
            Error::NoAudioFormat("x".into()).class(),
            ErrorClass::NotFound
        );
        assert_eq!(
            Error::ExtractionFailure("exit 1".into()).class(),
            ErrorClass::Failure
        );
        assert_eq!(
            Error::Http(HttpError::Timeout).class(),
            ErrorClass::Failure
        );
        assert!(Error::Cancelled.is_cancelled());
    }

    #[test]
    fn test_error_display() {
        let err = Error::ResolutionFailure("navigation failed".into());
        assert_eq!(
            err.to_string(),
            "Failed to resolve latest video: navigation failed"
        );
    }
}
