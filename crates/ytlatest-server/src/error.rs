//! Mapping pipeline errors to HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error, warn};
use ytlatest_core::{Error, ErrorClass};

/// Status for a client that went away before the response was ready.
const CLIENT_CLOSED_REQUEST: u16 = 499;

/// An error response with a `{ "error": "..." }` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err.class() {
            ErrorClass::InvalidInput => {
                debug!("Rejected request: {err}");
                StatusCode::BAD_REQUEST
            }
            ErrorClass::NotFound => {
                warn!("Nothing to deliver: {err}");
                StatusCode::NOT_FOUND
            }
            ErrorClass::Failure => {
                error!("Request failed: {err}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ErrorClass::Cancelled => {
                debug!("Request cancelled");
                StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::BAD_REQUEST)
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {rejection}");
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::InvalidInput("empty".into()), StatusCode::BAD_REQUEST),
            (Error::InvalidReference("bad".into()), StatusCode::BAD_REQUEST),
            (Error::NotFound("none".into()), StatusCode::NOT_FOUND),
            (Error::NoAudioFormat("none".into()), StatusCode::NOT_FOUND),
            (Error::ContentNotAvailable("private".into()), StatusCode::NOT_FOUND),
            (Error::ResolutionFailure("crash".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::ExtractionFailure("exit 1".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Network("reset".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
        assert_eq!(ApiError::from(Error::Cancelled).status().as_u16(), 499);
    }
}
