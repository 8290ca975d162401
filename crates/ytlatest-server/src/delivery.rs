//! Turning acquired audio into an HTTP response.

use axum::{
    body::Body,
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use tracing::info;
use ytlatest_core::{DeliveryMetadata, Error, Result};
use ytlatest_extractor::{Acquired, AudioAsset};

/// Carries the sanitized video title.
pub static X_VIDEO_TITLE: HeaderName = HeaderName::from_static("x-video-title");

/// Build the download response. The body owns the asset, so scratch files
/// are removed once the transfer finishes or the client goes away.
pub async fn deliver(acquired: Acquired) -> Result<Response> {
    let Acquired { asset, metadata } = acquired;
    let mut headers = attachment_headers(&metadata)?;

    let body = match asset {
        AudioAsset::Stream(stream) => {
            match stream.length_hint() {
                Some(length) => info!("Streaming \"{}\" (~{length} bytes)", metadata.title()),
                None => info!("Streaming \"{}\"", metadata.title()),
            }
            Body::from_stream(stream)
        }
        AudioAsset::File(file) => {
            info!("Sending \"{}\" ({} bytes)", metadata.title(), file.size());
            headers.insert(CONTENT_LENGTH, HeaderValue::from(file.size()));
            Body::from_stream(file.into_stream().await?)
        }
    };

    Ok((StatusCode::OK, headers, body).into_response())
}

fn attachment_headers(metadata: &DeliveryMetadata) -> Result<HeaderMap> {
    let header = |value: String| {
        HeaderValue::try_from(value).map_err(|e| Error::Internal(format!("Invalid header value: {e}")))
    };

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(metadata.mime_type()));
    headers.insert(CONTENT_DISPOSITION, header(metadata.content_disposition())?);
    headers.insert(X_VIDEO_TITLE.clone(), header(metadata.title().to_string())?);
    Ok(headers)
}
