//! `InnerTube` API client implementation.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use ytlatest_core::{Error, HttpError, Result};

use crate::context::ClientContext;

const BASE_URL: &str = "https://www.youtube.com/youtubei/v1";
const ORIGIN: &str = "https://www.youtube.com";
const REFERER: &str = "https://www.youtube.com/";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connect timeout for media downloads. Reads are bounded by the transport only.
const MEDIA_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// `YouTube` `InnerTube` API client.
///
/// Requests are made once: there is no response cache and no retry loop.
#[derive(Clone)]
pub struct InnerTubeClient {
    /// HTTP client for API calls, with `InnerTube` headers preset.
    http: reqwest::Client,
    /// HTTP client for media downloads, headers supplied per request.
    pub(crate) media: reqwest::Client,
    /// Client context for requests.
    pub(crate) context: ClientContext,
    base_url: String,
}

impl InnerTubeClient {
    /// Create a new `InnerTube` client with default settings.
    pub fn new() -> Result<Self> {
        Self::with_context(ClientContext::default())
    }

    /// Create a new `InnerTube` client with a specific context.
    pub fn with_context(context: ClientContext) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("Origin", HeaderValue::from_static(ORIGIN));
        headers.insert("Referer", HeaderValue::from_static(REFERER));
        headers.insert(
            "X-YouTube-Client-Name",
            HeaderValue::from_str(&context.client.client_id().to_string())
                .map_err(|e| Error::Internal(format!("Invalid client id header: {e}")))?,
        );
        headers.insert(
            "X-YouTube-Client-Version",
            HeaderValue::from_str(&context.client.client_version)
                .map_err(|e| Error::Internal(format!("Invalid client version header: {e}")))?,
        );

        if let Some(ua) = &context.client.user_agent {
            headers.insert(
                USER_AGENT,
                HeaderValue::from_str(ua)
                    .map_err(|e| Error::Internal(format!("Invalid user agent: {e}")))?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(DEFAULT_TIMEOUT)
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))?;

        let media = reqwest::Client::builder()
            .connect_timeout(MEDIA_CONNECT_TIMEOUT)
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create media client: {e}")))?;

        Ok(Self {
            http,
            media,
            context,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point API calls at a different base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub const fn context(&self) -> &ClientContext {
        &self.context
    }

    /// Make a POST request to an `InnerTube` endpoint.
    pub(crate) async fn post<T, R>(&self, endpoint: &str, body: &T) -> Result<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let url = format!(
            "{}/{endpoint}?key={}&prettyPrint=false",
            self.base_url,
            self.context.client.api_key()
        );
        let body_bytes = serde_json::to_vec(body)?;

        debug!("POST {endpoint}");
        let response_bytes = self.do_request(&url, body_bytes).await?;

        serde_json::from_slice(&response_bytes)
            .map_err(|e| Error::ParseError(format!("Failed to parse response: {e}")))
    }

    async fn do_request(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>> {
        let response = self
            .http
            .post(url)
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Http(HttpError::StatusError {
                status: status.as_u16(),
                message,
            }));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| Error::Network(format!("Failed to read response body: {e}")))
    }
}

/// Translate a transport error into the crate error taxonomy.
pub(crate) fn map_reqwest_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Http(HttpError::Timeout)
    } else if e.is_connect() {
        Error::Http(HttpError::ConnectionFailed(e.to_string()))
    } else if e.is_builder() {
        Error::Http(HttpError::InvalidUrl(e.to_string()))
    } else {
        Error::Network(e.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = InnerTubeClient::new().unwrap();
        assert_eq!(client.context().client.client_name, "IOS");
        assert_eq!(client.base_url, BASE_URL);
    }

    #[test]
    fn test_with_base_url() {
        let client = InnerTubeClient::with_context(ClientContext::web())
            .unwrap()
            .with_base_url("http://127.0.0.1:9/youtubei/v1");
        assert_eq!(client.base_url, "http://127.0.0.1:9/youtubei/v1");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_network_failure() {
        let client = InnerTubeClient::new()
            .unwrap()
            .with_base_url("http://127.0.0.1:9/youtubei/v1");
        let result: Result<serde_json::Value> =
            client.post("player", &serde_json::json!({})).await;
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            Error::Http(HttpError::ConnectionFailed(_) | HttpError::Timeout) | Error::Network(_)
        ));
    }
}
