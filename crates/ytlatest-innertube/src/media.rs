//! Media downloads from rendition URLs.
//!
//! The platform throttles long unranged reads, so when the content length is
//! known the rendition is fetched as a sequence of `range=` requests. Each
//! range is requested only when the previous one has been consumed, so a slow
//! reader never causes more than one chunk to be in flight.

use std::pin::Pin;

use bytes::Bytes;
use futures::{stream, Stream, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, USER_AGENT};
use tracing::debug;
use url::Url;
use ytlatest_core::{Error, FormatDescriptor, HttpError, Result};

use crate::client::map_reqwest_error;
use crate::InnerTubeClient;

/// Default range size: 10 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 10 * 1024 * 1024;

/// Forward-only stream of media bytes.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Per-download request options.
#[derive(Debug, Clone)]
pub struct MediaRequest {
    /// Client identity string sent as `User-Agent`.
    pub user_agent: Option<String>,
    /// Session cookies, already joined as `name=value; ...`.
    pub cookie: Option<String>,
    /// Bytes per ranged request.
    pub chunk_size: u64,
}

impl Default for MediaRequest {
    fn default() -> Self {
        Self {
            user_agent: None,
            cookie: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl MediaRequest {
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(ua) = &self.user_agent {
            headers.insert(
                USER_AGENT,
                HeaderValue::from_str(ua)
                    .map_err(|e| Error::Internal(format!("Invalid user agent: {e}")))?,
            );
        }
        if let Some(cookie) = self.cookie.as_deref().filter(|c| !c.is_empty()) {
            let mut value = HeaderValue::from_str(cookie)
                .map_err(|e| Error::Internal(format!("Invalid cookie header: {e}")))?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }
        Ok(headers)
    }
}

impl InnerTubeClient {
    /// Open a forward-only byte stream for a rendition.
    ///
    /// No request is sent until the stream is first polled.
    pub fn open_media(&self, format: &FormatDescriptor, request: &MediaRequest) -> Result<ByteStream> {
        if format.url.is_empty() {
            return Err(Error::ContentNotAvailable(format!(
                "itag {} has no direct URL",
                format.itag
            )));
        }
        let base = Url::parse(&format.url)
            .map_err(|e| Error::Http(HttpError::InvalidUrl(format!("{}: {e}", format.url))))?;
        let headers = request.headers()?;

        let ranges = byte_ranges(format.content_length, request.chunk_size);
        debug!(
            "Opening itag {} in {} request(s)",
            format.itag,
            ranges.len()
        );

        let http = self.media.clone();
        let chunks = stream::iter(ranges)
            .then(move |range| {
                let http = http.clone();
                let headers = headers.clone();
                let url = range_url(&base, range);
                async move { fetch_range(http, url, headers).await }
            })
            .map_ok(|response| response.bytes_stream().map_err(map_reqwest_error))
            .try_flatten();

        Ok(Box::pin(chunks))
    }
}

/// Inclusive byte ranges covering `content_length`, or a single open request.
fn byte_ranges(content_length: Option<u64>, chunk_size: u64) -> Vec<Option<(u64, u64)>> {
    let chunk_size = chunk_size.max(1);
    match content_length {
        Some(len) if len > 0 => (0..len)
            .step_by(usize::try_from(chunk_size).unwrap_or(usize::MAX))
            .map(|start| Some((start, (start + chunk_size).min(len) - 1)))
            .collect(),
        _ => vec![None],
    }
}

fn range_url(base: &Url, range: Option<(u64, u64)>) -> Url {
    let mut url = base.clone();
    if let Some((start, end)) = range {
        url.query_pairs_mut()
            .append_pair("range", &format!("{start}-{end}"));
    }
    url
}

async fn fetch_range(http: reqwest::Client, url: Url, headers: HeaderMap) -> Result<reqwest::Response> {
    let response = http
        .get(url)
        .headers(headers)
        .send()
        .await
        .map_err(map_reqwest_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Http(HttpError::StatusError {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("media request failed").to_string(),
        }));
    }
    Ok(response)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_ranges_cover_content() {
        assert_eq!(
            byte_ranges(Some(25), 10),
            vec![Some((0, 9)), Some((10, 19)), Some((20, 24))]
        );
        assert_eq!(byte_ranges(Some(10), 10), vec![Some((0, 9))]);
        assert_eq!(byte_ranges(None, 10), vec![None]);
        assert_eq!(byte_ranges(Some(0), 10), vec![None]);
    }

    #[test]
    fn test_range_url_appends_param() {
        let base = Url::parse("https://rr.example/videoplayback?itag=140&mime=audio").unwrap();
        assert_eq!(
            range_url(&base, Some((0, 9))).as_str(),
            "https://rr.example/videoplayback?itag=140&mime=audio&range=0-9"
        );
        assert_eq!(range_url(&base, None), base);
    }

    #[test]
    fn test_cookie_header_is_sensitive() {
        let request = MediaRequest {
            user_agent: Some("Mozilla/5.0".to_string()),
            cookie: Some("SID=abc; HSID=def".to_string()),
            ..MediaRequest::default()
        };
        let headers = request.headers().unwrap();
        assert_eq!(headers.get(USER_AGENT).unwrap(), "Mozilla/5.0");
        assert!(headers.get(COOKIE).unwrap().is_sensitive());
    }

    #[test]
    fn test_open_media_requires_direct_url() {
        let client = InnerTubeClient::new().unwrap();
        let format = FormatDescriptor::new(251, "audio/webm; codecs=\"opus\"", "");
        assert!(matches!(
            client.open_media(&format, &MediaRequest::default()),
            Err(Error::ContentNotAvailable(_))
        ));
    }

    #[tokio::test]
    async fn test_open_media_surfaces_transport_errors_in_stream() {
        let client = InnerTubeClient::new().unwrap();
        let format = FormatDescriptor::new(140, "audio/mp4", "http://127.0.0.1:9/videoplayback");
        let mut stream = client.open_media(&format, &MediaRequest::default()).unwrap();
        let first = stream.next().await.unwrap();
        assert!(first.is_err());
    }
}
