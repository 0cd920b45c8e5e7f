use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use crate::error::{FetchError, Result};

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// What a metadata probe learned about a remote object.
#[derive(Clone, Copy, Debug, Default)]
pub struct RemoteMeta {
    /// Total object size, when the server reports Content-Length.
    pub content_length: Option<u64>,
    /// Whether the server advertises byte-range support.
    pub accepts_ranges: bool,
}

/// Asynchronous HTTP client abstraction.
///
/// The minimal interface the transfer engine needs; implementations handle
/// their own redirect following and timeout configuration. Production code
/// uses [`ReqwestClient`]; tests substitute in-memory mocks.
pub trait HttpClient: Send + Sync {
    /// HEAD-equivalent probe for size and range support.
    fn probe(&self, url: &str) -> impl Future<Output = Result<RemoteMeta>> + Send;

    /// Open a streaming GET, optionally resuming from a byte offset via a
    /// `Range: bytes=N-` header.
    fn stream(
        &self,
        url: &str,
        resume_from: Option<u64>,
    ) -> impl Future<Output = Result<BoxStream<'static, Result<Bytes>>>> + Send;

    /// Fetch a small text body in full (directory listings).
    fn get_text(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

fn map_reqwest(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = e.status() {
        FetchError::Status(status.as_u16())
    } else {
        FetchError::Network(e.to_string())
    }
}

/// Production HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .user_agent(concat!("stationsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    async fn probe(&self, url: &str) -> Result<RemoteMeta> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(map_reqwest)?
            .error_for_status()
            .map_err(map_reqwest)?;

        let content_length = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let accepts_ranges = response
            .headers()
            .get(reqwest::header::ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| !v.eq_ignore_ascii_case("none"));

        Ok(RemoteMeta {
            content_length,
            accepts_ranges,
        })
    }

    async fn stream(
        &self,
        url: &str,
        resume_from: Option<u64>,
    ) -> Result<BoxStream<'static, Result<Bytes>>> {
        let mut request = self.client.get(url);
        if let Some(offset) = resume_from {
            request = request.header(reqwest::header::RANGE, format!("bytes={offset}-"));
        }

        let response = request
            .send()
            .await
            .map_err(map_reqwest)?
            .error_for_status()
            .map_err(map_reqwest)?;

        let stream = response.bytes_stream().map(|r| r.map_err(map_reqwest));
        Ok(Box::pin(stream))
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        self.client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest)?
            .error_for_status()
            .map_err(map_reqwest)?
            .text()
            .await
            .map_err(map_reqwest)
    }
}
