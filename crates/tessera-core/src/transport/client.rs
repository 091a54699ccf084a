use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT_CHARSET, CACHE_CONTROL, HeaderMap, HeaderValue};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::kernel::constants::{DEFAULT_HTTP_TIMEOUT_SECS, USER_AGENT};
use crate::transport::error::TransportError;

/// Downloads used by the list and artifact fetchers.
///
/// Every call watches `cancel` and returns [`TransportError::Cancelled`] as
/// soon as it fires, dropping the connection instead of draining it.
#[async_trait]
pub trait HttpSource: Send + Sync {
    /// Fetches `url` as text
    async fn fetch_text(&self, url: &Url, cancel: &CancellationToken) -> Result<String, TransportError>;

    /// Streams `url` into `destination` and returns the number of bytes
    /// written. A failed or cancelled download leaves no file behind.
    async fn fetch_to_file(
        &self,
        url: &Url,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, TransportError>;
}

/// [`HttpSource`] backed by `reqwest`, with `file:` URLs read from disk
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    pub fn with_timeout(connect_timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(ACCEPT_CHARSET, HeaderValue::from_static("utf-8"));
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(connect_timeout)
            .default_headers(headers)
            .build()
            .map_err(|source| TransportError::Request { url: String::new(), source })?;
        Ok(Self { client })
    }

    async fn send(&self, url: &Url, cancel: &CancellationToken) -> Result<reqwest::Response, TransportError> {
        log::debug!("GET {}", url);
        let request = self.client.get(url.clone()).send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            result = request => result.map_err(|source| TransportError::Request { url: url.to_string(), source })?,
        };
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { url: url.to_string(), status: status.as_u16() });
        }
        Ok(response)
    }

    async fn stream_to_file(
        &self,
        url: &Url,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, TransportError> {
        let mut response = self.send(url, cancel).await?;
        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| TransportError::io(e, "create_download", destination.to_path_buf()))?;
        let mut written = 0u64;
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TransportError::Cancelled),
                chunk = response.chunk() => chunk.map_err(|source| TransportError::Request { url: url.to_string(), source })?,
            };
            let Some(chunk) = chunk else {
                break;
            };
            file.write_all(&chunk)
                .await
                .map_err(|e| TransportError::io(e, "write_download", destination.to_path_buf()))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| TransportError::io(e, "flush_download", destination.to_path_buf()))?;
        Ok(written)
    }
}

fn local_path(url: &Url) -> Result<std::path::PathBuf, TransportError> {
    url.to_file_path().map_err(|()| TransportError::InvalidUrl {
        url: url.to_string(),
        reason: "not a local file path".to_string(),
    })
}

#[async_trait]
impl HttpSource for HttpClient {
    async fn fetch_text(&self, url: &Url, cancel: &CancellationToken) -> Result<String, TransportError> {
        if url.scheme() == "file" {
            let path = local_path(url)?;
            return tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| TransportError::io(e, "read_site", path));
        }

        let mut response = self.send(url, cancel).await?;
        let mut body = Vec::new();
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TransportError::Cancelled),
                chunk = response.chunk() => chunk.map_err(|source| TransportError::Request { url: url.to_string(), source })?,
            };
            match chunk {
                Some(chunk) => body.extend_from_slice(&chunk),
                None => break,
            }
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn fetch_to_file(
        &self,
        url: &Url,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, TransportError> {
        if url.scheme() == "file" {
            let source = local_path(url)?;
            if cancel.is_cancelled() {
                return Err(TransportError::Cancelled);
            }
            return tokio::fs::copy(&source, destination)
                .await
                .map_err(|e| TransportError::io(e, "copy_download", source));
        }

        let result = self.stream_to_file(url, destination, cancel).await;
        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(destination).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Failed to remove partial download {}: {}", destination.display(), e);
                }
            }
        }
        result
    }
}
