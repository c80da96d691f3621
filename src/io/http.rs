use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, HeaderMap, RANGE};
use reqwest::{Client, Response, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::ReadAt;
use anyhow::{Result, anyhow, bail};

/// Request settings for [`HttpRangeReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Attempts per range before giving up on timeouts and refused connections.
    pub max_retry: u32,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retry: 10,
        }
    }
}

/// HTTP Range reader for archives served remotely
///
/// Lookups only touch the end record, the central directory and the
/// ranges of the entries asked for, so a remote archive is never
/// downloaded whole.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
    options: HttpOptions,
}

impl HttpRangeReader {
    /// Connect with [`HttpOptions::default`].
    pub async fn new(url: String) -> Result<Self> {
        Self::with_options(url, HttpOptions::default()).await
    }

    /// Send a HEAD request to learn the archive size and check that the
    /// server answers byte ranges.
    pub async fn with_options(url: String, options: HttpOptions) -> Result<Self> {
        let client = Client::builder().timeout(options.timeout).build()?;

        let resp = client.head(&url).send().await?;
        if !resp.status().is_success() {
            bail!("HEAD {} failed with status: {}", url, resp.status());
        }
        let size = range_capable_size(resp.headers())?;

        debug!("{} supports range requests ({} bytes)", url, size);
        Ok(Self {
            client,
            url,
            size,
            transferred_bytes: AtomicU64::new(0),
            options,
        })
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// GET `bytes=start-end`, retrying connection failures with a growing delay.
    async fn get_range(&self, start: u64, end: u64) -> Result<Response> {
        let range = format!("bytes={}-{}", start, end);
        let mut attempt = 0;
        loop {
            let err = match self.client.get(&self.url).header(RANGE, &range).send().await {
                Ok(resp) => return Ok(resp),
                Err(err) if err.is_timeout() || err.is_connect() => err,
                Err(err) => return Err(err.into()),
            };

            attempt += 1;
            if attempt >= self.options.max_retry {
                bail!("Max retries exceeded for range {}: {}", range, err);
            }
            warn!(
                "Connection error, retry {}/{}: {}",
                attempt, self.options.max_retry, err
            );
            tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
        }
    }
}

/// Archive size from a HEAD response, if the server serves byte ranges.
fn range_capable_size(headers: &HeaderMap) -> Result<u64> {
    let ranges = headers
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none");
    if !ranges.contains("bytes") {
        bail!("Remote server does not support Range requests");
    }

    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| anyhow!("Remote server did not return Content-Length"))
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let end = (offset + buf.len() as u64 - 1).min(self.size - 1);
        let wanted = (end - offset + 1) as usize;

        // Servers may answer a range in several shorter parts.
        let mut received = 0;
        while received < wanted {
            let resp = self.get_range(offset + received as u64, end).await?;
            if resp.status() != StatusCode::PARTIAL_CONTENT {
                bail!("Range request answered with status: {}", resp.status());
            }

            let body = resp.bytes().await?;
            if body.is_empty() {
                bail!("Empty response at offset {}", offset + received as u64);
            }
            let n = body.len().min(wanted - received);
            buf[received..received + n].copy_from_slice(&body[..n]);
            received += n;
            self.transferred_bytes.fetch_add(n as u64, Ordering::Relaxed);
        }

        Ok(received)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
