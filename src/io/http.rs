use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::ReadAt;
use anyhow::{Result, anyhow, bail};

/// Image served over HTTP, read with Range requests
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
    max_retry: u32,
}

impl HttpRangeReader {
    /// Probe `url` with a HEAD request for its length and Range support
    pub async fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let resp = client.head(&url).send().await?;

        if !resp.status().is_success() {
            bail!("HEAD {} failed with status: {}", url, resp.status());
        }

        let ranges = resp
            .headers()
            .get(reqwest::header::ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none");
        if !ranges.contains("bytes") {
            bail!("{} does not accept byte Range requests", url);
        }

        let size: u64 = resp
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| anyhow!("{} did not report a Content-Length", url))?;

        debug!(url = %url, size, "remote image probed");
        Ok(Self {
            client,
            url,
            size,
            transferred_bytes: AtomicU64::new(0),
            max_retry: 10,
        })
    }

    /// Total bytes received so far
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    async fn fetch(&self, first: u64, last: u64) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(&self.url)
            .header(reqwest::header::RANGE, format!("bytes={first}-{last}"))
            .send()
            .await
    }
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let last = (offset + buf.len() as u64 - 1).min(self.size - 1);
        let wanted = (last - offset + 1) as usize;
        let mut filled = 0;
        let mut attempt = 0;

        while filled < wanted {
            match self.fetch(offset + filled as u64, last).await {
                Ok(resp) if resp.status() == StatusCode::PARTIAL_CONTENT => {
                    let body = resp.bytes().await?;
                    let n = body.len().min(wanted - filled);
                    if n == 0 {
                        bail!("empty Range response from {}", self.url);
                    }
                    buf[filled..filled + n].copy_from_slice(&body[..n]);
                    filled += n;
                    self.transferred_bytes.fetch_add(n as u64, Ordering::Relaxed);
                }
                Ok(resp) => bail!("Range GET {} failed with status: {}", self.url, resp.status()),
                Err(e) if e.is_timeout() || e.is_connect() => {
                    attempt += 1;
                    if attempt >= self.max_retry {
                        bail!("giving up on {} after {} attempts: {}", self.url, attempt, e);
                    }
                    warn!(attempt, max = self.max_retry, error = %e, "retrying Range request");
                    tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(filled)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
