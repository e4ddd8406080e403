// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust
//
// Range-cached HTTP reader: presents a positioned-read view over a remote
// URL, fetching and caching fixed-size chunks on demand. Used both as the
// ZIP central-directory source (via `ZipIO`) and as the raw-bin payload
// source.

use crate::constants::{DEFAULT_HTTP_CHUNK_SIZE, DEFAULT_USER_AGENT};
use ahash::AHashMap as HashMap;
use anyhow::{Result, anyhow};
use reqwest::{Client, header};
use std::sync::Mutex;
use std::time::Duration;

async fn create_http_client(user_agent: Option<&str>) -> Result<Client> {
    let mut headers = header::HeaderMap::new();

    let ua = user_agent.unwrap_or(DEFAULT_USER_AGENT);
    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(ua)
            .map_err(|e| anyhow!("Invalid user agent string: {}", e))?,
    );
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));
    headers.insert(
        header::CONNECTION,
        header::HeaderValue::from_static("keep-alive"),
    );

    Client::builder()
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Some(Duration::from_secs(30)))
        .http2_keep_alive_interval(Some(Duration::from_secs(30)))
        .http2_adaptive_window(true)
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))
}

const MAX_RETRIES: u32 = 3;

async fn with_retries<F, Fut, T>(mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_error = None;
    for retry in 0..MAX_RETRIES {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                last_error = Some(e);
                if retry + 1 < MAX_RETRIES {
                    tokio::time::sleep(Duration::from_secs(2u64.pow(retry + 1))).await;
                }
            }
        }
    }
    Err(last_error.unwrap())
}

#[derive(Debug)]
struct ChunkCache {
    chunks: HashMap<u64, Vec<u8>>,
    order: Vec<u64>,
    max_bytes: Option<u64>,
}

impl ChunkCache {
    fn new(max_bytes: Option<u64>) -> Self {
        Self {
            chunks: HashMap::default(),
            order: Vec::new(),
            max_bytes,
        }
    }

    fn get(&mut self, chunk_start: u64) -> Option<Vec<u8>> {
        if let Some(data) = self.chunks.get(&chunk_start) {
            self.order.retain(|c| *c != chunk_start);
            self.order.push(chunk_start);
            Some(data.clone())
        } else {
            None
        }
    }

    fn insert(&mut self, chunk_start: u64, data: Vec<u8>) {
        self.chunks.insert(chunk_start, data);
        self.order.retain(|c| *c != chunk_start);
        self.order.push(chunk_start);

        if let Some(max_bytes) = self.max_bytes {
            let mut total: u64 = self.chunks.values().map(|v| v.len() as u64).sum();
            while total > max_bytes && self.order.len() > 1 {
                let evict = self.order.remove(0);
                if let Some(v) = self.chunks.remove(&evict) {
                    total -= v.len() as u64;
                }
            }
        }
    }
}

/// positioned-read view over a remote resource, backed by a chunk-aligned
/// cache. `chunk_size` bounds every range GET; `max_cache_bytes` (if set)
/// evicts least-recently-used chunks once exceeded, otherwise the cache
/// grows without bound for the lifetime of the reader.
#[derive(Debug)]
pub struct HttpReader {
    pub client: Client,
    pub url: String,
    pub content_length: u64,
    chunk_size: u64,
    cache: Mutex<ChunkCache>,
}

impl HttpReader {
    pub async fn new(url: String, user_agent: Option<&str>) -> Result<Self> {
        Self::with_options(url, user_agent, DEFAULT_HTTP_CHUNK_SIZE, None).await
    }

    pub async fn with_options(
        url: String,
        user_agent: Option<&str>,
        chunk_size: u64,
        max_cache_bytes: Option<u64>,
    ) -> Result<Self> {
        let client = create_http_client(user_agent).await?;
        url::Url::parse(&url).map_err(|e| anyhow!("Invalid URL: {}", e))?;

        let content_length = Self::probe_length(&client, &url).await?;
        if content_length == 0 {
            return Err(anyhow!("File size is 0"));
        }

        Ok(Self {
            client,
            url,
            content_length,
            chunk_size,
            cache: Mutex::new(ChunkCache::new(max_cache_bytes)),
        })
    }

    /// HEAD first; if that doesn't yield a usable length, fall back to a
    /// 1-byte ranged GET and parse `Content-Range`.
    async fn probe_length(client: &Client, url: &str) -> Result<u64> {
        let head_result = with_retries(|| async {
            client
                .head(url)
                .send()
                .await
                .map_err(|e| anyhow!("HEAD request failed: {}", e))
        })
        .await;

        if let Ok(response) = head_result {
            let status = response.status().as_u16();
            if matches!(status, 200 | 202 | 204) {
                if let Some(len) = response
                    .headers()
                    .get(header::CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    && len > 0
                {
                    return Ok(len);
                }
            }
        }

        let response = with_retries(|| async {
            client
                .get(url)
                .header(header::RANGE, "bytes=0-0")
                .send()
                .await
                .map_err(|e| anyhow!("range probe failed: {}", e))
        })
        .await?;

        if response.status().as_u16() != 206 {
            return Err(anyhow!(
                "server did not honor range requests (status {})",
                response.status()
            ));
        }

        let content_range = response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| anyhow!("missing Content-Range on ranged probe response"))?;

        let total = content_range
            .rsplit('/')
            .next()
            .ok_or_else(|| anyhow!("malformed Content-Range: {}", content_range))?;

        total
            .parse::<u64>()
            .map_err(|_| anyhow!("server did not report total size in Content-Range"))
    }

    async fn fetch_chunk(&self, chunk_start: u64) -> Result<Vec<u8>> {
        let chunk_end = (chunk_start + self.chunk_size).min(self.content_length) - 1;
        let range = format!("bytes={}-{}", chunk_start, chunk_end);

        with_retries(|| async {
            let response = self
                .client
                .get(&self.url)
                .header(header::RANGE, &range)
                .send()
                .await
                .map_err(|e| anyhow!("range fetch failed: {}", e))?;

            if response.status().as_u16() != 206 {
                return Err(anyhow!("range request failed: {}", response.status()));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| anyhow!("reading range body failed: {}", e))?;
            Ok(bytes.to_vec())
        })
        .await
    }

    /// reads exactly `buf.len()` bytes starting at `offset`, splitting the
    /// window across as many `chunk_size`-aligned chunks as needed.
    pub async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        if offset >= self.content_length {
            return Err(anyhow!(
                "offset {} exceeds content length {}",
                offset,
                self.content_length
            ));
        }

        let remaining = self.content_length - offset;
        let to_read = (buf.len() as u64).min(remaining) as usize;
        if to_read == 0 {
            return Ok(());
        }

        let mut filled = 0usize;
        while filled < to_read {
            let pos = offset + filled as u64;
            let chunk_start = (pos / self.chunk_size) * self.chunk_size;

            let cached = {
                let mut cache = self.cache.lock().unwrap();
                cache.get(chunk_start)
            };

            let chunk = match cached {
                Some(data) => data,
                None => {
                    let data = self.fetch_chunk(chunk_start).await?;
                    let mut cache = self.cache.lock().unwrap();
                    cache.insert(chunk_start, data.clone());
                    data
                }
            };

            let within_chunk = (pos - chunk_start) as usize;
            if within_chunk >= chunk.len() {
                return Err(anyhow!("unexpected end of stream at offset {}", pos));
            }

            let available = chunk.len() - within_chunk;
            let want = (to_read - filled).min(available);
            buf[filled..filled + want].copy_from_slice(&chunk[within_chunk..within_chunk + want]);
            filled += want;
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl crate::zip::zip_io::ZipIO for HttpReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.read_at(offset, buf).await
    }

    async fn size(&self) -> Result<u64> {
        Ok(self.content_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// a server that rejects HEAD and answers every GET (including ranged
    /// ones) with a plain 200, to exercise the "range not honored" path.
    async fn spawn_no_range_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]);

                    let response = if request.starts_with("HEAD") {
                        "HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                            .to_string()
                    } else {
                        let body = b"not a real payload";
                        format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            String::from_utf8_lossy(body)
                        )
                    };

                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{addr}/payload.bin")
    }

    #[tokio::test]
    async fn init_fails_when_server_does_not_honor_range() {
        let url = spawn_no_range_server().await;
        let err = HttpReader::new(url, None).await.unwrap_err();
        assert!(err.to_string().contains("did not honor range requests"));
    }
}
