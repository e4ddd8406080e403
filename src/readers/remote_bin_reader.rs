// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust
//
// It is highly unlikely that a raw payload.bin file is ever served directly
// by a normal HTTP server, but the wire format allows for it, so this path
// is kept for completeness.

use crate::http::HttpReader;
use crate::payload::dispatcher::{AsyncPayloadRead, PayloadReader};
use crate::zip::deflate_reader::FilledBuf;
use anyhow::Result;
use async_trait::async_trait;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// async payload reader for remote .bin files (not in a ZIP)
pub struct RemoteAsyncBinPayloadReader {
    pub http_reader: Arc<HttpReader>,
}

impl RemoteAsyncBinPayloadReader {
    pub async fn new(url: String, user_agent: Option<&str>) -> Result<Self> {
        let http_reader = HttpReader::new(url, user_agent).await?;

        Ok(Self {
            http_reader: Arc::new(http_reader),
        })
    }
}

#[async_trait]
impl AsyncPayloadRead for RemoteAsyncBinPayloadReader {
    async fn open_reader(&self) -> Result<Box<dyn PayloadReader>> {
        Ok(Box::new(RemoteBinPayloadReader {
            http_reader: Arc::clone(&self.http_reader),
        }))
    }
}

struct RemoteBinPayloadReader {
    http_reader: Arc<HttpReader>,
}

#[async_trait]
impl PayloadReader for RemoteBinPayloadReader {
    async fn read_range(
        &mut self,
        offset: u64,
        length: u64,
    ) -> Result<Pin<Box<dyn AsyncRead + Send + '_>>> {
        let mut buf = vec![0u8; length as usize];
        self.http_reader.read_at(offset, &mut buf).await?;
        Ok(Box::pin(FilledBuf::new(buf)))
    }
}
