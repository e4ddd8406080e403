// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust

use crate::http::HttpReader;
use crate::payload::dispatcher::{AsyncPayloadRead, PayloadReader};
use crate::zip::deflate_reader::{DeflateZipStream, FilledBuf, RawEntryOpener};
use crate::zip::zip::{COMPRESSION_DEFLATE, ZipEntry, ZipParser};
use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// async payload reader for remote ZIP archives
pub struct RemoteAsyncZipPayloadReader {
    pub http_reader: Arc<HttpReader>,
    entry: ZipEntry,
    payload_offset: u64,
}

impl RemoteAsyncZipPayloadReader {
    pub async fn new(url: String, user_agent: Option<&str>) -> Result<Self> {
        let http_reader = HttpReader::new(url, user_agent).await?;

        let entry = ZipParser::find_payload_entry(&http_reader).await?;
        let payload_offset = ZipParser::get_data_offset(&http_reader, &entry).await?;
        if entry.compression_method != COMPRESSION_DEFLATE {
            ZipParser::verify_payload_magic(&http_reader, payload_offset).await?;
        }

        Ok(Self {
            http_reader: Arc::new(http_reader),
            entry,
            payload_offset,
        })
    }
}

#[async_trait]
impl AsyncPayloadRead for RemoteAsyncZipPayloadReader {
    async fn open_reader(&self) -> Result<Box<dyn PayloadReader>> {
        if self.entry.compression_method == COMPRESSION_DEFLATE {
            let opener = RemoteRawEntryOpener {
                http_reader: Arc::clone(&self.http_reader),
                start: self.payload_offset,
                compressed_size: self.entry.compressed_size,
            };
            Ok(Box::new(RemoteDeflateZipPayloadReader {
                stream: DeflateZipStream::new(opener),
            }))
        } else {
            Ok(Box::new(RemoteStoredPayloadReader {
                http_reader: Arc::clone(&self.http_reader),
                payload_offset: self.payload_offset,
            }))
        }
    }
}

struct RemoteStoredPayloadReader {
    http_reader: Arc<HttpReader>,
    payload_offset: u64,
}

#[async_trait]
impl PayloadReader for RemoteStoredPayloadReader {
    async fn read_range(
        &mut self,
        offset: u64,
        length: u64,
    ) -> Result<Pin<Box<dyn AsyncRead + Send + '_>>> {
        let mut buf = vec![0u8; length as usize];
        self.http_reader
            .read_at(self.payload_offset + offset, &mut buf)
            .await?;
        Ok(Box::pin(FilledBuf::new(buf)))
    }
}

struct RemoteRawEntryOpener {
    http_reader: Arc<HttpReader>,
    start: u64,
    compressed_size: u64,
}

#[async_trait]
impl RawEntryOpener for RemoteRawEntryOpener {
    async fn open(&self) -> Result<Pin<Box<dyn AsyncRead + Send>>> {
        let end = self.start + self.compressed_size - 1;
        let range = format!("bytes={}-{}", self.start, end);

        let response = self
            .http_reader
            .client
            .get(&self.http_reader.url)
            .header(reqwest::header::RANGE, range)
            .send()
            .await?;

        if response.status().as_u16() != 206 {
            return Err(anyhow::anyhow!(
                "range request failed: {}",
                response.status()
            ));
        }

        let stream = response.bytes_stream();
        let reader = tokio_util::io::StreamReader::new(
            stream.map(|result| result.map_err(std::io::Error::other)),
        );
        Ok(Box::pin(reader))
    }
}

struct RemoteDeflateZipPayloadReader {
    stream: DeflateZipStream<RemoteRawEntryOpener>,
}

#[async_trait]
impl PayloadReader for RemoteDeflateZipPayloadReader {
    async fn read_range(
        &mut self,
        offset: u64,
        length: u64,
    ) -> Result<Pin<Box<dyn AsyncRead + Send + '_>>> {
        let mut buf = vec![0u8; length as usize];
        self.stream.read_exact_at(offset, &mut buf).await?;
        Ok(Box::pin(FilledBuf::new(buf)))
    }
}
