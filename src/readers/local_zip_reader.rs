// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust

use crate::payload::dispatcher::{AsyncPayloadRead, PayloadReader};
use crate::zip::deflate_reader::{DeflateZipStream, FilledBuf, RawEntryOpener};
use crate::zip::local_zip_io::LocalZipIO;
use crate::zip::zip::{COMPRESSION_DEFLATE, ZipEntry, ZipParser};
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::fs::File;
use tokio::io::AsyncSeekExt;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

pub struct LocalAsyncZipPayloadReader {
    path: PathBuf,
    entry: ZipEntry,
    payload_offset: u64,
}

impl LocalAsyncZipPayloadReader {
    pub async fn new(zip_path: PathBuf) -> Result<Self> {
        let io = LocalZipIO::new(zip_path.clone()).await?;
        let entry = ZipParser::find_payload_entry(&io).await?;
        let data_offset = ZipParser::get_data_offset(&io, &entry).await?;

        if entry.compression_method != COMPRESSION_DEFLATE {
            ZipParser::verify_payload_magic(&io, data_offset).await?;
        }

        Ok(Self {
            path: zip_path,
            entry,
            payload_offset: data_offset,
        })
    }
}

#[async_trait]
impl AsyncPayloadRead for LocalAsyncZipPayloadReader {
    async fn open_reader(&self) -> Result<Box<dyn PayloadReader>> {
        if self.entry.compression_method == COMPRESSION_DEFLATE {
            let opener = LocalRawEntryOpener {
                path: self.path.clone(),
                start: self.payload_offset,
                compressed_size: self.entry.compressed_size,
            };
            Ok(Box::new(LocalDeflateZipPayloadReader {
                stream: DeflateZipStream::new(opener),
            }))
        } else {
            let file = File::open(&self.path).await?;
            Ok(Box::new(LocalZipPayloadReader {
                file: BufReader::new(file),
                payload_offset: self.payload_offset,
            }))
        }
    }
}

struct LocalZipPayloadReader {
    file: BufReader<File>,
    payload_offset: u64,
}

#[async_trait]
impl PayloadReader for LocalZipPayloadReader {
    async fn read_range(
        &mut self,
        offset: u64,
        length: u64,
    ) -> Result<Pin<Box<dyn AsyncRead + Send + '_>>> {
        let absolute_offset = self.payload_offset + offset;
        self.file
            .seek(std::io::SeekFrom::Start(absolute_offset))
            .await?;
        Ok(Box::pin((&mut self.file).take(length)))
    }
}

struct LocalRawEntryOpener {
    path: PathBuf,
    start: u64,
    compressed_size: u64,
}

#[async_trait]
impl RawEntryOpener for LocalRawEntryOpener {
    async fn open(&self) -> Result<Pin<Box<dyn AsyncRead + Send>>> {
        let mut file = File::open(&self.path).await?;
        file.seek(std::io::SeekFrom::Start(self.start)).await?;
        Ok(Box::pin(file.take(self.compressed_size)))
    }
}

struct LocalDeflateZipPayloadReader {
    stream: DeflateZipStream<LocalRawEntryOpener>,
}

#[async_trait]
impl PayloadReader for LocalDeflateZipPayloadReader {
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
