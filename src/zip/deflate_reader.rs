// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust
//
// Decompressing reader for a deflated ZIP member, kept alive across calls
// so that forward-only reads (the dispatcher sorts operations by
// `data_offset` ascending) don't pay for re-inflating from the start of the
// entry on every call.

use anyhow::Result;
use async_compression::tokio::bufread::DeflateDecoder;
use async_trait::async_trait;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

/// opens a fresh `AsyncRead` over the *compressed* bytes of a ZIP entry,
/// from the entry's first compressed byte. Implemented differently for
/// local files (seek + take) and remote archives (a ranged GET stream).
#[async_trait]
pub trait RawEntryOpener: Send + Sync {
    async fn open(&self) -> Result<Pin<Box<dyn AsyncRead + Send>>>;
}

#[allow(dead_code)]
enum StreamState {
    NoStream,
    Stream {
        start: u64,
        pos: u64,
        decoder: Pin<Box<DeflateDecoder<BufReader<Pin<Box<dyn AsyncRead + Send>>>>>>,
    },
}

/// presents positioned reads over a deflated entry's *decompressed* bytes,
/// reusing the open decompression stream when reads continue where the
/// previous one left off.
pub struct DeflateZipStream<O: RawEntryOpener> {
    opener: O,
    state: StreamState,
}

impl<O: RawEntryOpener> DeflateZipStream<O> {
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            state: StreamState::NoStream,
        }
    }

    async fn open_at(&mut self, offset: u64) -> Result<()> {
        let raw = self.opener.open().await?;
        let mut decoder = Box::pin(DeflateDecoder::new(BufReader::new(raw)));

        // discard forward to `offset`; a fresh stream always starts at 0.
        let mut discard = vec![0u8; 64 * 1024];
        let mut remaining = offset;
        while remaining > 0 {
            let want = remaining.min(discard.len() as u64) as usize;
            let n = decoder.read(&mut discard[..want]).await?;
            if n == 0 {
                break;
            }
            remaining -= n as u64;
        }

        self.state = StreamState::Stream {
            start: offset,
            pos: offset,
            decoder,
        };
        Ok(())
    }

    /// read decompressed bytes starting at `offset` into `buf`, reusing the
    /// live stream when `offset` continues it, otherwise reopening and
    /// fast-forwarding to `offset`.
    pub async fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let continues = matches!(&self.state, StreamState::Stream { pos, .. } if *pos == offset);
        if !continues {
            self.open_at(offset).await?;
        }

        match &mut self.state {
            StreamState::Stream { pos, decoder, .. } => {
                let n = decoder.read(buf).await?;
                *pos += n as u64;
                Ok(n)
            }
            StreamState::NoStream => unreachable!("open_at always sets Stream"),
        }
    }

    /// fills `buf` completely, looping `read_at` until done.
    pub async fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0usize;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                return Err(anyhow::anyhow!("unexpected end of deflate stream"));
            }
            filled += n;
        }
        Ok(())
    }
}

/// presents an already-materialized byte buffer as an `AsyncRead`, used to
/// hand decompressed-on-demand bytes to callers expecting a stream.
pub struct FilledBuf {
    data: Vec<u8>,
    pos: usize,
}

impl FilledBuf {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl AsyncRead for FilledBuf {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        let remaining = &self.data[self.pos..];
        let n = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..n]);
        self.pos += n;
        std::task::Poll::Ready(Ok(()))
    }
}
