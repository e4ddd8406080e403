// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust
//
// Parses the fixed `CrAU` header and protobuf manifest shared by every
// payload variant, driven entirely through the `PayloadReader`
// abstraction so the same code handles local files, ZIP members (stored
// or deflated), and remote HTTP sources without caring which.

use crate::DeltaArchiveManifest;
use crate::constants::{PAYLOAD_MAGIC, SUPPORTED_MINOR_VERSION, SUPPORTED_PAYLOAD_VERSION};
use crate::error::PayloadError;
use crate::payload::dispatcher::PayloadReader;
use crate::utils::read_exact_looped;
use anyhow::{Context, Result};
use prost::Message;

const HEADER_LEN: u64 = 24;

/// parses the payload header and manifest from any `PayloadReader`.
/// Returns `(manifest, data_offset)`, where `data_offset` is relative to
/// the start of the byte stream this reader presents.
pub async fn parse_payload(reader: &mut dyn PayloadReader) -> Result<(DeltaArchiveManifest, u64)> {
    let mut header_stream = reader.read_range(0, HEADER_LEN).await?;

    let mut magic = [0u8; 4];
    read_exact_looped(&mut header_stream, &mut magic)
        .await
        .map_err(PayloadError::SourceIoError)?;
    if &magic != PAYLOAD_MAGIC {
        return Err(PayloadError::BadPayload("magic 'CrAU' not found".into()).into());
    }

    let mut version_buf = [0u8; 8];
    read_exact_looped(&mut header_stream, &mut version_buf)
        .await
        .map_err(PayloadError::SourceIoError)?;
    let version = u64::from_be_bytes(version_buf);
    if version != SUPPORTED_PAYLOAD_VERSION {
        eprintln!(
            "- Warning: unexpected payload version {} (expected {})",
            version, SUPPORTED_PAYLOAD_VERSION
        );
    }

    let mut manifest_len_buf = [0u8; 8];
    read_exact_looped(&mut header_stream, &mut manifest_len_buf)
        .await
        .map_err(PayloadError::SourceIoError)?;
    let manifest_len = u64::from_be_bytes(manifest_len_buf);

    let mut sig_len_buf = [0u8; 4];
    read_exact_looped(&mut header_stream, &mut sig_len_buf)
        .await
        .map_err(PayloadError::SourceIoError)?;
    let sig_len = u32::from_be_bytes(sig_len_buf);

    if manifest_len == 0 || sig_len == 0 {
        return Err(PayloadError::BadPayload("zero manifest or signature length".into()).into());
    }

    drop(header_stream);

    let mut manifest_stream = reader.read_range(HEADER_LEN, manifest_len).await?;
    let mut manifest_bytes = vec![0u8; manifest_len as usize];
    read_exact_looped(&mut manifest_stream, &mut manifest_bytes)
        .await
        .map_err(PayloadError::SourceIoError)?;

    let manifest = DeltaArchiveManifest::decode(&manifest_bytes[..])
        .map_err(PayloadError::DecodeError)
        .context("decoding payload manifest")?;

    if manifest.block_size() == 0 {
        return Err(PayloadError::BadPayload("block_size must be non-zero".into()).into());
    }

    if manifest.minor_version() != SUPPORTED_MINOR_VERSION {
        return Err(PayloadError::BadPayload("delta payloads are not supported".into()).into());
    }

    let data_offset = HEADER_LEN + manifest_len + sig_len as u64;
    Ok((manifest, data_offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use tokio::io::AsyncRead;

    struct MockReader {
        data: Vec<u8>,
    }

    #[async_trait::async_trait]
    impl PayloadReader for MockReader {
        async fn read_range(
            &mut self,
            offset: u64,
            length: u64,
        ) -> Result<Pin<Box<dyn AsyncRead + Send + '_>>> {
            let start = offset as usize;
            let end = (start + length as usize).min(self.data.len());
            Ok(Box::pin(std::io::Cursor::new(self.data[start..end].to_vec())))
        }
    }

    /// a plausible non-zero placeholder; this parser never inspects the
    /// signature bytes themselves, only that `sig_len` is non-zero.
    const TEST_SIG_LEN: u32 = 16;

    fn build_payload(
        magic: &[u8; 4],
        version: u64,
        manifest_len: u64,
        sig_len: u32,
        manifest_bytes: &[u8],
    ) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(magic);
        out.extend_from_slice(&version.to_be_bytes());
        out.extend_from_slice(&manifest_len.to_be_bytes());
        out.extend_from_slice(&sig_len.to_be_bytes());
        out.extend_from_slice(manifest_bytes);
        out
    }

    fn build_valid_payload(manifest: &DeltaArchiveManifest) -> Vec<u8> {
        let manifest_bytes = manifest.encode_to_vec();
        build_payload(
            PAYLOAD_MAGIC,
            SUPPORTED_PAYLOAD_VERSION,
            manifest_bytes.len() as u64,
            TEST_SIG_LEN,
            &manifest_bytes,
        )
    }

    #[tokio::test]
    async fn parses_header_and_manifest() {
        let manifest = DeltaArchiveManifest {
            block_size: Some(4096),
            minor_version: Some(0),
            ..Default::default()
        };
        let bytes = build_valid_payload(&manifest);
        let manifest_len = bytes.len() as u64 - HEADER_LEN;
        let mut reader = MockReader { data: bytes };

        let (parsed, data_offset) = parse_payload(&mut reader).await.unwrap();
        assert_eq!(parsed.block_size(), 4096);
        assert_eq!(data_offset, HEADER_LEN + manifest_len + TEST_SIG_LEN as u64);
    }

    #[tokio::test]
    async fn rejects_bad_magic() {
        let manifest = DeltaArchiveManifest::default();
        let manifest_bytes = manifest.encode_to_vec();
        let bytes = build_payload(
            b"AAAA",
            SUPPORTED_PAYLOAD_VERSION,
            manifest_bytes.len() as u64,
            TEST_SIG_LEN,
            &manifest_bytes,
        );
        let mut reader = MockReader { data: bytes };

        let err = parse_payload(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[tokio::test]
    async fn rejects_delta_payloads() {
        let manifest = DeltaArchiveManifest {
            minor_version: Some(1),
            ..Default::default()
        };
        let bytes = build_valid_payload(&manifest);
        let mut reader = MockReader { data: bytes };

        let err = parse_payload(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("delta payloads are not supported"));
    }

    #[tokio::test]
    async fn rejects_zero_manifest_length() {
        let bytes = build_payload(PAYLOAD_MAGIC, SUPPORTED_PAYLOAD_VERSION, 0, TEST_SIG_LEN, &[]);
        let mut reader = MockReader { data: bytes };

        let err = parse_payload(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("zero manifest or signature length"));
    }

    #[tokio::test]
    async fn rejects_zero_signature_length() {
        let manifest = DeltaArchiveManifest {
            block_size: Some(4096),
            ..Default::default()
        };
        let manifest_bytes = manifest.encode_to_vec();
        let bytes = build_payload(
            PAYLOAD_MAGIC,
            SUPPORTED_PAYLOAD_VERSION,
            manifest_bytes.len() as u64,
            0,
            &manifest_bytes,
        );
        let mut reader = MockReader { data: bytes };

        let err = parse_payload(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("zero manifest or signature length"));
    }

    #[tokio::test]
    async fn rejects_zero_block_size() {
        let manifest = DeltaArchiveManifest {
            block_size: Some(0),
            ..Default::default()
        };
        let bytes = build_valid_payload(&manifest);
        let mut reader = MockReader { data: bytes };

        let err = parse_payload(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("block_size must be non-zero"));
    }
}
