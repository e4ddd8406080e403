// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust
//
// Typed error taxonomy for the extraction engine. Library consumers that
// need to branch on failure kind should match on `PayloadError`; the CLI
// and most internal call sites just propagate it through `anyhow`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("bad payload: {0}")]
    BadPayload(String),

    #[error("failed to decode manifest: {0}")]
    DecodeError(#[from] prost::DecodeError),

    #[error("source I/O error: {0}")]
    SourceIoError(#[source] std::io::Error),

    #[error("output I/O error: {0}")]
    OutputIoError(#[source] std::io::Error),

    #[error("codec error: {0}")]
    CodecError(String),
}
