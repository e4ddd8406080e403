// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust
//
// Display/serialization types for the `--list`/info surface. These are
// derived entirely from the generated `DeltaArchiveManifest` (see
// lib.rs's `include!`) and never round-trip back into it.

use serde::Serialize;

#[derive(Serialize)]
pub struct ApexInfoRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_compressed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decompressed_size: Option<i64>,
}

#[derive(Serialize)]
pub struct PartitionRow {
    pub name: String,
    pub size_bytes: u64,
    pub size_readable: String,
    pub operations_count: usize,
    pub compression_type: String,
}

#[derive(Serialize)]
pub struct PayloadSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_patch_level: Option<String>,
    pub block_size: u32,
    pub minor_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_timestamp: Option<i64>,
    pub apex_info: Vec<ApexInfoRow>,
    pub partitions: Vec<PartitionRow>,
}
