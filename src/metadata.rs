// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust
//
// This file is part of payload-dumper. It implements components used for
// extracting and processing Android OTA payloads.

use crate::DeltaArchiveManifest;
use crate::install_operation;
use crate::structs::{ApexInfoRow, PartitionRow, PayloadSummary};
use crate::utils::format_size;
use ahash::AHashSet as HashSet;

/// builds the info/list summary for a manifest, optionally restricted to a
/// subset of partition names.
pub fn build_summary(manifest: &DeltaArchiveManifest, images_filter: &str) -> PayloadSummary {
    let filter: Option<HashSet<&str>> = if images_filter.is_empty() {
        None
    } else {
        Some(images_filter.split(',').collect())
    };

    let apex_info = manifest
        .apex_info
        .iter()
        .map(|info| ApexInfoRow {
            package_name: info.package_name.clone(),
            version: info.version,
            is_compressed: info.is_compressed,
            decompressed_size: info.decompressed_size,
        })
        .collect();

    let partitions = manifest
        .partitions
        .iter()
        .filter(|p| {
            filter
                .as_ref()
                .is_none_or(|f| f.contains(p.partition_name.as_str()))
        })
        .map(|partition| {
            let size_bytes = partition
                .new_partition_info
                .as_ref()
                .and_then(|info| info.size)
                .unwrap_or(0);

            let compression_type = partition
                .operations
                .iter()
                .find_map(|op| match op.r#type() {
                    install_operation::Type::ReplaceXz => Some("xz"),
                    install_operation::Type::ReplaceBz => Some("bz2"),
                    _ => None,
                })
                .unwrap_or("none")
                .to_string();

            PartitionRow {
                name: partition.partition_name.clone(),
                size_bytes,
                size_readable: format_size(size_bytes),
                operations_count: partition.operations.len(),
                compression_type,
            }
        })
        .collect();

    PayloadSummary {
        security_patch_level: manifest.security_patch_level.clone(),
        block_size: manifest.block_size(),
        minor_version: manifest.minor_version(),
        max_timestamp: manifest.max_timestamp,
        apex_info,
        partitions,
    }
}
