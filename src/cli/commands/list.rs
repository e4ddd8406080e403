// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust

use payload_dumper::DeltaArchiveManifest;
use payload_dumper::metadata::build_summary;

pub fn list_partitions(manifest: &DeltaArchiveManifest, images_filter: &str) {
    let summary = build_summary(manifest, images_filter);

    if let Some(patch) = &summary.security_patch_level {
        println!("Security Patch Level : {}", patch);
    }
    println!("Block Size           : {}", summary.block_size);
    println!("Minor Version        : {}", summary.minor_version);
    if let Some(ts) = summary.max_timestamp {
        println!("Max Timestamp        : {}", ts);
    }

    if !summary.apex_info.is_empty() {
        println!();
        println!("APEX Info:");
        for apex in &summary.apex_info {
            println!(
                "  {:<30} version={:<12} compressed={:<6} decompressed_size={}",
                apex.package_name.as_deref().unwrap_or("?"),
                apex.version.map(|v| v.to_string()).unwrap_or_default(),
                apex.is_compressed.unwrap_or(false),
                apex.decompressed_size.unwrap_or(0),
            );
        }
    }

    println!();
    println!(
        "{:<24} {:<12} {:<10} {:<10}",
        "Partition Name", "Size", "Ops", "Compression"
    );
    println!("{}", "-".repeat(58));

    for partition in &summary.partitions {
        println!(
            "{:<24} {:<12} {:<10} {:<10}",
            partition.name,
            if partition.size_bytes > 0 {
                partition.size_readable.clone()
            } else {
                "Unknown".to_string()
            },
            partition.operations_count,
            partition.compression_type,
        );
    }
}
