// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust

use ahash::AHashSet as HashSet;
use payload_dumper::DeltaArchiveManifest;
use payload_dumper::PartitionUpdate;

/// filters partitions based on the images argument
/// returns all partitions if images is empty, otherwise returns filtered list
pub fn filter_partitions(
    manifest: &DeltaArchiveManifest,
    images_arg: &str,
) -> Vec<PartitionUpdate> {
    if images_arg.is_empty() {
        manifest.partitions.clone()
    } else {
        let images: HashSet<&str> = images_arg.split(',').collect();
        manifest
            .partitions
            .iter()
            .filter(|p| images.contains(p.partition_name.as_str()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_with(names: &[&str]) -> DeltaArchiveManifest {
        DeltaArchiveManifest {
            partitions: names
                .iter()
                .map(|name| PartitionUpdate {
                    partition_name: name.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_filter_returns_every_partition() {
        let manifest = manifest_with(&["boot", "vendor", "system", "product"]);
        let filtered = filter_partitions(&manifest, "");
        assert_eq!(filtered.len(), 4);
    }

    #[test]
    fn named_filter_returns_only_matches() {
        let manifest = manifest_with(&["boot", "vendor", "system", "product"]);
        let filtered = filter_partitions(&manifest, "boot,system");

        let mut names: Vec<&str> = filtered.iter().map(|p| p.partition_name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["boot", "system"]);
    }

    #[test]
    fn unmatched_names_are_silently_dropped() {
        let manifest = manifest_with(&["boot"]);
        let filtered = filter_partitions(&manifest, "boot,doesnotexist");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].partition_name, "boot");
    }
}
