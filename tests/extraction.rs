// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust
//
// End-to-end extraction scenarios against hand-built, in-memory manifests
// and data blobs, driving the dispatcher the same way the CLI does.

use payload_dumper::payload::dispatcher::{AsyncPayloadRead, NoOpReporter, PayloadReader, dump_partition};
use payload_dumper::{Extent, InstallOperation, PartitionUpdate, install_operation};
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::AsyncRead;

struct MemoryReader {
    data: Vec<u8>,
}

#[async_trait::async_trait]
impl PayloadReader for MemoryReader {
    async fn read_range(
        &mut self,
        offset: u64,
        length: u64,
    ) -> anyhow::Result<Pin<Box<dyn AsyncRead + Send + '_>>> {
        let start = offset as usize;
        let end = (start + length as usize).min(self.data.len());
        Ok(Box::pin(std::io::Cursor::new(self.data[start..end].to_vec())))
    }
}

struct MemorySource {
    data: Vec<u8>,
}

#[async_trait::async_trait]
impl AsyncPayloadRead for MemorySource {
    async fn open_reader(&self) -> anyhow::Result<Box<dyn PayloadReader>> {
        Ok(Box::new(MemoryReader {
            data: self.data.clone(),
        }))
    }
}

fn extent(start_block: u64, num_blocks: u64) -> Extent {
    Extent {
        start_block: Some(start_block),
        num_blocks: Some(num_blocks),
    }
}

#[tokio::test]
async fn s1_zero_operation_produces_zeroed_image() {
    let partition = PartitionUpdate {
        partition_name: "boot".into(),
        operations: vec![InstallOperation {
            r#type: install_operation::Type::Zero as i32,
            dst_extents: vec![extent(0, 4)],
            ..Default::default()
        }],
        ..Default::default()
    };

    let source: Arc<dyn AsyncPayloadRead> = Arc::new(MemorySource { data: Vec::new() });
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("boot.img");

    dump_partition(&partition, 0, 4096, out_path.clone(), &source, &NoOpReporter, 2)
        .await
        .unwrap();

    let contents = std::fs::read(&out_path).unwrap();
    assert_eq!(contents.len(), 16384);
    assert!(contents.iter().all(|&b| b == 0));
}

#[tokio::test]
async fn s2_replace_operation_writes_data_at_its_extent() {
    let replace_data: Vec<u8> = (1..=8).collect();
    let operation = InstallOperation {
        r#type: install_operation::Type::Replace as i32,
        data_offset: Some(0),
        data_length: Some(replace_data.len() as u64),
        dst_extents: vec![extent(2, 1)],
        ..Default::default()
    };
    let partition = PartitionUpdate {
        partition_name: "vendor".into(),
        operations: vec![operation],
        ..Default::default()
    };

    let source: Arc<dyn AsyncPayloadRead> = Arc::new(MemorySource {
        data: replace_data.clone(),
    });
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("vendor.img");

    dump_partition(&partition, 0, 4096, out_path.clone(), &source, &NoOpReporter, 2)
        .await
        .unwrap();

    let contents = std::fs::read(&out_path).unwrap();
    assert_eq!(contents.len(), 12288);
    assert!(contents[0..8192].iter().all(|&b| b == 0));
    assert_eq!(&contents[8192..8200], &replace_data[..]);
    assert!(contents[8200..12288].iter().all(|&b| b == 0));
}

#[tokio::test]
async fn multiple_operations_in_one_partition_land_at_distinct_extents() {
    let first_data = vec![0xAAu8; 16];
    let second_data = vec![0xBBu8; 16];
    let mut blob = first_data.clone();
    blob.extend_from_slice(&second_data);

    let partition = PartitionUpdate {
        partition_name: "system".into(),
        operations: vec![
            InstallOperation {
                r#type: install_operation::Type::Replace as i32,
                data_offset: Some(0),
                data_length: Some(first_data.len() as u64),
                dst_extents: vec![extent(0, 1)],
                ..Default::default()
            },
            InstallOperation {
                r#type: install_operation::Type::Replace as i32,
                data_offset: Some(first_data.len() as u64),
                data_length: Some(second_data.len() as u64),
                dst_extents: vec![extent(1, 1)],
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    let source: Arc<dyn AsyncPayloadRead> = Arc::new(MemorySource { data: blob });
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("system.img");

    dump_partition(&partition, 0, 16, out_path.clone(), &source, &NoOpReporter, 4)
        .await
        .unwrap();

    let contents = std::fs::read(&out_path).unwrap();
    assert_eq!(contents.len(), 32);
    assert_eq!(&contents[0..16], &first_data[..]);
    assert_eq!(&contents[16..32], &second_data[..]);
}
