// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust
//
// Per-operation extraction. A single dispatcher task reads each operation's
// compressed bytes off the payload source in ascending `data_offset` order
// (the only order that keeps deflated-ZIP and HTTP reads forward-only),
// then hands the owned buffer to a bounded pool of blocking worker threads
// that decompress and write it to its final position. Destination extents
// are manifest-guaranteed disjoint, so workers share the output file
// without locking.

use crate::error::PayloadError;
use crate::install_operation;
use crate::{InstallOperation, PartitionUpdate};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Semaphore;

/// a single positioned read of `length` bytes starting at `offset` from the
/// payload source. Implementations live under `src/readers`.
#[async_trait]
pub trait PayloadReader: Send {
    async fn read_range(
        &mut self,
        offset: u64,
        length: u64,
    ) -> Result<Pin<Box<dyn AsyncRead + Send + '_>>>;
}

/// opens a fresh, partition-scoped `PayloadReader` over the payload's
/// data-blob region. One reader is opened per partition and driven only by
/// the dispatcher task, never shared with workers.
#[async_trait]
pub trait AsyncPayloadRead: Send + Sync {
    async fn open_reader(&self) -> Result<Box<dyn PayloadReader>>;
}

pub trait ProgressReporter: Send + Sync {
    fn on_start(&self, partition_name: &str, total_operations: u64);
    fn on_progress(&self, partition_name: &str, current_op: u64, total_ops: u64);
    fn on_complete(&self, partition_name: &str, total_operations: u64);
    fn on_warning(&self, partition_name: &str, operation_index: usize, message: String);
}

pub struct NoOpReporter;

impl ProgressReporter for NoOpReporter {
    fn on_start(&self, _partition_name: &str, _total_operations: u64) {}
    fn on_progress(&self, _partition_name: &str, _current_op: u64, _total_ops: u64) {}
    fn on_complete(&self, _partition_name: &str, _total_operations: u64) {}
    fn on_warning(&self, _partition_name: &str, _operation_index: usize, _message: String) {}
}

const ZERO_CHUNK: usize = 1024 * 1024;
static ZERO_BUF: Lazy<Arc<[u8]>> = Lazy::new(|| vec![0u8; ZERO_CHUNK].into());

/// cross-platform positioned write, mirroring the teacher's `ZipIO`
/// seek-and-read helpers on the write side.
fn write_at(file: &std::fs::File, buf: &[u8], offset: u64) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileExt;
        file.write_all_at(buf, offset)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::FileExt;
        let mut written = 0;
        while written < buf.len() {
            written += file.seek_write(&buf[written..], offset + written as u64)?;
        }
        Ok(())
    }
}

fn extent_bytes(extents: &[crate::Extent], block_size: u64) -> Vec<(u64, u64)> {
    extents
        .iter()
        .map(|e| {
            (
                e.start_block.unwrap_or(0) * block_size,
                e.num_blocks.unwrap_or(0) * block_size,
            )
        })
        .collect()
}

/// `total_size(P)` per the extraction dispatcher's sizing rule: the furthest
/// byte any operation's destination extents reach, independent of operation
/// order.
fn partition_total_size(partition: &PartitionUpdate, block_size: u64) -> u64 {
    partition
        .operations
        .iter()
        .flat_map(|op| op.dst_extents.iter())
        .map(|e| (e.start_block.unwrap_or(0) + e.num_blocks.unwrap_or(0)) * block_size)
        .max()
        .unwrap_or(0)
}

fn write_extents(file: &std::fs::File, extents: &[(u64, u64)], data: &[u8]) -> Result<()> {
    let mut pos = 0usize;
    for (offset, len) in extents {
        let len = (*len as usize).min(data.len().saturating_sub(pos));
        let chunk = &data[pos..pos + len];
        write_at(file, chunk, *offset).map_err(PayloadError::OutputIoError)?;
        pos += len;
    }
    Ok(())
}

fn write_zero(file: &std::fs::File, extents: &[(u64, u64)]) -> Result<()> {
    for (offset, len) in extents {
        let mut remaining = *len;
        let mut cur = *offset;
        while remaining > 0 {
            let chunk = remaining.min(ZERO_CHUNK as u64) as usize;
            write_at(file, &ZERO_BUF[..chunk], cur).map_err(PayloadError::OutputIoError)?;
            cur += chunk as u64;
            remaining -= chunk as u64;
        }
    }
    Ok(())
}

fn decompress_bz(data: &[u8]) -> Result<Vec<u8>, PayloadError> {
    use std::io::Read;
    let mut decoder = bzip2::read::BzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| PayloadError::CodecError(e.to_string()))?;
    Ok(out)
}

fn decompress_xz(data: &[u8]) -> Result<Vec<u8>, PayloadError> {
    use std::io::Read;
    let mut decoder = liblzma::read::XzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| PayloadError::CodecError(e.to_string()))?;
    Ok(out)
}

/// applies one decoded operation to its destination extents. Runs inside a
/// blocking worker thread.
fn apply_operation(
    op_type: install_operation::Type,
    buffer: Option<Vec<u8>>,
    dst_extents: &[(u64, u64)],
    file: &std::fs::File,
) -> Result<()> {
    use install_operation::Type;
    match op_type {
        Type::Replace => {
            let data = buffer.ok_or_else(|| anyhow!("REPLACE operation carries no data"))?;
            write_extents(file, dst_extents, &data)
        }
        Type::ReplaceBz => {
            let data = buffer.ok_or_else(|| anyhow!("REPLACE_BZ operation carries no data"))?;
            let decompressed = decompress_bz(&data)?;
            write_extents(file, dst_extents, &decompressed)
        }
        Type::ReplaceXz => {
            let data = buffer.ok_or_else(|| anyhow!("REPLACE_XZ operation carries no data"))?;
            let decompressed = decompress_xz(&data)?;
            write_extents(file, dst_extents, &decompressed)
        }
        Type::Zero => write_zero(file, dst_extents),
        other => Err(PayloadError::BadPayload(format!("unsupported operation type: {other:?}")).into()),
    }
}

/// extracts one partition's operations into `output_path`.
#[allow(clippy::too_many_arguments)]
pub async fn dump_partition(
    partition: &PartitionUpdate,
    data_offset: u64,
    block_size: u64,
    output_path: std::path::PathBuf,
    payload_reader: &Arc<dyn AsyncPayloadRead>,
    reporter: &dyn ProgressReporter,
    worker_count: usize,
) -> Result<()> {
    let partition_name = partition.partition_name.clone();
    let total_ops = partition.operations.len() as u64;
    reporter.on_start(&partition_name, total_ops);

    let total_size = partition_total_size(partition, block_size);

    let file = std::fs::File::create(&output_path)
        .map_err(PayloadError::OutputIoError)
        .with_context(|| format!("creating output file for partition {partition_name}"))?;
    if total_size > 0 {
        file.set_len(total_size)
            .map_err(PayloadError::OutputIoError)
            .with_context(|| format!("sizing output file for partition {partition_name}"))?;
    }
    let file = Arc::new(file);

    let mut ops: Vec<(usize, &InstallOperation)> = partition.operations.iter().enumerate().collect();
    ops.sort_by_key(|(_, op)| op.data_offset.unwrap_or(0));

    let semaphore = Arc::new(Semaphore::new(worker_count.max(1)));
    let mut handles = Vec::with_capacity(ops.len());
    let mut source = payload_reader
        .open_reader()
        .await
        .context("opening source reader for partition")?;

    for (index, op) in ops {
        let length = op.data_length.unwrap_or(0);
        let op_offset = op.data_offset.unwrap_or(0);

        let buffer = if length > 0 {
            let mut stream = source
                .read_range(data_offset + op_offset, length)
                .await
                .map_err(|e| anyhow!("{e}"))?;
            let mut buf = vec![0u8; length as usize];
            stream
                .read_exact(&mut buf)
                .await
                .map_err(PayloadError::SourceIoError)?;
            Some(buf)
        } else {
            None
        };

        let dst_extents = extent_bytes(&op.dst_extents, block_size);
        let op_type = op.r#type();
        let file = Arc::clone(&file);
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .expect("semaphore never closed");

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            apply_operation(op_type, buffer, &dst_extents, &file)
        });
        handles.push((index, handle));
    }

    // completion barrier: every operation of this partition finishes before
    // the caller moves on to the next one. Handles are awaited in dispatch
    // (data_offset) order, not completion order, so `completed` still counts
    // up monotonically to `total_ops`.
    let mut completed = 0u64;
    for (index, handle) in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => reporter.on_warning(&partition_name, index, e.to_string()),
            Err(e) => reporter.on_warning(&partition_name, index, format!("worker panicked: {e}")),
        }
        completed += 1;
        reporter.on_progress(&partition_name, completed, total_ops);
    }

    reporter.on_complete(&partition_name, total_ops);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Extent;

    fn extent(start_block: u64, num_blocks: u64) -> Extent {
        Extent {
            start_block: Some(start_block),
            num_blocks: Some(num_blocks),
        }
    }

    fn op_with_dst(start_block: u64, num_blocks: u64) -> InstallOperation {
        InstallOperation {
            r#type: install_operation::Type::Zero as i32,
            dst_extents: vec![extent(start_block, num_blocks)],
            ..Default::default()
        }
    }

    #[test]
    fn total_size_is_max_over_operations_independent_of_order() {
        let block_size = 4096;
        let forward = PartitionUpdate {
            partition_name: "p".into(),
            operations: vec![op_with_dst(0, 2), op_with_dst(10, 4)],
            ..Default::default()
        };
        let reversed = PartitionUpdate {
            operations: vec![op_with_dst(10, 4), op_with_dst(0, 2)],
            ..forward.clone()
        };

        let expected = 14 * block_size;
        assert_eq!(partition_total_size(&forward, block_size), expected);
        assert_eq!(partition_total_size(&reversed, block_size), expected);
    }

    #[test]
    fn total_size_of_empty_partition_is_zero() {
        let partition = PartitionUpdate {
            partition_name: "empty".into(),
            ..Default::default()
        };
        assert_eq!(partition_total_size(&partition, 4096), 0);
    }

    #[test]
    fn apply_operation_zero_fills_destination_extents() {
        let file = tempfile::NamedTempFile::new().unwrap();
        file.as_file().set_len(16384).unwrap();
        apply_operation(
            install_operation::Type::Zero,
            None,
            &[(0, 16384)],
            file.as_file(),
        )
        .unwrap();

        let contents = std::fs::read(file.path()).unwrap();
        assert_eq!(contents.len(), 16384);
        assert!(contents.iter().all(|&b| b == 0));
    }

    #[test]
    fn apply_operation_replace_writes_raw_bytes_at_offset() {
        let file = tempfile::NamedTempFile::new().unwrap();
        file.as_file().set_len(12288).unwrap();
        let data = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        apply_operation(
            install_operation::Type::Replace,
            Some(data.clone()),
            &[(8192, 4096)],
            file.as_file(),
        )
        .unwrap();

        let contents = std::fs::read(file.path()).unwrap();
        assert!(contents[0..8192].iter().all(|&b| b == 0));
        assert_eq!(&contents[8192..8200], &data[..]);
        assert!(contents[8200..12288].iter().all(|&b| b == 0));
    }

    #[test]
    fn apply_operation_rejects_unsupported_type() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = apply_operation(
            install_operation::Type::SourceCopy,
            None,
            &[],
            file.as_file(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("unsupported operation type"));
    }
}
