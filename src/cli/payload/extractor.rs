// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust

use crate::cli::args::args_def::Args;
use crate::cli::ui::cli_reporter::CliExtractionReporter;
use crate::cli::ui::ui_print::UiOutput;
use anyhow::Result;
use payload_dumper::constants::DEFAULT_WORKER_COUNT;
use payload_dumper::payload::dispatcher::{AsyncPayloadRead, dump_partition};
use payload_dumper::PartitionUpdate;
use std::sync::Arc;

/// extracts each partition in turn, each with its own bounded pool of
/// decompress/write workers. Partitions don't run concurrently with each
/// other: the worker pool inside `dump_partition` is where the
/// parallelism lives.
pub async fn extract_partitions(
    args: &Args,
    partitions: &[PartitionUpdate],
    data_offset: u64,
    block_size: u64,
    payload_reader: Arc<dyn AsyncPayloadRead>,
    ui: &UiOutput,
) -> Result<Vec<String>> {
    let worker_count = args.threads.unwrap_or(DEFAULT_WORKER_COUNT);
    let mut failed_partitions = Vec::new();

    for partition in partitions {
        let progress = ui.create_extraction_progress(&partition.partition_name);
        let reporter = CliExtractionReporter::new(progress);
        let output_path = args.out.join(format!("{}.img", &partition.partition_name));

        if let Err(e) = dump_partition(
            partition,
            data_offset,
            block_size,
            output_path,
            &payload_reader,
            &reporter,
            worker_count,
        )
        .await
        {
            ui.error(format!(
                "Failed to process partition {}: {}",
                partition.partition_name, e
            ));
            failed_partitions.push(partition.partition_name.clone());
        }
    }

    Ok(failed_partitions)
}
