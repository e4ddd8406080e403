// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust

use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use tokio::fs;

use crate::cli::args::args_def::Args;
use crate::cli::commands::list::list_partitions;
use crate::cli::payload::extractor::extract_partitions;
use crate::cli::payload::file_detector::detect_payload_type;
use crate::cli::payload::partition_filter::filter_partitions;
use crate::cli::payload::payload_loader::load_payload;
use crate::cli::ui::ui_print::UiOutput;
use payload_dumper::constants::DEFAULT_WORKER_COUNT;
use payload_dumper::utils::{format_elapsed_time, format_size};

pub async fn run() -> Result<()> {
    let args = Args::parse();

    let is_stdout = args.out.to_string_lossy() == "-";
    let ui = UiOutput::new(args.quiet, is_stdout);

    let worker_count = args.threads.unwrap_or(DEFAULT_WORKER_COUNT);
    ui.println(format!("- Initialized {} worker(s) per partition", worker_count));

    let start_time = Instant::now();
    let main_pb = ui.create_spinner("Starting...");

    if let Ok(metadata) = fs::metadata(&args.payload_path).await
        && metadata.len() > 1024 * 1024
    {
        ui.pb_eprintln(format!(
            "- Processing file: {}, size: {}",
            args.payload_path.display(),
            format_size(metadata.len())
        ));
    }

    if !is_stdout {
        fs::create_dir_all(&args.out).await?;
    }

    ui.update_spinner(&main_pb, "Detecting file type...");
    let payload_type = detect_payload_type(&args.payload_path, args.user_agent.as_deref()).await?;

    ui.update_spinner(&main_pb, "Parsing payload...");
    let payload_info = load_payload(&args.payload_path, payload_type, args.user_agent.as_deref(), &ui).await?;
    let manifest = payload_info.manifest;
    let data_offset = payload_info.data_offset;

    if let Some(security_patch) = &manifest.security_patch_level {
        ui.pb_eprintln(format!("- Security Patch: {}", security_patch));
    }

    if args.list {
        ui.clear()?;
        println!();
        list_partitions(&manifest, &args.images);
        return Ok(());
    }

    let block_size = manifest.block_size() as u64;

    let partitions_to_extract = filter_partitions(&manifest, &args.images);

    if partitions_to_extract.is_empty() {
        ui.finish_spinner(main_pb, "No partitions to extract");
        ui.clear()?;
        return Ok(());
    }

    ui.println(format!(
        "- Found {} partitions to extract",
        partitions_to_extract.len()
    ));

    ui.update_spinner(&main_pb, "Extracting partitions...");

    let failed_partitions = extract_partitions(
        &args,
        &partitions_to_extract,
        data_offset,
        block_size,
        payload_info.reader,
        &ui,
    )
    .await?;

    let elapsed_time = format_elapsed_time(start_time.elapsed());

    if failed_partitions.is_empty() {
        ui.finish_spinner(
            main_pb,
            format!(
                "All partitions extracted successfully! (in {})",
                elapsed_time
            ),
        );
        ui.println_final(format!(
            "\n- Extraction completed successfully in {}. Output directory: {:?}",
            elapsed_time, args.out,
        ));
    } else {
        ui.finish_spinner(
            main_pb,
            format!(
                "Completed with {} failed partitions. (in {})",
                failed_partitions.len(),
                elapsed_time
            ),
        );
        ui.eprintln_final(format!(
            "\n- Extraction completed with {} failed partitions in {}. Output directory: {:?}",
            failed_partitions.len(),
            elapsed_time,
            args.out,
        ));
    }

    Ok(())
}
