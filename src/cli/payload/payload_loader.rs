// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust

use crate::cli::payload::file_detector::PayloadType;
use crate::cli::ui::ui_print::UiOutput;
use anyhow::{Result, anyhow};
use payload_dumper::DeltaArchiveManifest;
use payload_dumper::payload::dispatcher::AsyncPayloadRead;
use payload_dumper::payload::payload_parser::parse_payload;
use payload_dumper::readers::local_reader::LocalAsyncPayloadReader;
#[cfg(feature = "local_zip")]
use payload_dumper::readers::local_zip_reader::LocalAsyncZipPayloadReader;
#[cfg(feature = "remote_zip")]
use payload_dumper::readers::remote_bin_reader::RemoteAsyncBinPayloadReader;
#[cfg(feature = "remote_zip")]
use payload_dumper::readers::remote_zip_reader::RemoteAsyncZipPayloadReader;
#[cfg(feature = "remote_zip")]
use payload_dumper::utils::format_size;
use std::path::Path;
use std::sync::Arc;

pub struct PayloadInfo {
    pub manifest: DeltaArchiveManifest,
    pub data_offset: u64,
    pub reader: Arc<dyn AsyncPayloadRead>,
}

/// constructs the reader for `payload_type`, then parses the header and
/// manifest through it before handing it back for extraction.
pub async fn load_payload(
    payload_path: &Path,
    payload_type: PayloadType,
    user_agent: Option<&str>,
    ui: &UiOutput,
) -> Result<PayloadInfo> {
    let payload_path_str = payload_path.to_string_lossy().to_string();

    let reader: Arc<dyn AsyncPayloadRead> = match payload_type {
        PayloadType::RemoteZip => {
            #[cfg(feature = "remote_zip")]
            {
                ui.println("- Connecting to remote ZIP archive...");
                let reader =
                    RemoteAsyncZipPayloadReader::new(payload_path_str.clone(), user_agent).await?;
                ui.pb_eprintln(format!(
                    "- Remote ZIP size: {}",
                    format_size(reader.http_reader.content_length)
                ));
                Arc::new(reader)
            }
            #[cfg(not(feature = "remote_zip"))]
            {
                return Err(anyhow!("Remote ZIP requires 'remote_zip' feature"));
            }
        }
        PayloadType::RemoteBin => {
            #[cfg(feature = "remote_zip")]
            {
                ui.println("- Connecting to remote .bin file...");
                let reader =
                    RemoteAsyncBinPayloadReader::new(payload_path_str.clone(), user_agent).await?;
                ui.pb_eprintln(format!(
                    "- Remote .bin size: {}",
                    format_size(reader.http_reader.content_length)
                ));
                Arc::new(reader)
            }
            #[cfg(not(feature = "remote_zip"))]
            {
                return Err(anyhow!("Remote .bin requires 'remote_zip' feature"));
            }
        }
        PayloadType::LocalZip => {
            #[cfg(feature = "local_zip")]
            {
                Arc::new(LocalAsyncZipPayloadReader::new(payload_path.to_path_buf()).await?)
            }
            #[cfg(not(feature = "local_zip"))]
            {
                return Err(anyhow!("Local ZIP requires 'local_zip' feature"));
            }
        }
        PayloadType::LocalBin => {
            Arc::new(LocalAsyncPayloadReader::new(payload_path.to_path_buf()).await?)
        }
    };

    let mut header_reader = reader.open_reader().await?;
    let (manifest, data_offset) = parse_payload(&mut *header_reader).await?;
    drop(header_reader);

    Ok(PayloadInfo {
        manifest,
        data_offset,
        reader,
    })
}
