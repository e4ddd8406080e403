// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust

pub mod constants;
pub mod error;
#[cfg(feature = "remote_zip")]
pub mod http;
pub mod metadata;
pub mod payload;
pub mod readers;
pub mod structs;
pub mod utils;
#[cfg(any(feature = "local_zip", feature = "remote_zip"))]
pub mod zip;

include!(concat!(env!("OUT_DIR"), "/chromeos_update_engine.rs"));
