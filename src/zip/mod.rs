// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 rhythmcache
// https://github.com/rhythmcache/payload-dumper-rust

pub mod zip_io;
#[allow(clippy::module_inception)]
pub mod zip;

#[cfg(feature = "local_zip")]
pub mod local_zip_io;

#[cfg(feature = "local_zip")]
pub mod deflate_reader;
