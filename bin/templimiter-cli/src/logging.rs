// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tracing initialization.
//!
//! All daemon output goes to the configured log file as timestamped,
//! newline-terminated lines; `--debug` adds a mirror layer on stderr. The
//! log file's parent directories are created on demand — a first boot has
//! no `/var/log` entry for us yet.

use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber: a file layer, plus stderr in debug mode.
pub fn init(log_path: &Path, debug: bool) -> anyhow::Result<()> {
    sysfs_io::ensure_parent_dirs(log_path)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_target(false);

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if debug {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .with_target(false),
            )
            .init();
    } else {
        registry.init();
    }
    Ok(())
}
