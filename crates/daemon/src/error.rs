// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for configuration and the control loop.

/// Errors that can occur while loading configuration or running the loop.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// A configuration rule was violated, or a key was duplicated or
    /// unparseable. Always fatal at startup.
    #[error("configuration error for <{key}>: {detail}")]
    Config { key: String, detail: String },

    /// An invariant that startup validation should have made unreachable
    /// was violated anyway.
    #[error("internal error: {0}")]
    Internal(String),

    /// A kernel file failed outside any more specific subsystem.
    #[error(transparent)]
    Io(#[from] sysfs_io::IoError),

    /// The sensor group failed.
    #[error(transparent)]
    Thermal(#[from] thermal_monitor::ThermalError),

    /// The frequency controller failed.
    #[error(transparent)]
    Freq(#[from] cpufreq_control::FreqError),

    /// The process census failed.
    #[error(transparent)]
    Census(#[from] process_census::CensusError),
}

impl DaemonError {
    pub(crate) fn config(key: &str, detail: impl Into<String>) -> Self {
        Self::Config {
            key: key.to_string(),
            detail: detail.into(),
        }
    }
}
