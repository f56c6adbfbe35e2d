// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for frequency control.

/// Errors that can occur when reading or writing cpufreq files.
#[derive(Debug, thiserror::Error)]
pub enum FreqError {
    /// A cpufreq file failed to resolve, read, or write.
    #[error("cpufreq error: {0}")]
    Io(#[from] sysfs_io::IoError),

    /// Two per-CPU vectors that must be parallel have different lengths.
    /// Startup validation is supposed to make this unreachable.
    #[error("per-CPU vector length mismatch for {what}: expected {expected}, got {actual}")]
    CountMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A CPU's published frequency ladder holds no entries.
    #[error("cpu{cpu} reports an empty frequency ladder")]
    EmptyLadder { cpu: usize },
}
