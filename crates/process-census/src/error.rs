// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the process census.

/// Errors that can occur while enumerating or sampling processes.
#[derive(Debug, thiserror::Error)]
pub enum CensusError {
    /// Reading the process table root or a kernel file failed.
    ///
    /// Note that a read failure on one process's own stat file is *not*
    /// reported this way — the record is marked not-live instead, because a
    /// vanished process is ordinary churn.
    #[error("process table error: {0}")]
    Io(#[from] sysfs_io::IoError),

    /// A process's stat line was readable but did not decode.
    #[error("malformed stat line for pid {pid}: {detail}")]
    Stat { pid: i32, detail: String },

    /// The aggregate CPU summary (`/proc/stat` first line) was unusable.
    /// The kernel always provides this file; an empty or truncated read
    /// means the environment is broken.
    #[error("unusable CPU time summary: {detail}")]
    Summary { detail: String },
}
