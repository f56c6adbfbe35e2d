// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for sysfs/procfs file access.

/// Errors that can occur when resolving, reading, or writing kernel files.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Failed to open or read a file.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    /// Failed to create a directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    /// A value read from a file could not be decoded.
    #[error("failed to parse value from {path}: {detail}")]
    Parse { path: String, detail: String },

    /// A glob pattern is syntactically invalid.
    #[error("invalid file pattern '{pattern}': {detail}")]
    BadPattern { pattern: String, detail: String },

    /// A glob pattern matched no files.
    #[error("no files match pattern '{pattern}'")]
    NoMatch { pattern: String },

    /// An index into a file set is out of range.
    #[error("file index {index} out of range for set of {len}")]
    BadIndex { index: usize, len: usize },
}

impl IoError {
    /// Returns `true` for plain read/write failures, as opposed to decode or
    /// pattern errors. Callers that tolerate a vanished file (a `/proc` entry
    /// whose process exited) switch on this.
    pub fn is_io(&self) -> bool {
        matches!(self, IoError::Read { .. } | IoError::Write { .. })
    }
}
