// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A single sysfs/procfs file.
//!
//! Kernel interface files hold short, newline-terminated text: one integer
//! per line, or one whitespace-separated list. [`SysFile`] wraps a path and
//! decodes those shapes. Every read hits the filesystem — these files change
//! underneath us and caching would return stale kernel state.

use crate::IoError;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Handle to one kernel-provided file.
#[derive(Debug, Clone)]
pub struct SysFile {
    path: PathBuf,
}

impl SysFile {
    /// Wraps a path. The file is not touched until the first read or write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the wrapped path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the file currently exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }

    /// Reads the whole file and returns its lines.
    pub fn read_lines(&self) -> Result<Vec<String>, IoError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| IoError::Read {
            path: self.display(),
            source: e,
        })?;
        Ok(content.lines().map(str::to_string).collect())
    }

    /// Reads the first line, trimmed.
    pub fn read_first_line(&self) -> Result<String, IoError> {
        let lines = self.read_lines()?;
        match lines.into_iter().next() {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(IoError::Parse {
                path: self.display(),
                detail: "file is empty".to_string(),
            }),
        }
    }

    /// Reads the first line as a single unsigned integer.
    pub fn read_u64(&self) -> Result<u64, IoError> {
        let line = self.read_first_line()?;
        line.parse::<u64>().map_err(|_| IoError::Parse {
            path: self.display(),
            detail: format!("expected integer, got '{line}'"),
        })
    }

    /// Reads the first line as a whitespace-separated list of unsigned
    /// integers.
    pub fn read_u64_list(&self) -> Result<Vec<u64>, IoError> {
        let line = self.read_first_line()?;
        line.split_whitespace()
            .map(|tok| {
                tok.parse::<u64>().map_err(|_| IoError::Parse {
                    path: self.display(),
                    detail: format!("expected integer list, got '{tok}'"),
                })
            })
            .collect()
    }

    /// Overwrites the file with a single integer line.
    ///
    /// Kernel frequency files accept exactly this shape: one value, one
    /// newline, truncating whatever was there.
    pub fn write_u64(&self, value: u64) -> Result<(), IoError> {
        let mut f = std::fs::File::create(&self.path).map_err(|e| IoError::Write {
            path: self.display(),
            source: e,
        })?;
        writeln!(f, "{value}").map_err(|e| IoError::Write {
            path: self.display(),
            source: e,
        })
    }
}

/// Creates every missing parent directory of `path`.
pub fn ensure_parent_dirs(path: &Path) -> Result<(), IoError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| IoError::CreateDir {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}
