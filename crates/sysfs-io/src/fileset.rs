// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A glob-resolved set of kernel files.
//!
//! Per-CPU interfaces come as one file per CPU
//! (`/sys/devices/system/cpu/cpu*/cpufreq/scaling_max_freq`), thermal zones
//! as one file per sensor. [`FileSet`] resolves such a pattern once at
//! startup and then addresses the members by index. Glob results come back
//! sorted, so parallel sets resolved from sibling patterns line up
//! index-for-index.

use crate::{IoError, SysFile};
use std::path::Path;

/// An ordered collection of files matched by one glob pattern.
#[derive(Debug, Clone)]
pub struct FileSet {
    pattern: String,
    files: Vec<SysFile>,
}

impl FileSet {
    /// Resolves `pattern` against the filesystem.
    ///
    /// Fails with [`IoError::NoMatch`] when nothing matches — an interface
    /// the caller counted on is absent — and [`IoError::BadPattern`] when
    /// the pattern itself does not parse.
    pub fn from_glob(pattern: &str) -> Result<Self, IoError> {
        let paths = glob::glob(pattern).map_err(|e| IoError::BadPattern {
            pattern: pattern.to_string(),
            detail: e.to_string(),
        })?;
        let files: Vec<SysFile> = paths.flatten().map(SysFile::new).collect();
        if files.is_empty() {
            return Err(IoError::NoMatch {
                pattern: pattern.to_string(),
            });
        }
        Ok(Self {
            pattern: pattern.to_string(),
            files,
        })
    }

    /// The pattern this set was resolved from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Number of matched files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` when the set is empty. Construction rejects empty
    /// sets, so this only holds for manually assembled sets in tests.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Matched paths, in set order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(SysFile::path)
    }

    /// Reads each member's first line as an unsigned integer.
    pub fn read_u64_each(&self) -> Result<Vec<u64>, IoError> {
        self.files.iter().map(SysFile::read_u64).collect()
    }

    /// Reads each member's first line as a whitespace-separated integer
    /// list.
    pub fn read_u64_list_each(&self) -> Result<Vec<Vec<u64>>, IoError> {
        self.files.iter().map(SysFile::read_u64_list).collect()
    }

    /// Overwrites the `index`-th member with a single integer line.
    pub fn write_u64_at(&self, index: usize, value: u64) -> Result<(), IoError> {
        let file = self.files.get(index).ok_or(IoError::BadIndex {
            index,
            len: self.files.len(),
        })?;
        file.write_u64(value)
    }
}
