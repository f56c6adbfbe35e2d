// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The live process census.
//!
//! Holds every process observed since startup that has not yet vanished,
//! keyed by pid. A refresh runs in a fixed order: re-sample existing
//! records, drop the dead, then discover newcomers — so a pid that appears
//! mid-refresh gets its baseline on the next pass, never a half-sampled
//! entry.

use crate::{CensusError, ProcessRecord, Whitelist};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Census over a process-table root (normally `/proc`).
#[derive(Debug)]
pub struct Census {
    proc_root: PathBuf,
    records: BTreeMap<i32, ProcessRecord>,
}

impl Census {
    /// Creates an empty census over `proc_root`.
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            records: BTreeMap::new(),
        }
    }

    /// Number of tracked records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no process is tracked yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Re-samples every record, drops dead ones, and folds in newly
    /// appeared pids.
    ///
    /// `cpu_time` is one aggregate snapshot shared by all records in this
    /// pass, so the shares it yields are mutually comparable.
    pub fn refresh(&mut self, whitelist: &Whitelist, cpu_time: u64) -> Result<(), CensusError> {
        for record in self.records.values_mut() {
            record.update(whitelist, cpu_time)?;
        }
        self.records.retain(|_, record| record.is_live());

        for pid in list_pids(&self.proc_root)? {
            if !self.records.contains_key(&pid) {
                let record = ProcessRecord::open(&self.proc_root, pid, whitelist)?;
                self.records.insert(pid, record);
            }
        }
        Ok(())
    }

    /// Records eligible for a stop signal: live, ranked, not spared, not
    /// already stopped by us.
    pub fn signal_candidates(&self) -> Vec<&ProcessRecord> {
        self.records
            .values()
            .filter(|r| {
                r.is_live() && r.is_ready() && !r.is_whitelisted() && !r.is_self_stopped()
            })
            .collect()
    }

    /// Records this daemon has stopped and not yet resumed.
    pub fn self_stopped(&self) -> Vec<&ProcessRecord> {
        self.records
            .values()
            .filter(|r| r.is_live() && r.is_self_stopped())
            .collect()
    }

    /// Returns `true` when any record is currently self-stopped.
    pub fn has_self_stopped(&self) -> bool {
        self.records
            .values()
            .any(|r| r.is_live() && r.is_self_stopped())
    }

    /// Looks up a record.
    pub fn get(&self, pid: i32) -> Option<&ProcessRecord> {
        self.records.get(&pid)
    }

    /// Flags a record as stopped (or resumed) by this daemon.
    pub fn set_self_stopped(&mut self, pid: i32, stopped: bool) {
        if let Some(record) = self.records.get_mut(&pid) {
            record.set_self_stopped(stopped);
        }
    }
}

/// Enumerates the all-digit entries under the process-table root.
fn list_pids(proc_root: &Path) -> Result<Vec<i32>, CensusError> {
    let entries = std::fs::read_dir(proc_root).map_err(|e| sysfs_io::IoError::Read {
        path: proc_root.display().to_string(),
        source: e,
    })?;
    let mut pids = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(pid) = name.parse::<i32>() {
                pids.push(pid);
            }
        }
    }
    pids.sort_unstable();
    Ok(pids)
}
