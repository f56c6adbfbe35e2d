// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! One tracked process.
//!
//! A record is born the first time its pid shows up under the process-table
//! root and lives until its stat file stops being readable. CPU share needs
//! two samples: the first `update` stores a baseline, the second and later
//! ones compute `Δpid_time / Δcpu_time` and mark the record ready for
//! ranking.

use crate::{CensusError, ProcStat, Whitelist};
use std::path::Path;
use sysfs_io::SysFile;

/// A live-process snapshot with sampling state.
#[derive(Debug, Clone)]
pub struct ProcessRecord {
    pid: i32,
    pid_str: String,
    stat_file: SysFile,
    stat: ProcStat,
    live: bool,
    whitelisted: bool,
    has_prior_sample: bool,
    ready: bool,
    self_stopped: bool,
    pid_time_prev: u64,
    cpu_time_prev: u64,
    cpu_share: f64,
}

impl ProcessRecord {
    /// Opens a record for `pid` under `proc_root`, taking its first stat
    /// snapshot.
    ///
    /// A process that exits between enumeration and this first read yields
    /// a not-live record, which the next census refresh drops. Decode
    /// failures on a readable file propagate.
    pub fn open(proc_root: &Path, pid: i32, whitelist: &Whitelist) -> Result<Self, CensusError> {
        let pid_str = pid.to_string();
        let stat_file = SysFile::new(proc_root.join(&pid_str).join("stat"));
        let mut record = Self {
            pid,
            pid_str,
            stat_file,
            stat: ProcStat::default(),
            live: false,
            whitelisted: false,
            has_prior_sample: false,
            ready: false,
            self_stopped: false,
            pid_time_prev: 0,
            cpu_time_prev: 0,
            cpu_share: 0.0,
        };
        record.read_stat()?;
        if record.live {
            record.whitelisted = whitelist.is_whitelisted(record.pid, &record.stat);
        }
        Ok(record)
    }

    /// Re-reads the stat file into `self.stat`, flipping `live` to reflect
    /// readability. Only decode errors propagate.
    fn read_stat(&mut self) -> Result<(), CensusError> {
        match self.stat_file.read_first_line() {
            Ok(line) => {
                self.stat = ProcStat::parse(&line).map_err(|detail| CensusError::Stat {
                    pid: self.pid,
                    detail,
                })?;
                self.live = true;
                Ok(())
            }
            Err(e) if e.is_io() => {
                self.live = false;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Takes a fresh sample against the aggregate `cpu_time` denominator.
    ///
    /// A whitelisted process keeps no sampling state: its share is pinned
    /// to zero and its baseline is discarded, so a process leaving the
    /// whitelist starts sampling from scratch.
    pub fn update(&mut self, whitelist: &Whitelist, cpu_time: u64) -> Result<(), CensusError> {
        self.read_stat()?;
        if !self.live {
            return Ok(());
        }
        self.whitelisted = whitelist.is_whitelisted(self.pid, &self.stat);
        if self.whitelisted {
            self.pid_time_prev = 0;
            self.cpu_time_prev = 0;
            self.cpu_share = 0.0;
            self.has_prior_sample = false;
            return Ok(());
        }

        let pid_time = self.stat.pid_time();
        if !self.has_prior_sample {
            self.pid_time_prev = pid_time;
            self.cpu_time_prev = cpu_time;
            self.has_prior_sample = true;
        } else {
            let pid_diff = pid_time.saturating_sub(self.pid_time_prev) as f64;
            let cpu_diff = cpu_time.saturating_sub(self.cpu_time_prev) as f64;
            // cpu_time is monotone across a tick in practice; a zero delta
            // yields a zero share rather than a NaN.
            self.cpu_share = if cpu_diff > 0.0 { pid_diff / cpu_diff } else { 0.0 };
            self.pid_time_prev = pid_time;
            self.cpu_time_prev = cpu_time;
            self.ready = true;
        }
        Ok(())
    }

    pub fn pid(&self) -> i32 {
        self.pid
    }

    pub fn pid_str(&self) -> &str {
        &self.pid_str
    }

    /// The kernel-reported command name, parentheses included.
    pub fn comm(&self) -> &str {
        &self.stat.comm
    }

    pub fn stat(&self) -> &ProcStat {
        &self.stat
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn is_whitelisted(&self) -> bool {
        self.whitelisted
    }

    /// `true` once a second sample has defined `cpu_share`.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_self_stopped(&self) -> bool {
        self.self_stopped
    }

    /// Fraction of aggregate CPU time consumed between the last two
    /// samples.
    pub fn cpu_share(&self) -> f64 {
        self.cpu_share
    }

    pub(crate) fn set_self_stopped(&mut self, stopped: bool) {
        self.self_stopped = stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn proc_fixture(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("process_census_record_test").join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_stat(root: &Path, pid: i32, utime: u64, stime: u64) {
        let dir = root.join(pid.to_string());
        std::fs::create_dir_all(&dir).unwrap();
        let mut f = std::fs::File::create(dir.join("stat")).unwrap();
        writeln!(
            f,
            "{pid} (worker) S 1 {pid} {pid} 0 -1 4194304 0 0 0 0 {utime} {stime} 0 0 20 0 1 0 100 0 0"
        )
        .unwrap();
    }

    #[test]
    fn test_two_samples_define_share() {
        let root = proc_fixture("share");
        write_stat(&root, 101, 10, 10);
        let wl = Whitelist::default();
        let mut rec = ProcessRecord::open(&root, 101, &wl).unwrap();
        assert!(rec.is_live());
        assert!(!rec.is_ready());

        rec.update(&wl, 1000).unwrap();
        assert!(!rec.is_ready(), "first sample is only a baseline");

        write_stat(&root, 101, 30, 40);
        rec.update(&wl, 1100).unwrap();
        assert!(rec.is_ready());
        // Δpid = (30+40)-(10+10) = 50, Δcpu = 100.
        assert!((rec.cpu_share() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_share_stays_in_unit_interval() {
        let root = proc_fixture("bounds");
        write_stat(&root, 7, 0, 0);
        let wl = Whitelist::default();
        let mut rec = ProcessRecord::open(&root, 7, &wl).unwrap();
        rec.update(&wl, 100).unwrap();
        write_stat(&root, 7, 50, 0);
        rec.update(&wl, 200).unwrap();
        assert!(rec.cpu_share() >= 0.0);
        assert!(rec.cpu_share() <= 1.0 + 1e-9);
    }

    #[test]
    fn test_zero_cpu_delta_gives_zero_share() {
        let root = proc_fixture("zerodelta");
        write_stat(&root, 8, 5, 5);
        let wl = Whitelist::default();
        let mut rec = ProcessRecord::open(&root, 8, &wl).unwrap();
        rec.update(&wl, 500).unwrap();
        write_stat(&root, 8, 9, 5);
        rec.update(&wl, 500).unwrap();
        assert_eq!(rec.cpu_share(), 0.0);
    }

    #[test]
    fn test_vanished_process_goes_not_live() {
        let root = proc_fixture("vanish");
        write_stat(&root, 55, 1, 1);
        let wl = Whitelist::default();
        let mut rec = ProcessRecord::open(&root, 55, &wl).unwrap();
        assert!(rec.is_live());

        std::fs::remove_dir_all(root.join("55")).unwrap();
        rec.update(&wl, 100).unwrap();
        assert!(!rec.is_live());
    }

    #[test]
    fn test_whitelisted_resets_sampling() {
        let root = proc_fixture("wl_reset");
        write_stat(&root, 60, 10, 0);
        let spare_60 = Whitelist {
            pids: vec![60],
            ..Default::default()
        };
        let open_wl = Whitelist::default();
        let mut rec = ProcessRecord::open(&root, 60, &open_wl).unwrap();
        rec.update(&open_wl, 100).unwrap();

        rec.update(&spare_60, 200).unwrap();
        assert!(rec.is_whitelisted());
        assert_eq!(rec.cpu_share(), 0.0);

        // Leaving the whitelist starts over: baseline first, share second.
        write_stat(&root, 60, 20, 0);
        rec.update(&open_wl, 300).unwrap();
        write_stat(&root, 60, 25, 0);
        rec.update(&open_wl, 400).unwrap();
        assert!((rec.cpu_share() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_stat_propagates() {
        let root = proc_fixture("malformed");
        let dir = root.join("70");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stat"), "70 (x) S nonsense\n").unwrap();
        let wl = Whitelist::default();
        let err = ProcessRecord::open(&root, 70, &wl).unwrap_err();
        assert!(matches!(err, CensusError::Stat { pid: 70, .. }));
    }
}
