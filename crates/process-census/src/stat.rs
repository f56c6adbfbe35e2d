// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Decoding of Linux `stat` lines.
//!
//! Two shapes live here: the per-process line `/proc/<pid>/stat`, whose
//! fields are addressed by whitespace-split index per the Linux convention
//! (1 = `comm`, 2 = state, …, 18 = nice), and the aggregate first line of
//! `/proc/stat`, whose first four numeric columns (user, nice, system,
//! idle, in ticks) sum to the CPU-time denominator for share computation.

use crate::CensusError;
use sysfs_io::SysFile;

/// One parsed `/proc/<pid>/stat` snapshot.
///
/// `comm` keeps the parentheses the kernel wraps it in; whitelist patterns
/// are parenthesised the same way before comparison.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProcStat {
    pub comm: String,
    pub state: char,
    pub ppid: i32,
    pub pgrp: i32,
    pub session: i32,
    pub tty_nr: i32,
    pub tpgid: i32,
    pub flags: u32,
    pub utime: u64,
    pub stime: u64,
    pub cutime: u64,
    pub cstime: u64,
    pub nice: i64,
}

impl Default for ProcStat {
    fn default() -> Self {
        Self {
            comm: String::new(),
            state: '?',
            ppid: 0,
            pgrp: 0,
            session: 0,
            tty_nr: 0,
            tpgid: 0,
            flags: 0,
            utime: 0,
            stime: 0,
            cutime: 0,
            cstime: 0,
            nice: 0,
        }
    }
}

impl ProcStat {
    /// Parses a stat line. The error string names the field that failed.
    pub fn parse(line: &str) -> Result<Self, String> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 19 {
            return Err(format!("expected at least 19 fields, got {}", fields.len()));
        }

        fn num<T: std::str::FromStr>(fields: &[&str], idx: usize, name: &str) -> Result<T, String> {
            fields[idx]
                .parse::<T>()
                .map_err(|_| format!("field {idx} ({name}): '{}' is not numeric", fields[idx]))
        }

        let state = fields[2]
            .chars()
            .next()
            .ok_or_else(|| "field 2 (state): empty".to_string())?;

        Ok(Self {
            comm: fields[1].to_string(),
            state,
            ppid: num(&fields, 3, "ppid")?,
            pgrp: num(&fields, 4, "pgrp")?,
            session: num(&fields, 5, "session")?,
            tty_nr: num(&fields, 6, "tty_nr")?,
            tpgid: num(&fields, 7, "tpgid")?,
            flags: num(&fields, 8, "flags")?,
            utime: num(&fields, 13, "utime")?,
            stime: num(&fields, 14, "stime")?,
            cutime: num(&fields, 15, "cutime")?,
            cstime: num(&fields, 16, "cstime")?,
            nice: num(&fields, 18, "nice")?,
        })
    }

    /// Total ticks this process and its reaped children have consumed.
    pub fn pid_time(&self) -> u64 {
        self.utime + self.stime + self.cutime + self.cstime
    }
}

/// Sums the first four numeric columns of the `/proc/stat` summary line.
///
/// The result bounds every per-process share to `[0, 1]`: no process can
/// accumulate more ticks than the whole machine did.
pub fn total_cpu_time(stat_file: &SysFile) -> Result<u64, CensusError> {
    let lines = stat_file.read_lines()?;
    let first = lines.first().ok_or_else(|| CensusError::Summary {
        detail: format!("{} is empty", stat_file.path().display()),
    })?;

    let columns: Vec<u64> = first
        .split_whitespace()
        .skip(1)
        .take(4)
        .map(|tok| {
            tok.parse::<u64>().map_err(|_| CensusError::Summary {
                detail: format!("'{tok}' is not a tick count"),
            })
        })
        .collect::<Result<_, _>>()?;

    if columns.len() < 4 {
        return Err(CensusError::Summary {
            detail: format!("expected 4 tick columns, got {}", columns.len()),
        });
    }
    Ok(columns.iter().sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    const SAMPLE: &str = "1234 (kworker) S 2 0 0 0 -1 69238880 0 0 0 0 17 28 3 1 20 0 1 0 155 0 0";

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("process_census_stat_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "{content}").unwrap();
        path
    }

    #[test]
    fn test_parse_field_addressing() {
        let stat = ProcStat::parse(SAMPLE).unwrap();
        assert_eq!(stat.comm, "(kworker)");
        assert_eq!(stat.state, 'S');
        assert_eq!(stat.ppid, 2);
        assert_eq!(stat.flags, 69_238_880);
        assert_eq!(stat.utime, 17);
        assert_eq!(stat.stime, 28);
        assert_eq!(stat.cutime, 3);
        assert_eq!(stat.cstime, 1);
        assert_eq!(stat.nice, 0);
    }

    #[test]
    fn test_pid_time_sums_all_four() {
        let stat = ProcStat::parse(SAMPLE).unwrap();
        assert_eq!(stat.pid_time(), 17 + 28 + 3 + 1);
    }

    #[test]
    fn test_parse_negative_nice() {
        let line = "99 (rtkit-daemon) S 1 99 99 0 -1 4194624 0 0 0 0 5 9 0 0 9 -11 3 0 200 0 0";
        let stat = ProcStat::parse(line).unwrap();
        assert_eq!(stat.nice, -11);
    }

    #[test]
    fn test_parse_short_line() {
        let err = ProcStat::parse("42 (x) S 1").unwrap_err();
        assert!(err.contains("19 fields"));
    }

    #[test]
    fn test_parse_non_numeric_field() {
        let line = "1234 (x) S bad 0 0 0 -1 0 0 0 0 0 1 1 1 1 20 0 1 0 1 0 0";
        let err = ProcStat::parse(line).unwrap_err();
        assert!(err.contains("ppid"));
    }

    #[test]
    fn test_total_cpu_time() {
        let p = write_temp("proc_stat", "cpu  100 20 30 400 5 6 7 0 0 0\ncpu0 50 10 15 200 0 0 0 0 0 0\n");
        let total = total_cpu_time(&SysFile::new(&p)).unwrap();
        assert_eq!(total, 100 + 20 + 30 + 400);
        let _ = std::fs::remove_file(&p);
    }

    #[test]
    fn test_total_cpu_time_empty_file() {
        let p = write_temp("proc_stat_empty", "");
        let err = total_cpu_time(&SysFile::new(&p)).unwrap_err();
        assert!(matches!(err, CensusError::Summary { .. }));
        let _ = std::fs::remove_file(&p);
    }

    #[test]
    fn test_total_cpu_time_truncated_line() {
        let p = write_temp("proc_stat_trunc", "cpu  100 20\n");
        let err = total_cpu_time(&SysFile::new(&p)).unwrap_err();
        assert!(matches!(err, CensusError::Summary { .. }));
        let _ = std::fs::remove_file(&p);
    }
}
