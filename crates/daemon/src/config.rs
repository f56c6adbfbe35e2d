// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Startup configuration: cross-field validation and materialization of
//! the kernel interfaces the loop consumes.
//!
//! [`Config`] turns parsed [`Settings`] into live components — sensor
//! group, frequency controller, aggregate-CPU file, whitelist — and
//! enforces every rule the loop later relies on, so the loop itself can
//! treat violations as unreachable.

use crate::{DaemonError, Settings};
use cpufreq_control::FreqController;
use process_census::Whitelist;
use sysfs_io::{FileSet, IoError, SysFile};
use thermal_monitor::{SensorGroup, ThermalError};

const PROC_SELF_STAT: &str = "/proc/self/stat";

/// Validated configuration with its derived kernel-file handles.
#[derive(Debug)]
pub struct Config {
    pub(crate) settings: Settings,
    pub(crate) own_pid: i32,
    pub(crate) whitelist: Whitelist,
    pub(crate) sensors: SensorGroup,
    pub(crate) freq: Option<FreqController>,
    pub(crate) proc_stat: Option<SysFile>,
    pub(crate) proc_root: std::path::PathBuf,
}

impl Config {
    /// Reads, parses, and materializes the config file at `path`.
    pub fn load(path: &std::path::Path) -> Result<Self, DaemonError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DaemonError::config(
                "config",
                format!("cannot read config file '{}': {e}", path.display()),
            )
        })?;
        let settings = Settings::parse(&text)?;
        Self::from_settings(settings)
    }

    /// Materializes already-parsed settings against the real `/proc`.
    pub fn from_settings(settings: Settings) -> Result<Self, DaemonError> {
        Self::from_settings_rooted(settings, std::path::Path::new("/proc"))
    }

    /// Materializes already-parsed settings against an explicit
    /// process-table root. Everything but `/proc` is a synthetic tree in a
    /// test.
    ///
    /// This is where every rule of the config contract is enforced: mode
    /// selection, hysteretic threshold ordering, per-CPU file-count
    /// agreement, sensor presence, and the own-PID whitelist entry. The
    /// ladder glob is the one soft failure: absent ladder files demote the
    /// controller to hw-min/max stepping with a logged warning.
    pub fn from_settings_rooted(
        mut settings: Settings,
        proc_root: &std::path::Path,
    ) -> Result<Self, DaemonError> {
        if !settings.use_throttle && !settings.use_sigstop {
            return Err(DaemonError::config(
                "use_throttle",
                "cannot choose false for both <use_throttle> and <use_SIGSTOP>",
            ));
        }

        let own_pid = read_own_pid()?;

        let sensors = match SensorGroup::from_glob(&settings.matcher_thermal) {
            Ok(group) => group,
            Err(ThermalError::Io(IoError::NoMatch { pattern })) => {
                return Err(DaemonError::config(
                    "matcher_thermal",
                    format!("no thermal files match '{pattern}'"),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let freq = if settings.use_throttle {
            if settings.temp_throttle < settings.temp_dethrottle {
                return Err(DaemonError::config(
                    "temp_throttle",
                    "throttle temp must not be lower than dethrottle temp",
                ));
            }
            Some(build_controller(&mut settings)?)
        } else {
            // With throttling off, park its thresholds where the shared
            // loop structure can never cross them.
            settings.temp_throttle = u64::MAX;
            settings.temp_dethrottle = 0;
            None
        };

        let proc_stat = if settings.use_sigstop {
            if settings.temp_sigstop < settings.temp_sigcont {
                return Err(DaemonError::config(
                    "temp_SIGSTOP",
                    "SIGSTOP temp must not be lower than SIGCONT temp",
                ));
            }
            let stat = SysFile::new(proc_root.join("stat"));
            if stat.read_lines()?.is_empty() {
                return Err(DaemonError::Internal(format!(
                    "could not load a valid {} file",
                    stat.path().display()
                )));
            }
            Some(stat)
        } else {
            settings.temp_sigstop = u64::MAX;
            settings.temp_sigcont = 0;
            None
        };

        let whitelist = build_whitelist(&settings, own_pid);

        Ok(Self {
            settings,
            own_pid,
            whitelist,
            sensors,
            freq,
            proc_stat,
            proc_root: proc_root.to_path_buf(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn own_pid(&self) -> i32 {
        self.own_pid
    }

    /// The process-table root the census enumerates.
    pub fn proc_root(&self) -> &std::path::Path {
        &self.proc_root
    }

    pub fn sensors(&self) -> &SensorGroup {
        &self.sensors
    }

    /// The frequency controller. Asking for it with throttling disabled is
    /// a programming error, not a user error.
    pub fn freq(&self) -> Result<&FreqController, DaemonError> {
        self.freq.as_ref().ok_or_else(|| {
            DaemonError::Internal(
                "attempted to access the frequency controller without throttle mode".to_string(),
            )
        })
    }

    /// The whitelist driving signal-candidate selection.
    pub fn whitelist(&self) -> Result<&Whitelist, DaemonError> {
        if !self.settings.use_sigstop {
            return Err(DaemonError::Internal(
                "attempted to access the whitelist without SIGSTOP mode".to_string(),
            ));
        }
        Ok(&self.whitelist)
    }

    /// The aggregate CPU-time file.
    pub fn proc_stat(&self) -> Result<&SysFile, DaemonError> {
        self.proc_stat.as_ref().ok_or_else(|| {
            DaemonError::Internal(
                "attempted to access the CPU summary without SIGSTOP mode".to_string(),
            )
        })
    }
}

/// First whitespace field of `/proc/self/stat` is our own pid.
fn read_own_pid() -> Result<i32, DaemonError> {
    let line = SysFile::new(PROC_SELF_STAT).read_first_line()?;
    let field = line.split_whitespace().next().ok_or_else(|| {
        DaemonError::Internal(format!("{PROC_SELF_STAT} is missing the pid field"))
    })?;
    field
        .parse::<i32>()
        .map_err(|_| DaemonError::Internal(format!("{PROC_SELF_STAT} pid field: '{field}'")))
}

/// Builds the whitelist from settings, prepending our own pid and wrapping
/// each command pattern in the parentheses the kernel puts around `comm`.
fn build_whitelist(settings: &Settings, own_pid: i32) -> Whitelist {
    let mut pids = Vec::with_capacity(settings.whitelist_pid.len() + 1);
    pids.push(own_pid);
    pids.extend_from_slice(&settings.whitelist_pid);

    Whitelist {
        max_nice: settings.whitelist_max_nice,
        pids,
        comms: settings
            .whitelist_comm
            .iter()
            .map(|c| format!("({c})"))
            .collect(),
        states: settings.whitelist_state.clone(),
        ppids: settings.whitelist_ppid.clone(),
        pgrps: settings.whitelist_pgrp.clone(),
        sessions: settings.whitelist_session.clone(),
        tty_nrs: settings.whitelist_tty_nr.clone(),
        tpgids: settings.whitelist_tpgid.clone(),
        flags: settings.whitelist_flags.clone(),
    }
}

/// Resolves every cpufreq file set and assembles the controller.
fn build_controller(settings: &mut Settings) -> Result<FreqController, DaemonError> {
    let ceilings = resolve(&settings.matcher_scaling_max_freq, "matcher_scaling_max_freq")?;
    let hw_max_files = resolve(&settings.matcher_cpuinfo_max_freq, "matcher_cpuinfo_max_freq")?;
    let hw_min_files = resolve(&settings.matcher_cpuinfo_min_freq, "matcher_cpuinfo_min_freq")?;

    let n = ceilings.len();
    if hw_max_files.len() != n {
        return Err(DaemonError::config(
            "matcher_cpuinfo_max_freq",
            format!(
                "matched {} files but {} scaling_max_freq files",
                hw_max_files.len(),
                n
            ),
        ));
    }
    if hw_min_files.len() != n {
        return Err(DaemonError::config(
            "matcher_cpuinfo_min_freq",
            format!(
                "matched {} files but {} scaling_max_freq files",
                hw_min_files.len(),
                n
            ),
        ));
    }

    let hw_max = hw_max_files.read_u64_each()?;
    let hw_min = hw_min_files.read_u64_each()?;
    let controller = FreqController::new(ceilings, hw_max, hw_min)?;

    if !settings.use_scaling_available {
        return Ok(controller);
    }

    match FileSet::from_glob(&settings.matcher_scaling_available_frequencies) {
        Ok(ladder_files) => {
            if ladder_files.len() != n {
                return Err(DaemonError::config(
                    "matcher_scaling_available_frequencies",
                    format!(
                        "matched {} files but {} scaling_max_freq files",
                        ladder_files.len(),
                        n
                    ),
                ));
            }
            let ladders = ladder_files.read_u64_list_each()?;
            Ok(controller.with_ladders(ladders)?)
        }
        Err(IoError::NoMatch { pattern }) => {
            tracing::warn!(
                "scaling_available_frequencies files not found under '{pattern}'; \
                 disabling ladder stepping"
            );
            settings.use_scaling_available = false;
            Ok(controller)
        }
        Err(e) => Err(e.into()),
    }
}

fn resolve(pattern: &str, key: &str) -> Result<FileSet, DaemonError> {
    match FileSet::from_glob(pattern) {
        Ok(set) => Ok(set),
        Err(IoError::NoMatch { pattern }) => Err(DaemonError::config(
            key,
            format!("no files match '{pattern}'"),
        )),
        Err(e) => Err(e.into()),
    }
}
