// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The control loop.
//!
//! One thread, one loop. Each tick samples the hottest sensor, compares it
//! against the hysteretic threshold pairs, and runs whichever corrective
//! action crossed its line: lowering frequency ceilings, pausing the
//! hungriest processes, or undoing either once the temperature falls back
//! through the lower threshold. Between ticks the loop sleeps for the
//! configured period.
//!
//! ```text
//! sensor read ─► decision ─► census refresh ─► freq writes / signals ─► sleep
//! ```
//!
//! A failed sensor or frequency file is fatal by design: a hot machine
//! must not keep running with its thermostat unplugged. A failed signal is
//! ignored; a vanished process surfaces as census churn.

use crate::{Config, DaemonError};
use process_census::{Census, KernelSignaler, Signaler};
use std::time::Duration;

/// The periodic thermal supervisor.
pub struct Supervisor {
    config: Config,
    census: Census,
    signaler: Box<dyn Signaler>,
}

impl Supervisor {
    /// Builds a supervisor over the real process table and kernel signals.
    pub fn new(config: Config) -> Self {
        let proc_root = config.proc_root().to_path_buf();
        Self::with_parts(config, Census::new(proc_root), Box::new(KernelSignaler))
    }

    /// Builds a supervisor with an explicit census and signal backend.
    pub fn with_parts(config: Config, census: Census, signaler: Box<dyn Signaler>) -> Self {
        Self {
            config,
            census,
            signaler,
        }
    }

    /// The census, for inspection.
    pub fn census(&self) -> &Census {
        &self.census
    }

    /// Runs forever, or until the first unrecoverable error.
    pub fn run(&mut self) -> Result<(), DaemonError> {
        let period = Duration::from_millis(self.config.settings.min_sleep);
        loop {
            self.tick()?;
            std::thread::sleep(period);
        }
    }

    /// One pass of the loop: sample, decide, act.
    pub fn tick(&mut self) -> Result<(), DaemonError> {
        let use_throttle = self.config.settings.use_throttle;
        let use_sigstop = self.config.settings.use_sigstop;
        let temp_throttle = self.config.settings.temp_throttle;
        let temp_dethrottle = self.config.settings.temp_dethrottle;
        let temp_sigstop = self.config.settings.temp_sigstop;
        let temp_sigcont = self.config.settings.temp_sigcont;

        let max_temp = self.config.sensors.max_reading()?;

        match (use_throttle, use_sigstop) {
            (true, true) => {
                if max_temp > temp_throttle || max_temp > temp_sigstop {
                    if max_temp > temp_throttle {
                        self.exec_throttle()?;
                    }
                    if max_temp > temp_sigstop {
                        self.exec_stop()?;
                    }
                } else if max_temp < temp_dethrottle || max_temp < temp_sigcont {
                    if max_temp < temp_dethrottle {
                        self.exec_dethrottle()?;
                    }
                    if max_temp < temp_sigcont {
                        self.exec_continue()?;
                    }
                }
            }
            (true, false) => {
                if max_temp > temp_throttle {
                    self.exec_throttle()?;
                } else if max_temp < temp_dethrottle {
                    self.exec_dethrottle()?;
                }
            }
            (false, true) => {
                if max_temp > temp_sigstop {
                    self.exec_stop()?;
                } else if max_temp < temp_sigcont {
                    self.exec_continue()?;
                }
            }
            (false, false) => {
                return Err(DaemonError::Internal(
                    "neither throttling nor SIGSTOP operations are enabled".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Lowers ceilings one step, if any CPU still has room below it.
    fn exec_throttle(&mut self) -> Result<(), DaemonError> {
        let freq = self.config.freq()?;
        let current = freq.read_current()?;
        if freq.any_above_min(&current) {
            tracing::info!("Throttling CPU.");
            freq.throttle(&current)?;
        }
        Ok(())
    }

    /// Raises ceilings one step, if any CPU still has room above it.
    fn exec_dethrottle(&mut self) -> Result<(), DaemonError> {
        let freq = self.config.freq()?;
        let current = freq.read_current()?;
        if freq.any_below_max(&current) {
            tracing::info!("Dethrottling CPU.");
            freq.dethrottle(&current)?;
        }
        Ok(())
    }

    /// Refreshes the census so rankings reflect this tick, then pauses the
    /// hungriest candidate (stepwise) or all of them.
    fn exec_stop(&mut self) -> Result<(), DaemonError> {
        self.refresh_census()?;
        let stepwise = self.config.settings.use_stepwise_sigstop;

        let targets: Vec<(i32, String)> = {
            let candidates = self.census.signal_candidates();
            if stepwise {
                candidates
                    .iter()
                    .max_by(|a, b| a.cpu_share().total_cmp(&b.cpu_share()))
                    .map(|r| vec![(r.pid(), r.comm().to_string())])
                    .unwrap_or_default()
            } else {
                candidates
                    .iter()
                    .map(|r| (r.pid(), r.comm().to_string()))
                    .collect()
            }
        };

        for (pid, comm) in targets {
            if stepwise {
                tracing::info!("Sending SIGSTOP to pid {pid} {comm}");
            }
            self.signaler.stop(pid);
            self.census.set_self_stopped(pid, true);
        }
        Ok(())
    }

    /// Resumes the least-hungry self-stopped process (stepwise) or all of
    /// them. Does nothing when nothing is stopped.
    fn exec_continue(&mut self) -> Result<(), DaemonError> {
        if !self.census.has_self_stopped() {
            return Ok(());
        }
        self.refresh_census()?;
        let stepwise = self.config.settings.use_stepwise_sigcont;

        let targets: Vec<(i32, String)> = {
            let stopped = self.census.self_stopped();
            if stepwise {
                stopped
                    .iter()
                    .min_by(|a, b| a.cpu_share().total_cmp(&b.cpu_share()))
                    .map(|r| vec![(r.pid(), r.comm().to_string())])
                    .unwrap_or_default()
            } else {
                stopped
                    .iter()
                    .map(|r| (r.pid(), r.comm().to_string()))
                    .collect()
            }
        };

        for (pid, comm) in targets {
            if stepwise {
                tracing::info!("Sending SIGCONT to pid {pid} {comm}");
            }
            self.signaler.cont(pid);
            self.census.set_self_stopped(pid, false);
        }
        Ok(())
    }

    fn refresh_census(&mut self) -> Result<(), DaemonError> {
        let cpu_time = process_census::total_cpu_time(self.config.proc_stat()?)?;
        let whitelist = self.config.whitelist()?;
        self.census.refresh(whitelist, cpu_time)?;
        Ok(())
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("use_throttle", &self.config.settings.use_throttle)
            .field("use_sigstop", &self.config.settings.use_sigstop)
            .field("census_len", &self.census.len())
            .finish()
    }
}
