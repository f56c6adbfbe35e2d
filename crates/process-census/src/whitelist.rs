// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The predicate that spares a process from job-control signals.

use crate::{pattern, ProcStat};

/// Whitelist rules. A process matching *any* rule is never signalled.
///
/// `comms` entries are expected pre-parenthesised (`"(systemd)"`), matching
/// the way the kernel reports `comm`; configuration loading does the
/// wrapping. `max_nice` is a floor: anything nicer than it (lower value,
/// higher priority) is spared. The default of −21 sits below the Linux nice
/// range `[-20, 19]`, so no process passes that rule until an operator
/// raises it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Whitelist {
    pub max_nice: i64,
    pub pids: Vec<i32>,
    pub comms: Vec<String>,
    pub states: Vec<char>,
    pub ppids: Vec<i32>,
    pub pgrps: Vec<i32>,
    pub sessions: Vec<i32>,
    pub tty_nrs: Vec<i32>,
    pub tpgids: Vec<i32>,
    pub flags: Vec<u32>,
}

impl Default for Whitelist {
    fn default() -> Self {
        Self {
            max_nice: -21,
            pids: Vec::new(),
            comms: Vec::new(),
            states: Vec::new(),
            ppids: Vec::new(),
            pgrps: Vec::new(),
            sessions: Vec::new(),
            tty_nrs: Vec::new(),
            tpgids: Vec::new(),
            flags: Vec::new(),
        }
    }
}

impl Whitelist {
    /// Tests a process against every rule.
    pub fn is_whitelisted(&self, pid: i32, stat: &ProcStat) -> bool {
        stat.nice < self.max_nice
            || self.pids.contains(&pid)
            || self.states.contains(&stat.state)
            || self.ppids.contains(&stat.ppid)
            || self.pgrps.contains(&stat.pgrp)
            || self.sessions.contains(&stat.session)
            || self.tty_nrs.contains(&stat.tty_nr)
            || self.tpgids.contains(&stat.tpgid)
            || self.flags.contains(&stat.flags)
            || self
                .comms
                .iter()
                .any(|pat| pattern::matches(pat, &stat.comm))
    }
}
