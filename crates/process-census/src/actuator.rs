// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Job-control signal delivery.
//!
//! The kernel offers no acknowledgement for a signal, and a target may exit
//! between the decision and the `kill` call; both facts make delivery
//! best-effort by construction. Failures are therefore swallowed — a gone
//! target simply shows up as not-live on the next census refresh.
//!
//! The [`Signaler`] trait is the seam that keeps the control loop testable
//! without stopping real processes.

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

/// Sends stop/continue signals to a process.
pub trait Signaler {
    /// Suspends `pid` (SIGSTOP).
    fn stop(&self, pid: i32);

    /// Resumes `pid` (SIGCONT).
    fn cont(&self, pid: i32);
}

/// The real thing: `kill(2)` via nix.
#[derive(Debug, Default, Clone, Copy)]
pub struct KernelSignaler;

impl Signaler for KernelSignaler {
    fn stop(&self, pid: i32) {
        let _ = signal::kill(Pid::from_raw(pid), Signal::SIGSTOP);
    }

    fn cont(&self, pid: i32) {
        let _ = signal::kill(Pid::from_raw(pid), Signal::SIGCONT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn state_of(pid: u32) -> Option<char> {
        let line = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
        line.split_whitespace().nth(2)?.chars().next()
    }

    #[test]
    fn test_stop_and_continue_child() {
        if !std::path::Path::new("/proc").exists() {
            return;
        }
        let mut child = match std::process::Command::new("sleep").arg("30").spawn() {
            Ok(c) => c,
            Err(_) => return,
        };
        let pid = child.id();
        let signaler = KernelSignaler;

        signaler.stop(pid as i32);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(state_of(pid), Some('T'));

        signaler.cont(pid as i32);
        std::thread::sleep(Duration::from_millis(50));
        let state = state_of(pid);
        assert!(state == Some('S') || state == Some('R'), "state: {state:?}");

        let _ = child.kill();
        let _ = child.wait();
    }

    #[test]
    fn test_signalling_a_gone_pid_is_silent() {
        // Near the default pid_max ceiling; nothing should be there.
        let signaler = KernelSignaler;
        signaler.stop(4_194_000);
        signaler.cont(4_194_000);
    }
}
