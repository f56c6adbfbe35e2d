// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # process-census
//!
//! Keeps a live census of the processes under a process-table root
//! (normally `/proc`), computes each one's share of aggregate CPU time
//! between consecutive samples, applies a whitelist of processes that must
//! never be paused, and delivers SIGSTOP/SIGCONT to the rest.
//!
//! # Record lifecycle
//!
//! ```text
//! appears under /proc ──► baseline sample ──► ready (share defined)
//!        │                                      │        ▲
//!        │                                   stop│        │cont
//!        │                                      ▼        │
//!        │                                  self-stopped ┘
//!        └── stat unreadable ──► not-live ──► dropped on next refresh
//! ```
//!
//! # Example
//! ```no_run
//! use process_census::{Census, Whitelist};
//! use sysfs_io::SysFile;
//!
//! let whitelist = Whitelist::default();
//! let mut census = Census::new("/proc");
//! let cpu_time = process_census::total_cpu_time(&SysFile::new("/proc/stat")).unwrap();
//! census.refresh(&whitelist, cpu_time).unwrap();
//! for record in census.signal_candidates() {
//!     println!("{} {} {:.3}", record.pid(), record.comm(), record.cpu_share());
//! }
//! ```

mod actuator;
mod census;
mod error;
pub mod pattern;
mod record;
mod stat;
mod whitelist;

pub use actuator::{KernelSignaler, Signaler};
pub use census::Census;
pub use error::CensusError;
pub use record::ProcessRecord;
pub use stat::{total_cpu_time, ProcStat};
pub use whitelist::Whitelist;
