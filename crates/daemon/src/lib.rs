// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # daemon
//!
//! Ties the thermal sensors, frequency controller, and process census into
//! the temperature-limiting control loop, and owns the configuration that
//! wires them together.
//!
//! - [`Settings`] — the parsed config file (line-oriented plaintext).
//! - [`Config`] — validated settings plus the materialized kernel-file
//!   handles the loop consumes.
//! - [`Supervisor`] — the periodic loop itself, with a testable
//!   [`Supervisor::tick`].
//!
//! # Example
//! ```no_run
//! use daemon::{Config, Supervisor};
//!
//! let config = Config::load(std::path::Path::new("/usr/local/etc/conf.d/templimiter.conf"))?;
//! let mut supervisor = Supervisor::new(config);
//! supervisor.run()?;
//! # Ok::<(), daemon::DaemonError>(())
//! ```

mod config;
mod error;
mod settings;
mod supervisor;

pub use config::Config;
pub use error::DaemonError;
pub use settings::{Settings, DEFAULT_WHITELIST_COMM};
pub use supervisor::Supervisor;
