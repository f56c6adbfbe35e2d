// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # templimiter
//!
//! Limits system temperature by reading thermal files, throttling the CPU,
//! and sending SIGSTOP and SIGCONT signals.
//!
//! ## Usage
//! ```bash
//! # Run as a daemon (requires root for frequency writes and signals)
//! templimiter
//!
//! # Run while mirroring log lines to stderr
//! templimiter --debug
//!
//! # Print the compiled-in config path
//! templimiter --which-conf
//! ```

mod logging;

use clap::Parser;
use daemon::{Config, Supervisor};
use std::path::Path;

/// Compiled-in configuration path, overridable at build time via the
/// `TEMPLIMITER_CONFIG_PATH` environment variable.
const CONFIG_PATH: &str = match option_env!("TEMPLIMITER_CONFIG_PATH") {
    Some(path) => path,
    None => "/usr/local/etc/conf.d/templimiter.conf",
};

#[derive(Parser)]
#[command(
    name = "templimiter",
    about = "Limits system temperature by reading thermal files, throttling the cpu, \
             and sending SIGSTOP and SIGCONT signals",
    disable_version_flag = true
)]
struct Cli {
    /// Print the version number and exit.
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Print the configuration file path and exit.
    #[arg(short = 'w', long = "which-conf")]
    which_conf: bool,

    /// Run normally and mirror log lines to stderr.
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Anything beyond the first argument is tolerated but ignored.
    #[arg(hide = true, allow_hyphen_values = true, num_args = 0..)]
    extra: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if !cli.extra.is_empty() {
        eprintln!("Multiple arguments supplied to templimiter. Only the first will be accepted.");
    }

    if cli.version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if cli.which_conf {
        println!("{CONFIG_PATH}");
        return Ok(());
    }

    // Failures before the log file exists can only go to stderr.
    let config = Config::load(Path::new(CONFIG_PATH))?;
    logging::init(Path::new(&config.settings().log_file_path), cli.debug)?;

    tracing::info!("Starting templimiter {}", env!("CARGO_PKG_VERSION"));

    let mut supervisor = Supervisor::new(config);
    if let Err(e) = supervisor.run() {
        tracing::error!("<!--- An error has occurred! ---!>");
        tracing::error!("{e}");
        std::process::exit(1);
    }
    Ok(())
}
