// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The configuration file dialect.
//!
//! One directive per line: the first space-separated token is the key, the
//! rest are values. Runs of spaces collapse; `\ ` keeps a literal space
//! inside a token (other backslash sequences pass through untouched so the
//! whitelist matcher can see its own escapes). Blank lines and unknown keys
//! are ignored. A recognized key may appear at most once; a recognized key
//! with no values falls back to its default.

use crate::DaemonError;
use std::collections::HashSet;

/// Command names spared by default: the session and system plumbing that
/// must never be paused out from under the user.
pub const DEFAULT_WHITELIST_COMM: &[&str] = &[
    "dnsmasq",
    "systemd",
    "(sd-pam)",
    "startx",
    "xinit",
    "Xorg",
    "dbus-daemon",
    "rtkit-daemon",
    "at-spi-bus-laun",
    "at-spi2-registr",
    "wpa_supplicant",
    "dhcpcd",
    "systemd-journal",
    "lvmetad",
    "systemd-udevd",
    "upowerd",
    "systemd-timesyn",
    "systemd-machine",
    "firewalld",
    "systemd-logind",
    "polkitd",
    "haveged",
    "systemd-resolve",
    "systemd-network",
];

/// Raw configuration values, before any filesystem materialization.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Settings {
    pub log_file_path: String,
    pub whitelist_pid: Vec<i32>,
    pub whitelist_comm: Vec<String>,
    pub whitelist_state: Vec<char>,
    pub whitelist_ppid: Vec<i32>,
    pub whitelist_pgrp: Vec<i32>,
    pub whitelist_session: Vec<i32>,
    pub whitelist_tty_nr: Vec<i32>,
    pub whitelist_tpgid: Vec<i32>,
    pub whitelist_flags: Vec<u32>,
    pub whitelist_max_nice: i64,
    pub matcher_thermal: String,
    pub matcher_scaling_max_freq: String,
    pub matcher_cpuinfo_max_freq: String,
    pub matcher_cpuinfo_min_freq: String,
    pub matcher_scaling_available_frequencies: String,
    pub use_throttle: bool,
    pub use_sigstop: bool,
    pub use_scaling_available: bool,
    pub use_stepwise_sigstop: bool,
    pub use_stepwise_sigcont: bool,
    pub temp_sigstop: u64,
    pub temp_sigcont: u64,
    pub temp_throttle: u64,
    pub temp_dethrottle: u64,
    pub min_sleep: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_file_path: "/var/log/templimiter.log".to_string(),
            whitelist_pid: Vec::new(),
            whitelist_comm: DEFAULT_WHITELIST_COMM
                .iter()
                .map(|s| s.to_string())
                .collect(),
            whitelist_state: Vec::new(),
            whitelist_ppid: Vec::new(),
            whitelist_pgrp: Vec::new(),
            whitelist_session: Vec::new(),
            whitelist_tty_nr: Vec::new(),
            whitelist_tpgid: Vec::new(),
            whitelist_flags: Vec::new(),
            whitelist_max_nice: -21,
            matcher_thermal: "/sys/devices/virtual/thermal/thermal_zone*/temp".to_string(),
            matcher_scaling_max_freq: "/sys/devices/system/cpu/cpu*/cpufreq/scaling_max_freq"
                .to_string(),
            matcher_cpuinfo_max_freq: "/sys/devices/system/cpu/cpu*/cpufreq/cpuinfo_max_freq"
                .to_string(),
            matcher_cpuinfo_min_freq: "/sys/devices/system/cpu/cpu*/cpufreq/cpuinfo_min_freq"
                .to_string(),
            matcher_scaling_available_frequencies:
                "/sys/devices/system/cpu/cpu*/cpufreq/scaling_available_frequencies".to_string(),
            use_throttle: true,
            use_sigstop: false,
            use_scaling_available: false,
            use_stepwise_sigstop: true,
            use_stepwise_sigcont: false,
            temp_sigstop: 70_000,
            temp_sigcont: 66_000,
            temp_throttle: 66_000,
            temp_dethrottle: 60_000,
            min_sleep: 500,
        }
    }
}

/// Splits a config line into tokens on runs of spaces.
///
/// `\ ` becomes a literal space inside the current token; every other
/// backslash sequence is passed through unchanged.
fn split_tokens(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut cur = String::new();
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek() == Some(&' ') {
            cur.push(' ');
            chars.next();
        } else if ch == ' ' {
            if !cur.is_empty() {
                tokens.push(std::mem::take(&mut cur));
            }
        } else {
            cur.push(ch);
        }
    }
    if !cur.is_empty() {
        tokens.push(cur);
    }
    tokens
}

/// Records a recognized key, rejecting a second occurrence.
fn mark_seen(seen: &mut HashSet<&'static str>, key: &'static str) -> Result<(), DaemonError> {
    if !seen.insert(key) {
        return Err(DaemonError::config(key, "key appears more than once"));
    }
    Ok(())
}

/// A scalar key takes exactly one value; none at all keeps the default.
fn scalar<'a>(key: &str, values: &'a [String]) -> Result<Option<&'a str>, DaemonError> {
    match values.len() {
        0 => Ok(None),
        1 => Ok(Some(values[0].as_str())),
        n => Err(DaemonError::config(
            key,
            format!("expected a single value, got {n}"),
        )),
    }
}

fn parse_scalar<T: std::str::FromStr>(
    key: &str,
    values: &[String],
    into: &mut T,
) -> Result<(), DaemonError> {
    if let Some(tok) = scalar(key, values)? {
        *into = tok
            .parse::<T>()
            .map_err(|_| DaemonError::config(key, format!("cannot convert '{tok}'")))?;
    }
    Ok(())
}

fn parse_bool(key: &str, values: &[String], into: &mut bool) -> Result<(), DaemonError> {
    if let Some(tok) = scalar(key, values)? {
        *into = match tok {
            "true" | "1" => true,
            "false" | "0" => false,
            other => {
                return Err(DaemonError::config(
                    key,
                    format!("expected true or false, got '{other}'"),
                ))
            }
        };
    }
    Ok(())
}

fn parse_list<T: std::str::FromStr>(
    key: &str,
    values: &[String],
    into: &mut Vec<T>,
) -> Result<(), DaemonError> {
    if values.is_empty() {
        return Ok(());
    }
    let mut out = Vec::with_capacity(values.len());
    for tok in values {
        out.push(
            tok.parse::<T>()
                .map_err(|_| DaemonError::config(key, format!("cannot convert '{tok}'")))?,
        );
    }
    *into = out;
    Ok(())
}

fn parse_char_list(
    key: &str,
    values: &[String],
    into: &mut Vec<char>,
) -> Result<(), DaemonError> {
    if values.is_empty() {
        return Ok(());
    }
    let mut out = Vec::with_capacity(values.len());
    for tok in values {
        let mut chars = tok.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => out.push(c),
            _ => {
                return Err(DaemonError::config(
                    key,
                    format!("expected single characters, got '{tok}'"),
                ))
            }
        }
    }
    *into = out;
    Ok(())
}

fn parse_string_list(values: &[String], into: &mut Vec<String>) {
    if !values.is_empty() {
        *into = values.to_vec();
    }
}

impl Settings {
    /// Parses the config dialect described in the module docs.
    pub fn parse(text: &str) -> Result<Self, DaemonError> {
        let mut s = Settings::default();
        let mut seen: HashSet<&'static str> = HashSet::new();

        for line in text.lines() {
            let tokens = split_tokens(line);
            let Some((key, values)) = tokens.split_first() else {
                continue;
            };
            match key.as_str() {
                "log_file_path" => {
                    mark_seen(&mut seen, "log_file_path")?;
                    if let Some(v) = scalar("log_file_path", values)? {
                        s.log_file_path = v.to_string();
                    }
                }
                "whitelist_pid" => {
                    mark_seen(&mut seen, "whitelist_pid")?;
                    parse_list("whitelist_pid", values, &mut s.whitelist_pid)?;
                }
                "whitelist_comm" => {
                    mark_seen(&mut seen, "whitelist_comm")?;
                    parse_string_list(values, &mut s.whitelist_comm);
                }
                "whitelist_state" => {
                    mark_seen(&mut seen, "whitelist_state")?;
                    parse_char_list("whitelist_state", values, &mut s.whitelist_state)?;
                }
                "whitelist_ppid" => {
                    mark_seen(&mut seen, "whitelist_ppid")?;
                    parse_list("whitelist_ppid", values, &mut s.whitelist_ppid)?;
                }
                "whitelist_pgrp" => {
                    mark_seen(&mut seen, "whitelist_pgrp")?;
                    parse_list("whitelist_pgrp", values, &mut s.whitelist_pgrp)?;
                }
                "whitelist_session" => {
                    mark_seen(&mut seen, "whitelist_session")?;
                    parse_list("whitelist_session", values, &mut s.whitelist_session)?;
                }
                "whitelist_tty_nr" => {
                    mark_seen(&mut seen, "whitelist_tty_nr")?;
                    parse_list("whitelist_tty_nr", values, &mut s.whitelist_tty_nr)?;
                }
                "whitelist_tpgid" => {
                    mark_seen(&mut seen, "whitelist_tpgid")?;
                    parse_list("whitelist_tpgid", values, &mut s.whitelist_tpgid)?;
                }
                "whitelist_flags" => {
                    mark_seen(&mut seen, "whitelist_flags")?;
                    parse_list("whitelist_flags", values, &mut s.whitelist_flags)?;
                }
                "whitelist_max_nice" => {
                    mark_seen(&mut seen, "whitelist_max_nice")?;
                    parse_scalar("whitelist_max_nice", values, &mut s.whitelist_max_nice)?;
                }
                "matcher_thermal" => {
                    mark_seen(&mut seen, "matcher_thermal")?;
                    if let Some(v) = scalar("matcher_thermal", values)? {
                        s.matcher_thermal = v.to_string();
                    }
                }
                "matcher_scaling_max_freq" => {
                    mark_seen(&mut seen, "matcher_scaling_max_freq")?;
                    if let Some(v) = scalar("matcher_scaling_max_freq", values)? {
                        s.matcher_scaling_max_freq = v.to_string();
                    }
                }
                "matcher_cpuinfo_max_freq" => {
                    mark_seen(&mut seen, "matcher_cpuinfo_max_freq")?;
                    if let Some(v) = scalar("matcher_cpuinfo_max_freq", values)? {
                        s.matcher_cpuinfo_max_freq = v.to_string();
                    }
                }
                "matcher_cpuinfo_min_freq" => {
                    mark_seen(&mut seen, "matcher_cpuinfo_min_freq")?;
                    if let Some(v) = scalar("matcher_cpuinfo_min_freq", values)? {
                        s.matcher_cpuinfo_min_freq = v.to_string();
                    }
                }
                "matcher_scaling_available_frequencies" => {
                    mark_seen(&mut seen, "matcher_scaling_available_frequencies")?;
                    if let Some(v) = scalar("matcher_scaling_available_frequencies", values)? {
                        s.matcher_scaling_available_frequencies = v.to_string();
                    }
                }
                "use_throttle" => {
                    mark_seen(&mut seen, "use_throttle")?;
                    parse_bool("use_throttle", values, &mut s.use_throttle)?;
                }
                "use_SIGSTOP" => {
                    mark_seen(&mut seen, "use_SIGSTOP")?;
                    parse_bool("use_SIGSTOP", values, &mut s.use_sigstop)?;
                }
                "use_scaling_available" => {
                    mark_seen(&mut seen, "use_scaling_available")?;
                    parse_bool("use_scaling_available", values, &mut s.use_scaling_available)?;
                }
                "use_stepwise_SIGSTOP" => {
                    mark_seen(&mut seen, "use_stepwise_SIGSTOP")?;
                    parse_bool("use_stepwise_SIGSTOP", values, &mut s.use_stepwise_sigstop)?;
                }
                "use_stepwise_SIGCONT" => {
                    mark_seen(&mut seen, "use_stepwise_SIGCONT")?;
                    parse_bool("use_stepwise_SIGCONT", values, &mut s.use_stepwise_sigcont)?;
                }
                "temp_SIGSTOP" => {
                    mark_seen(&mut seen, "temp_SIGSTOP")?;
                    parse_scalar("temp_SIGSTOP", values, &mut s.temp_sigstop)?;
                }
                "temp_SIGCONT" => {
                    mark_seen(&mut seen, "temp_SIGCONT")?;
                    parse_scalar("temp_SIGCONT", values, &mut s.temp_sigcont)?;
                }
                "temp_throttle" => {
                    mark_seen(&mut seen, "temp_throttle")?;
                    parse_scalar("temp_throttle", values, &mut s.temp_throttle)?;
                }
                "temp_dethrottle" => {
                    mark_seen(&mut seen, "temp_dethrottle")?;
                    parse_scalar("temp_dethrottle", values, &mut s.temp_dethrottle)?;
                }
                "min_sleep" => {
                    mark_seen(&mut seen, "min_sleep")?;
                    parse_scalar("min_sleep", values, &mut s.min_sleep)?;
                }
                _ => {}
            }
        }
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_keeps_defaults() {
        let s = Settings::parse("").unwrap();
        assert_eq!(s.log_file_path, "/var/log/templimiter.log");
        assert!(s.use_throttle);
        assert!(!s.use_sigstop);
        assert_eq!(s.temp_throttle, 66_000);
        assert_eq!(s.temp_dethrottle, 60_000);
        assert_eq!(s.min_sleep, 500);
        assert_eq!(s.whitelist_max_nice, -21);
        assert!(s.whitelist_comm.contains(&"systemd".to_string()));
    }

    #[test]
    fn test_scalar_and_list_keys() {
        let text = "temp_throttle 71000\n\
                    whitelist_pid 1 2 300\n\
                    use_SIGSTOP true\n\
                    whitelist_state Z T\n";
        let s = Settings::parse(text).unwrap();
        assert_eq!(s.temp_throttle, 71_000);
        assert_eq!(s.whitelist_pid, vec![1, 2, 300]);
        assert!(s.use_sigstop);
        assert_eq!(s.whitelist_state, vec!['Z', 'T']);
    }

    #[test]
    fn test_blank_lines_and_unknown_keys_ignored() {
        let text = "\n\nnot_a_key some values\n\nmin_sleep 250\n";
        let s = Settings::parse(text).unwrap();
        assert_eq!(s.min_sleep, 250);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let text = "min_sleep 250\nmin_sleep 500\n";
        let err = Settings::parse(text).unwrap_err();
        assert!(matches!(err, DaemonError::Config { .. }));
    }

    #[test]
    fn test_key_with_no_value_keeps_default() {
        let s = Settings::parse("temp_throttle\nwhitelist_pid\n").unwrap();
        assert_eq!(s.temp_throttle, 66_000);
        assert!(s.whitelist_pid.is_empty());
    }

    #[test]
    fn test_scalar_with_extra_values_rejected() {
        let err = Settings::parse("min_sleep 250 500\n").unwrap_err();
        assert!(matches!(err, DaemonError::Config { .. }));
    }

    #[test]
    fn test_unconvertible_value_rejected() {
        let err = Settings::parse("temp_throttle warm\n").unwrap_err();
        assert!(matches!(err, DaemonError::Config { .. }));
    }

    #[test]
    fn test_escaped_space_stays_in_token() {
        let s = Settings::parse("whitelist_comm Web\\ Content my-app\n").unwrap();
        assert_eq!(s.whitelist_comm, vec!["Web Content", "my-app"]);
    }

    #[test]
    fn test_runs_of_spaces_collapse() {
        let s = Settings::parse("whitelist_pid   4    5\n").unwrap();
        assert_eq!(s.whitelist_pid, vec![4, 5]);
    }

    #[test]
    fn test_other_escapes_pass_through() {
        // A star escaped for the whitelist matcher survives tokenizing.
        let s = Settings::parse("whitelist_comm lit\\*eral\n").unwrap();
        assert_eq!(s.whitelist_comm, vec!["lit\\*eral"]);
    }

    #[test]
    fn test_whitelist_comm_override_replaces_defaults() {
        let s = Settings::parse("whitelist_comm onlyme\n").unwrap();
        assert_eq!(s.whitelist_comm, vec!["onlyme"]);
    }

    #[test]
    fn test_split_tokens() {
        assert_eq!(split_tokens("a b  c"), vec!["a", "b", "c"]);
        assert_eq!(split_tokens("  lead trail  "), vec!["lead", "trail"]);
        assert_eq!(split_tokens(""), Vec::<String>::new());
        assert_eq!(split_tokens("one\\ token"), vec!["one token"]);
    }
}
