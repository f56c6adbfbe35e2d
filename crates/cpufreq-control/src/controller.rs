// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-CPU frequency ceiling control.
//!
//! The one writable knob the kernel offers is each CPU's
//! `scaling_max_freq` — the ceiling the governor honours when picking an
//! operating frequency. [`FreqController`] owns the ceiling files plus the
//! hardware bounds, and steps ceilings down (throttle) or up (dethrottle)
//! either against the hardware min/max or along the per-CPU ladder of
//! published frequencies.
//!
//! Each ceiling write is a single short integer to an independent file, so
//! there is no transactional concern across CPUs.

use crate::FreqError;
use sysfs_io::FileSet;

/// Controls the frequency ceilings of all CPUs.
#[derive(Debug, Clone)]
pub struct FreqController {
    ceiling_files: FileSet,
    hw_max: Vec<u64>,
    hw_min: Vec<u64>,
    /// Published discrete frequencies per CPU, when discrete stepping is on.
    ladders: Option<Vec<Vec<u64>>>,
}

impl FreqController {
    /// Builds a controller over parallel per-CPU vectors.
    ///
    /// `ceiling_files`, `hw_max`, and `hw_min` must agree on the CPU count;
    /// the count is fixed for the controller's lifetime.
    pub fn new(
        ceiling_files: FileSet,
        hw_max: Vec<u64>,
        hw_min: Vec<u64>,
    ) -> Result<Self, FreqError> {
        let n = ceiling_files.len();
        if hw_max.len() != n {
            return Err(FreqError::CountMismatch {
                what: "hardware max frequencies",
                expected: n,
                actual: hw_max.len(),
            });
        }
        if hw_min.len() != n {
            return Err(FreqError::CountMismatch {
                what: "hardware min frequencies",
                expected: n,
                actual: hw_min.len(),
            });
        }
        Ok(Self {
            ceiling_files,
            hw_max,
            hw_min,
            ladders: None,
        })
    }

    /// Attaches per-CPU discrete ladders, switching the controller to
    /// ladder stepping.
    pub fn with_ladders(mut self, ladders: Vec<Vec<u64>>) -> Result<Self, FreqError> {
        let n = self.num_cpus();
        if ladders.len() != n {
            return Err(FreqError::CountMismatch {
                what: "frequency ladders",
                expected: n,
                actual: ladders.len(),
            });
        }
        for (cpu, ladder) in ladders.iter().enumerate() {
            if ladder.is_empty() {
                return Err(FreqError::EmptyLadder { cpu });
            }
        }
        self.ladders = Some(ladders);
        Ok(self)
    }

    /// Number of CPUs under control.
    pub fn num_cpus(&self) -> usize {
        self.ceiling_files.len()
    }

    /// Returns `true` when discrete-ladder stepping is active.
    pub fn uses_ladders(&self) -> bool {
        self.ladders.is_some()
    }

    /// Reads every CPU's current ceiling.
    pub fn read_current(&self) -> Result<Vec<u64>, FreqError> {
        Ok(self.ceiling_files.read_u64_each()?)
    }

    /// The highest ceiling CPU `i` can be raised to.
    fn top_of(&self, i: usize) -> u64 {
        match &self.ladders {
            Some(ladders) => ladders[i].iter().copied().max().unwrap_or(self.hw_max[i]),
            None => self.hw_max[i],
        }
    }

    /// The lowest ceiling CPU `i` can be lowered to.
    fn bottom_of(&self, i: usize) -> u64 {
        match &self.ladders {
            Some(ladders) => ladders[i].iter().copied().min().unwrap_or(self.hw_min[i]),
            None => self.hw_min[i],
        }
    }

    /// Returns `true` when at least one CPU's ceiling sits strictly below
    /// its top — i.e. there is room left to dethrottle.
    pub fn any_below_max(&self, current: &[u64]) -> bool {
        (0..self.num_cpus())
            .zip(current.iter())
            .any(|(i, &cur)| cur < self.top_of(i))
    }

    /// Returns `true` when at least one CPU's ceiling sits strictly above
    /// its bottom — i.e. there is room left to throttle.
    pub fn any_above_min(&self, current: &[u64]) -> bool {
        (0..self.num_cpus())
            .zip(current.iter())
            .any(|(i, &cur)| cur > self.bottom_of(i))
    }

    fn check_len(&self, current: &[u64]) -> Result<(), FreqError> {
        if current.len() != self.num_cpus() {
            return Err(FreqError::CountMismatch {
                what: "current ceilings",
                expected: self.num_cpus(),
                actual: current.len(),
            });
        }
        Ok(())
    }

    /// Lowers each CPU's ceiling one step.
    ///
    /// Ladder mode steps to the largest published frequency strictly below
    /// the current ceiling, leaving the CPU alone when none exists. Without
    /// ladders the ceiling drops straight to the hardware minimum, skipping
    /// CPUs already there.
    pub fn throttle(&self, current: &[u64]) -> Result<(), FreqError> {
        self.check_len(current)?;
        match &self.ladders {
            Some(ladders) => {
                for (i, &cur) in current.iter().enumerate() {
                    let next = ladders[i].iter().copied().filter(|&f| f < cur).max();
                    if let Some(next) = next {
                        self.ceiling_files.write_u64_at(i, next)?;
                    }
                }
            }
            None => {
                for (i, &cur) in current.iter().enumerate() {
                    if cur > self.hw_min[i] {
                        self.ceiling_files.write_u64_at(i, self.hw_min[i])?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Raises each CPU's ceiling one step.
    ///
    /// Ladder mode steps to the smallest published frequency strictly above
    /// the current ceiling. Without ladders the ceiling jumps straight back
    /// to the hardware maximum.
    pub fn dethrottle(&self, current: &[u64]) -> Result<(), FreqError> {
        self.check_len(current)?;
        match &self.ladders {
            Some(ladders) => {
                for (i, &cur) in current.iter().enumerate() {
                    let next = ladders[i].iter().copied().filter(|&f| f > cur).min();
                    if let Some(next) = next {
                        self.ceiling_files.write_u64_at(i, next)?;
                    }
                }
            }
            None => {
                for i in 0..current.len() {
                    self.ceiling_files.write_u64_at(i, self.hw_max[i])?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("cpufreq_control_test").join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        write!(f, "{content}").unwrap();
    }

    fn two_cpu_set(dir: &Path, c0: u64, c1: u64) -> FileSet {
        write_file(dir, "cpu0_max", &format!("{c0}\n"));
        write_file(dir, "cpu1_max", &format!("{c1}\n"));
        FileSet::from_glob(&format!("{}/cpu*_max", dir.display())).unwrap()
    }

    fn controller(dir: &Path, c0: u64, c1: u64) -> FreqController {
        let set = two_cpu_set(dir, c0, c1);
        FreqController::new(set, vec![3_000_000, 3_000_000], vec![800_000, 800_000]).unwrap()
    }

    const LADDER: [u64; 5] = [800_000, 1_200_000, 1_800_000, 2_400_000, 3_000_000];

    fn ladder_controller(dir: &Path, c0: u64, c1: u64) -> FreqController {
        controller(dir, c0, c1)
            .with_ladders(vec![LADDER.to_vec(), LADDER.to_vec()])
            .unwrap()
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let dir = fixture_dir("mismatch");
        let set = two_cpu_set(&dir, 1, 1);
        let err = FreqController::new(set, vec![3_000_000], vec![800_000, 800_000]).unwrap_err();
        assert!(matches!(err, FreqError::CountMismatch { .. }));
    }

    #[test]
    fn test_with_ladders_rejects_empty() {
        let dir = fixture_dir("empty_ladder");
        let ctl = controller(&dir, 1, 1);
        let err = ctl
            .with_ladders(vec![LADDER.to_vec(), Vec::new()])
            .unwrap_err();
        assert!(matches!(err, FreqError::EmptyLadder { cpu: 1 }));
    }

    #[test]
    fn test_throttle_jumps_to_hw_min() {
        let dir = fixture_dir("throttle_min");
        let ctl = controller(&dir, 3_000_000, 3_000_000);
        let cur = ctl.read_current().unwrap();
        assert!(ctl.any_above_min(&cur));
        ctl.throttle(&cur).unwrap();
        assert_eq!(ctl.read_current().unwrap(), vec![800_000, 800_000]);
    }

    #[test]
    fn test_throttle_at_min_writes_nothing() {
        let dir = fixture_dir("throttle_noop");
        let ctl = controller(&dir, 800_000, 800_000);
        let cur = ctl.read_current().unwrap();
        assert!(!ctl.any_above_min(&cur));
        ctl.throttle(&cur).unwrap();
        assert_eq!(ctl.read_current().unwrap(), vec![800_000, 800_000]);
    }

    #[test]
    fn test_dethrottle_jumps_to_hw_max() {
        let dir = fixture_dir("dethrottle_max");
        let ctl = controller(&dir, 800_000, 800_000);
        let cur = ctl.read_current().unwrap();
        assert!(ctl.any_below_max(&cur));
        ctl.dethrottle(&cur).unwrap();
        assert_eq!(ctl.read_current().unwrap(), vec![3_000_000, 3_000_000]);
    }

    #[test]
    fn test_ladder_throttle_steps_down() {
        let dir = fixture_dir("ladder_down");
        let ctl = ladder_controller(&dir, 3_000_000, 3_000_000);
        let cur = ctl.read_current().unwrap();
        ctl.throttle(&cur).unwrap();
        assert_eq!(ctl.read_current().unwrap(), vec![2_400_000, 2_400_000]);
        let cur = ctl.read_current().unwrap();
        ctl.throttle(&cur).unwrap();
        assert_eq!(ctl.read_current().unwrap(), vec![1_800_000, 1_800_000]);
    }

    #[test]
    fn test_ladder_throttle_at_bottom_is_noop() {
        let dir = fixture_dir("ladder_bottom");
        let ctl = ladder_controller(&dir, 800_000, 800_000);
        let cur = ctl.read_current().unwrap();
        assert!(!ctl.any_above_min(&cur));
        ctl.throttle(&cur).unwrap();
        assert_eq!(ctl.read_current().unwrap(), vec![800_000, 800_000]);
    }

    #[test]
    fn test_ladder_dethrottle_steps_up() {
        let dir = fixture_dir("ladder_up");
        let ctl = ladder_controller(&dir, 1_800_000, 1_800_000);
        let cur = ctl.read_current().unwrap();
        ctl.dethrottle(&cur).unwrap();
        assert_eq!(ctl.read_current().unwrap(), vec![2_400_000, 2_400_000]);
        let cur = ctl.read_current().unwrap();
        ctl.dethrottle(&cur).unwrap();
        assert_eq!(ctl.read_current().unwrap(), vec![3_000_000, 3_000_000]);
        // At the top, a further step changes nothing.
        let cur = ctl.read_current().unwrap();
        assert!(!ctl.any_below_max(&cur));
        ctl.dethrottle(&cur).unwrap();
        assert_eq!(ctl.read_current().unwrap(), vec![3_000_000, 3_000_000]);
    }

    #[test]
    fn test_ladder_steps_are_independent_per_cpu() {
        let dir = fixture_dir("ladder_mixed");
        let ctl = ladder_controller(&dir, 3_000_000, 1_200_000);
        let cur = ctl.read_current().unwrap();
        ctl.throttle(&cur).unwrap();
        assert_eq!(ctl.read_current().unwrap(), vec![2_400_000, 800_000]);
    }

    #[test]
    fn test_off_ladder_ceiling_steps_to_nearest() {
        let dir = fixture_dir("ladder_between");
        // 2_000_000 is not on the ladder; throttle picks the largest below.
        let ctl = ladder_controller(&dir, 2_000_000, 2_000_000);
        let cur = ctl.read_current().unwrap();
        ctl.throttle(&cur).unwrap();
        assert_eq!(ctl.read_current().unwrap(), vec![1_800_000, 1_800_000]);
    }

    #[test]
    fn test_throttle_wrong_width_is_an_error() {
        let dir = fixture_dir("wrong_width");
        let ctl = controller(&dir, 1_000_000, 1_000_000);
        let err = ctl.throttle(&[1_000_000]).unwrap_err();
        assert!(matches!(err, FreqError::CountMismatch { .. }));
    }
}
