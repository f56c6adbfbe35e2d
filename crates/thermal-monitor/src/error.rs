// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for thermal sampling.

/// Errors that can occur when resolving or reading thermal sensors.
#[derive(Debug, thiserror::Error)]
pub enum ThermalError {
    /// A sensor file failed to resolve, read, or decode.
    #[error("thermal sensor error: {0}")]
    Io(#[from] sysfs_io::IoError),
}
