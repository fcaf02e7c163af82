// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

//! Settings that select which hardware the sink attaches to.

use dtapi::config::{DEFAULT_DEVICE_TYPE, DEFAULT_PORT};

/// Transfer size handed to the sink per render call (half the 512 KiB
/// transfer buffer of the driver).
pub(crate) const DEFAULT_BLOCKSIZE: u32 = 256 * 1024;

/// User-configurable settings, read once on start.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    /// Hardware type number, e.g. 215 for a DTU-215
    pub device_type: i32,

    /// Output port on the device (1-based)
    pub port: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            device_type: DEFAULT_DEVICE_TYPE,
            port: DEFAULT_PORT,
        }
    }
}
