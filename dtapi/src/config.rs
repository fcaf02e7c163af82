// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

//! Runtime configuration and path resolution for the DTAPI shim library.

use std::path::PathBuf;

/// Environment variable overriding the location of the shim library.
pub const DTAPI_LIBRARY_PATH_ENV: &str = "DTAPI_LIBRARY_PATH";

/// Library name used when [`DTAPI_LIBRARY_PATH_ENV`] is not set.
///
/// A bare name lets the dynamic loader search its usual paths.
pub const DEFAULT_DTAPI_LIBRARY: &str = "libdtapi.so";

/// Hardware type the sink attaches to unless configured otherwise (DTU-215).
pub const DEFAULT_DEVICE_TYPE: i32 = 215;

/// Output port the sink attaches to unless configured otherwise.
pub const DEFAULT_PORT: i32 = 1;

/// Returns the path to the DTAPI shim library.
///
/// # Examples
///
/// ```no_run
/// use dtapi::config::get_dtapi_so_path;
/// use dtapi::load_api;
///
/// # fn main() -> Result<(), dtapi::Error> {
/// let api = load_api(get_dtapi_so_path())?;
/// # Ok(())
/// # }
/// ```
pub fn get_dtapi_so_path() -> PathBuf {
    std::env::var_os(DTAPI_LIBRARY_PATH_ENV)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DTAPI_LIBRARY))
}
