//! GStreamer Plugin for DekTec DTAPI modulators
//!
//! This crate implements a GStreamer plugin with one element that turns a
//! DekTec modulator (e.g. the DTU-215) into a pipeline sink:
//!
//! - **dtapisink**: receives MPEG-2 transport stream buffers and writes them to
//!   the transmit FIFO of a DVB-T modulator output
//!
//! ## DTAPI Overview
//! DTAPI is DekTec's SDK for their broadcast hardware. The element reaches it
//! through the [`dtapi`] crate, which loads a C-ABI shim around the C++ SDK at
//! runtime (`DTAPI_LIBRARY_PATH`, default `libdtapi.so`).
//!
//! ## Supported Media Formats
//! - **Transport stream**: `video/mpegts, mpegversion=2`
//!
//! ## GStreamer Concepts (for non-GStreamer developers)
//! - **Element**: A processing unit in a pipeline (source, filter, or sink)
//! - **Plugin**: A dynamically loadable library containing one or more elements
//! - **Registration**: Making elements available to the GStreamer framework
//! - **Caps (Capabilities)**: Media format descriptions

// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

// Allow non-Send fields in Send types (required for GStreamer's threading model)
// and unused doc comments (sometimes present in macro-generated code)
#![allow(clippy::non_send_fields_in_send_ty, unused_doc_comments)]

use gst::glib;
use gstreamer as gst;

/// DekTec modulator sink element
pub mod dtapisink;

/// Initializes the plugin by registering its element with GStreamer.
///
/// # Arguments
/// * `plugin` - The GStreamer plugin instance being initialized
fn plugin_init(plugin: &gst::Plugin) -> Result<(), glib::BoolError> {
    dtapisink::register(plugin)?;

    Ok(())
}

/// GStreamer plugin metadata and entry point.
///
/// - Plugin name: "dtapi"
/// - Version: From CARGO_PKG_VERSION + git commit ID
/// - License: Apache-2.0
gst::plugin_define!(
    dtapi,
    env!("CARGO_PKG_DESCRIPTION"),
    plugin_init,
    concat!(env!("CARGO_PKG_VERSION"), "-", env!("COMMIT_ID")),
    "Apache-2.0",
    env!("CARGO_PKG_NAME"),
    env!("CARGO_PKG_NAME"),
    env!("CARGO_PKG_REPOSITORY"),
    env!("BUILD_REL_DATE")
);
