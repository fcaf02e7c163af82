//! DTAPI Sink Element
//!
//! This module implements `dtapisink`, a GStreamer sink element that writes
//! an MPEG-2 transport stream to a DekTec DVB-T modulator.
//!
//! ## Responsibilities
//! - Attaches to the modulator device and output port on start
//! - Pushes all modulation parameters to the hardware, then prebuffers (HOLD)
//! - Writes every buffer to the transmit FIFO and requests transmission (SEND)
//! - Releases the hardware on stop, without draining the FIFO
//!
//! ## Properties
//! - Modulation (`bitrate`, `frequency`, `output-power`, `code-rate`,
//!   `bandwidth`, `modulation`, `guard`, `interleaving`, `trans-mode`,
//!   `inversion`, `transmit-mode`, `stuffing`): applied to the hardware
//!   immediately while running
//! - Hardware selection (`device-type`, `port`): set in READY or below
//! - Diagnostics (`fifo-load`, `fifo-size`, `bytes-written`): read-only
//!
//! ## Example Pipeline
//! ```bash
//! gst-launch-1.0 filesrc location=mux.ts ! tsparse ! \
//!     dtapisink frequency=618000000 bandwidth=8 modulation=qam-64
//! ```

// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

use gst::glib;
use gst::prelude::*;
use gstreamer as gst;
use gstreamer_base as gst_base;

/// Core implementation (properties, lifecycle, GStreamer trait impls)
mod imp;

/// Mapping between GObject property values and modulation parameters
mod properties;


/// Hardware selection settings
mod state;

glib::wrapper! {
    pub struct DtapiSink(ObjectSubclass<imp::DtapiSink>) @extends gst_base::BaseSink, gst::Element, gst::Object;
}

/// Registers the dtapisink element with GStreamer.
///
/// The rank is NONE: the element drives real RF hardware and is never
/// auto-plugged.
pub fn register(plugin: &gst::Plugin) -> Result<(), glib::BoolError> {
    gst::Element::register(
        Some(plugin),
        "dtapisink",
        gst::Rank::NONE,
        DtapiSink::static_type(),
    )
}
