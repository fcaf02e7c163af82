// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

//! GObject property surface of the modulation parameters.
//!
//! Property names come from [`PropertyId::name`], so the element, the
//! parameter store and the ParamSpecs agree on one spelling.

use gst::glib;
use gst::prelude::*;
use gstreamer as gst;

use dtapi::{
    DEFAULT_BANDWIDTH, DEFAULT_BITRATE, DEFAULT_CODE_RATE, DEFAULT_CONSTELLATION,
    DEFAULT_FREQUENCY, DEFAULT_GUARD, DEFAULT_INTERLEAVING, DEFAULT_INVERSION, DEFAULT_STUFFING,
    DEFAULT_TRANSMISSION_MODE, DEFAULT_TX_MODE, MAX_OUTPUT_POWER_DBM, MIN_OUTPUT_POWER_DBM,
    Property, PropertyId,
};

/// ParamSpecs for every [`PropertyId`], in declaration order.
pub(crate) fn modulation_param_specs() -> Vec<glib::ParamSpec> {
    PropertyId::ALL.into_iter().map(param_spec).collect()
}

fn param_spec(id: PropertyId) -> glib::ParamSpec {
    let name = id.name();
    match id {
        PropertyId::Bitrate => glib::ParamSpecInt::builder(name)
            .nick("Bitrate")
            .blurb("Transport stream rate in bits per second")
            .minimum(0)
            .maximum(i32::MAX)
            .default_value(DEFAULT_BITRATE)
            .mutable_playing()
            .build(),
        PropertyId::Frequency => glib::ParamSpecInt64::builder(name)
            .nick("Frequency")
            .blurb("RF carrier frequency in Hz")
            .minimum(0)
            .maximum(i64::MAX)
            .default_value(DEFAULT_FREQUENCY)
            .mutable_playing()
            .build(),
        // GLib requires the default inside the range; the stored default
        // (-49.5 dBm) is lower than anything a user may set.
        PropertyId::OutputPower => glib::ParamSpecDouble::builder(name)
            .nick("Output power")
            .blurb("Output level in dBm")
            .minimum(MIN_OUTPUT_POWER_DBM)
            .maximum(MAX_OUTPUT_POWER_DBM)
            .default_value(MIN_OUTPUT_POWER_DBM)
            .mutable_playing()
            .build(),
        PropertyId::CodeRate => glib::ParamSpecEnum::builder_with_default(name, DEFAULT_CODE_RATE)
            .nick("Code rate")
            .blurb("Forward error correction code rate")
            .mutable_playing()
            .build(),
        PropertyId::Bandwidth => glib::ParamSpecEnum::builder_with_default(name, DEFAULT_BANDWIDTH)
            .nick("Bandwidth")
            .blurb("Channel bandwidth")
            .mutable_playing()
            .build(),
        PropertyId::Modulation => {
            glib::ParamSpecEnum::builder_with_default(name, DEFAULT_CONSTELLATION)
                .nick("Modulation")
                .blurb("Constellation")
                .mutable_playing()
                .build()
        }
        PropertyId::Guard => glib::ParamSpecEnum::builder_with_default(name, DEFAULT_GUARD)
            .nick("Guard interval")
            .blurb("Guard interval as a fraction of the symbol time")
            .mutable_playing()
            .build(),
        PropertyId::Interleaving => {
            glib::ParamSpecEnum::builder_with_default(name, DEFAULT_INTERLEAVING)
                .nick("Interleaving")
                .blurb("Interleaver depth")
                .mutable_playing()
                .build()
        }
        PropertyId::TransmissionMode => {
            glib::ParamSpecEnum::builder_with_default(name, DEFAULT_TRANSMISSION_MODE)
                .nick("Transmission mode")
                .blurb("FFT size")
                .mutable_playing()
                .build()
        }
        PropertyId::Inversion => glib::ParamSpecEnum::builder_with_default(name, DEFAULT_INVERSION)
            .nick("Inversion")
            .blurb("Spectral inversion")
            .mutable_playing()
            .build(),
        PropertyId::TransmitMode => {
            glib::ParamSpecEnum::builder_with_default(name, DEFAULT_TX_MODE)
                .nick("Transmit mode")
                .blurb("Packet size of the transport stream")
                .mutable_playing()
                .build()
        }
        PropertyId::Stuffing => glib::ParamSpecEnum::builder_with_default(name, DEFAULT_STUFFING)
            .nick("Stuffing")
            .blurb("What to transmit when no data is available")
            .mutable_playing()
            .build(),
    }
}

/// Converts a property value set by the application.
pub(crate) fn from_value(
    id: PropertyId,
    value: &glib::Value,
) -> Result<Property, glib::value::ValueTypeMismatchError> {
    Ok(match id {
        PropertyId::Bitrate => Property::Bitrate(value.get()?),
        PropertyId::Frequency => Property::Frequency(value.get()?),
        PropertyId::OutputPower => Property::OutputPower(value.get()?),
        PropertyId::CodeRate => Property::CodeRate(value.get()?),
        PropertyId::Bandwidth => Property::Bandwidth(value.get()?),
        PropertyId::Modulation => Property::Modulation(value.get()?),
        PropertyId::Guard => Property::Guard(value.get()?),
        PropertyId::Interleaving => Property::Interleaving(value.get()?),
        PropertyId::TransmissionMode => Property::TransmissionMode(value.get()?),
        PropertyId::Inversion => Property::Inversion(value.get()?),
        PropertyId::TransmitMode => Property::TransmitMode(value.get()?),
        PropertyId::Stuffing => Property::Stuffing(value.get()?),
    })
}

pub(crate) fn to_value(property: Property) -> glib::Value {
    match property {
        Property::Bitrate(v) => v.to_value(),
        Property::Frequency(v) => v.to_value(),
        Property::OutputPower(v) => v.to_value(),
        Property::CodeRate(v) => v.to_value(),
        Property::Bandwidth(v) => v.to_value(),
        Property::Modulation(v) => v.to_value(),
        Property::Guard(v) => v.to_value(),
        Property::Interleaving(v) => v.to_value(),
        Property::TransmissionMode(v) => v.to_value(),
        Property::Inversion(v) => v.to_value(),
        Property::TransmitMode(v) => v.to_value(),
        Property::Stuffing(v) => v.to_value(),
    }
}
