// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

//! Typed access to individual modulation parameters.
//!
//! Every configurable parameter has a [`PropertyId`]; a [`Property`] carries
//! the id together with a value of the matching type. This is what the
//! element's property handlers are mapped onto.

use crate::{Error, Result, params::*};

/// Identifies one configurable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyId {
    Bitrate,
    Frequency,
    OutputPower,
    CodeRate,
    Bandwidth,
    Modulation,
    Guard,
    Interleaving,
    TransmissionMode,
    Inversion,
    TransmitMode,
    Stuffing,
}

impl PropertyId {
    pub const ALL: [PropertyId; 12] = [
        PropertyId::Bitrate,
        PropertyId::Frequency,
        PropertyId::OutputPower,
        PropertyId::CodeRate,
        PropertyId::Bandwidth,
        PropertyId::Modulation,
        PropertyId::Guard,
        PropertyId::Interleaving,
        PropertyId::TransmissionMode,
        PropertyId::Inversion,
        PropertyId::TransmitMode,
        PropertyId::Stuffing,
    ];

    /// Element property name.
    pub fn name(self) -> &'static str {
        match self {
            PropertyId::Bitrate => "bitrate",
            PropertyId::Frequency => "frequency",
            PropertyId::OutputPower => "output-power",
            PropertyId::CodeRate => "code-rate",
            PropertyId::Bandwidth => "bandwidth",
            PropertyId::Modulation => "modulation",
            PropertyId::Guard => "guard",
            PropertyId::Interleaving => "interleaving",
            PropertyId::TransmissionMode => "trans-mode",
            PropertyId::Inversion => "inversion",
            PropertyId::TransmitMode => "transmit-mode",
            PropertyId::Stuffing => "stuffing",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    /// Prefix of the message reported when applying this parameter fails.
    pub fn failure_context(self) -> &'static str {
        match self {
            PropertyId::Bitrate => "Failed to set TS rate",
            PropertyId::Frequency => "Failed to set frequency",
            PropertyId::OutputPower => "Failed to set output power",
            PropertyId::CodeRate => "Failed to set code rate",
            PropertyId::Bandwidth => "Failed to set bandwidth",
            PropertyId::Modulation => "Failed to set modulation",
            PropertyId::Guard => "Failed to set guard",
            PropertyId::Interleaving => "Failed to set interleaving",
            PropertyId::TransmissionMode => "Failed to set transmission mode",
            PropertyId::Inversion => "Failed to set inversion",
            PropertyId::TransmitMode => "Failed to set txmode",
            PropertyId::Stuffing => "Failed to set stuffing",
        }
    }
}

/// A parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Property {
    /// Bits per second
    Bitrate(i32),
    /// Hz
    Frequency(i64),
    /// dBm
    OutputPower(f64),
    CodeRate(CodeRate),
    Bandwidth(Bandwidth),
    Modulation(Constellation),
    Guard(GuardInterval),
    Interleaving(Interleaving),
    TransmissionMode(TransmissionMode),
    Inversion(Inversion),
    TransmitMode(TxMode),
    Stuffing(Stuffing),
}

impl Property {
    /// Checks the value against the range the hardware accepts.
    ///
    /// Enumerated values are valid by construction. NaN fails the range
    /// check for output power.
    pub fn validate(&self) -> Result<()> {
        let rejected = match *self {
            Property::Bitrate(bps) if bps < 0 => bps.to_string(),
            Property::Frequency(hz) if hz < 0 => hz.to_string(),
            Property::OutputPower(dbm)
                if !(MIN_OUTPUT_POWER_DBM..=MAX_OUTPUT_POWER_DBM).contains(&dbm) =>
            {
                dbm.to_string()
            }
            _ => return Ok(()),
        };
        Err(Error::OutOfRange {
            property: self.id().name(),
            value: rejected,
        })
    }

    pub fn id(&self) -> PropertyId {
        match self {
            Property::Bitrate(_) => PropertyId::Bitrate,
            Property::Frequency(_) => PropertyId::Frequency,
            Property::OutputPower(_) => PropertyId::OutputPower,
            Property::CodeRate(_) => PropertyId::CodeRate,
            Property::Bandwidth(_) => PropertyId::Bandwidth,
            Property::Modulation(_) => PropertyId::Modulation,
            Property::Guard(_) => PropertyId::Guard,
            Property::Interleaving(_) => PropertyId::Interleaving,
            Property::TransmissionMode(_) => PropertyId::TransmissionMode,
            Property::Inversion(_) => PropertyId::Inversion,
            Property::TransmitMode(_) => PropertyId::TransmitMode,
            Property::Stuffing(_) => PropertyId::Stuffing,
        }
    }
}

impl ModulationParameters {
    /// Reads one parameter.
    pub fn get(&self, id: PropertyId) -> Property {
        match id {
            PropertyId::Bitrate => Property::Bitrate(self.ts_rate_bps),
            PropertyId::Frequency => Property::Frequency(self.frequency_hz),
            PropertyId::OutputPower => Property::OutputPower(self.output_power_dbm()),
            PropertyId::CodeRate => Property::CodeRate(self.code_rate),
            PropertyId::Bandwidth => Property::Bandwidth(self.dvbt.bandwidth),
            PropertyId::Modulation => Property::Modulation(self.dvbt.constellation),
            PropertyId::Guard => Property::Guard(self.dvbt.guard),
            PropertyId::Interleaving => Property::Interleaving(self.dvbt.interleaving),
            PropertyId::TransmissionMode => {
                Property::TransmissionMode(self.dvbt.transmission_mode)
            }
            PropertyId::Inversion => Property::Inversion(self.inversion),
            PropertyId::TransmitMode => Property::TransmitMode(self.tx_mode),
            PropertyId::Stuffing => Property::Stuffing(self.stuffing),
        }
    }

    /// Overwrites one parameter.
    ///
    /// A value rejected by [`Property::validate`] leaves the parameters
    /// unchanged.
    pub fn set(&mut self, value: Property) -> Result<()> {
        value.validate()?;
        match value {
            Property::Bitrate(v) => self.ts_rate_bps = v,
            Property::Frequency(v) => self.frequency_hz = v,
            Property::OutputPower(v) => self.set_output_power_dbm(v),
            Property::CodeRate(v) => self.code_rate = v,
            Property::Bandwidth(v) => self.dvbt.bandwidth = v,
            Property::Modulation(v) => self.dvbt.constellation = v,
            Property::Guard(v) => self.dvbt.guard = v,
            Property::Interleaving(v) => self.dvbt.interleaving = v,
            Property::TransmissionMode(v) => self.dvbt.transmission_mode = v,
            Property::Inversion(v) => self.inversion = v,
            Property::TransmitMode(v) => self.tx_mode = v,
            Property::Stuffing(v) => self.stuffing = v,
        }
        Ok(())
    }
}
