// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for DTAPI operations.
//!
//! This module maps the integer `DTAPI_RESULT` codes returned by the SDK to a
//! typed [`Status`], gives every status a fixed human-readable description,
//! and defines the crate [`Error`] used by the safe layer.

use std::fmt;

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// A `DTAPI_RESULT` code.
///
/// Every code the modulator sink can encounter has its own variant. Anything
/// else is kept verbatim in [`Status::Unknown`], so converting from a raw
/// code never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    DevDriver,
    InsufficientLoad,
    InvalidLevel,
    InvalidMode,
    ModParsNotSet,
    ModTypeUnsupported,
    NoIpPars,
    NoTsRate,
    NotAttached,
    InvalidBuffer,
    InvalidSize,
    Idle,
    InvalidBandwidth,
    InvalidConstellation,
    InvalidFrameHeaderMode,
    InvalidGuard,
    InvalidInterleaving,
    InvalidJ83Annex,
    InvalidRollOff,
    InvalidPilots,
    InvalidRate,
    InvalidTransmissionMode,
    InvalidUseFrameNumbering,
    NotSupported,
    NoSuchDevice,
    InUse,
    Unknown(i32),
}

impl Status {
    /// Converts a raw SDK result code.
    pub fn from_raw(code: i32) -> Self {
        use dtapi_sys::*;

        match code {
            DTAPI_OK => Status::Ok,
            DTAPI_E_DEV_DRIVER => Status::DevDriver,
            DTAPI_E_INSUF_LOAD => Status::InsufficientLoad,
            DTAPI_E_INVALID_LEVEL => Status::InvalidLevel,
            DTAPI_E_INVALID_MODE => Status::InvalidMode,
            DTAPI_E_MODPARS_NOT_SET => Status::ModParsNotSet,
            DTAPI_E_MODTYPE_UNSUP => Status::ModTypeUnsupported,
            DTAPI_E_NO_IPPARS => Status::NoIpPars,
            DTAPI_E_NO_TSRATE => Status::NoTsRate,
            DTAPI_E_NOT_ATTACHED => Status::NotAttached,
            DTAPI_E_INVALID_BUF => Status::InvalidBuffer,
            DTAPI_E_INVALID_SIZE => Status::InvalidSize,
            DTAPI_E_IDLE => Status::Idle,
            DTAPI_E_INVALID_BANDWIDTH => Status::InvalidBandwidth,
            DTAPI_E_INVALID_CONSTEL => Status::InvalidConstellation,
            DTAPI_E_INVALID_FHMODE => Status::InvalidFrameHeaderMode,
            DTAPI_E_INVALID_GUARD => Status::InvalidGuard,
            DTAPI_E_INVALID_INTERLVNG => Status::InvalidInterleaving,
            DTAPI_E_INVALID_J83ANNEX => Status::InvalidJ83Annex,
            DTAPI_E_INVALID_ROLLOFF => Status::InvalidRollOff,
            DTAPI_E_INVALID_PILOTS => Status::InvalidPilots,
            DTAPI_E_INVALID_RATE => Status::InvalidRate,
            DTAPI_E_INVALID_TRANSMODE => Status::InvalidTransmissionMode,
            DTAPI_E_INVALID_USEFRAMENO => Status::InvalidUseFrameNumbering,
            DTAPI_E_NOT_SUPPORTED => Status::NotSupported,
            DTAPI_E_NO_SUCH_DEVICE => Status::NoSuchDevice,
            DTAPI_E_IN_USE => Status::InUse,
            other => Status::Unknown(other),
        }
    }

    /// Returns the raw SDK result code.
    pub fn raw(self) -> i32 {
        use dtapi_sys::*;

        match self {
            Status::Ok => DTAPI_OK,
            Status::DevDriver => DTAPI_E_DEV_DRIVER,
            Status::InsufficientLoad => DTAPI_E_INSUF_LOAD,
            Status::InvalidLevel => DTAPI_E_INVALID_LEVEL,
            Status::InvalidMode => DTAPI_E_INVALID_MODE,
            Status::ModParsNotSet => DTAPI_E_MODPARS_NOT_SET,
            Status::ModTypeUnsupported => DTAPI_E_MODTYPE_UNSUP,
            Status::NoIpPars => DTAPI_E_NO_IPPARS,
            Status::NoTsRate => DTAPI_E_NO_TSRATE,
            Status::NotAttached => DTAPI_E_NOT_ATTACHED,
            Status::InvalidBuffer => DTAPI_E_INVALID_BUF,
            Status::InvalidSize => DTAPI_E_INVALID_SIZE,
            Status::Idle => DTAPI_E_IDLE,
            Status::InvalidBandwidth => DTAPI_E_INVALID_BANDWIDTH,
            Status::InvalidConstellation => DTAPI_E_INVALID_CONSTEL,
            Status::InvalidFrameHeaderMode => DTAPI_E_INVALID_FHMODE,
            Status::InvalidGuard => DTAPI_E_INVALID_GUARD,
            Status::InvalidInterleaving => DTAPI_E_INVALID_INTERLVNG,
            Status::InvalidJ83Annex => DTAPI_E_INVALID_J83ANNEX,
            Status::InvalidRollOff => DTAPI_E_INVALID_ROLLOFF,
            Status::InvalidPilots => DTAPI_E_INVALID_PILOTS,
            Status::InvalidRate => DTAPI_E_INVALID_RATE,
            Status::InvalidTransmissionMode => DTAPI_E_INVALID_TRANSMODE,
            Status::InvalidUseFrameNumbering => DTAPI_E_INVALID_USEFRAMENO,
            Status::NotSupported => DTAPI_E_NOT_SUPPORTED,
            Status::NoSuchDevice => DTAPI_E_NO_SUCH_DEVICE,
            Status::InUse => DTAPI_E_IN_USE,
            Status::Unknown(code) => code,
        }
    }

    /// Fixed description of this status.
    ///
    /// A few SDK codes mean different things depending on the call that
    /// returned them; the wording here is the one for the call the sink
    /// actually makes (`Write` for [`Status::Idle`], `SetTxControl` for
    /// [`Status::NoTsRate`]).
    pub fn describe(self) -> &'static str {
        match self {
            Status::Ok => "Success",
            Status::DevDriver => "Unclassified failure in device driver",
            Status::InsufficientLoad => {
                "For modulators: FIFO load is insufficient to start modulation"
            }
            Status::InvalidLevel => {
                "The output level specified in SetOutputLevel is invalid for the \
                 attached hardware function"
            }
            Status::InvalidMode => {
                "The specified transmit-control state is invalid or incompatible \
                 with the attached hardware function"
            }
            Status::ModParsNotSet => {
                "For modulators: modulation parameters have not been set but are \
                 required for starting modulation"
            }
            Status::ModTypeUnsupported => "For modulators: modulation type is not supported",
            Status::NoIpPars => {
                "For TS-over-IP channels: cannot set transmission state because \
                 IP parameters have not been specified yet"
            }
            Status::NoTsRate => {
                "For modulators: TS rate has not been set but is required for \
                 starting modulation"
            }
            Status::NotAttached => "Channel object is not attached to a hardware function",
            Status::InvalidBuffer => "The buffer is not aligned to a 32-bit word boundary",
            Status::InvalidSize => {
                "The specified transfer size is negative or not a multiple of four"
            }
            Status::Idle => {
                "Cannot write data because transmission-control state is \
                 DTAPI_TXCTRL_IDLE"
            }
            Status::InvalidBandwidth => "Invalid value for bandwidth field",
            Status::InvalidConstellation => "Invalid value for constellation field",
            Status::InvalidFrameHeaderMode => "Invalid value for frame-header mode field",
            Status::InvalidGuard => "Invalid value for guard-interval field",
            Status::InvalidInterleaving => "Invalid value for interleaving field",
            Status::InvalidJ83Annex | Status::InvalidRollOff => "Invalid value for J.83 annex",
            Status::InvalidPilots => "Pilots cannot be specified in C=1 mode",
            Status::InvalidRate => "Invalid value for convolutional rate or FEC code rate",
            Status::InvalidTransmissionMode => "Invalid value for transmission-mode field",
            Status::InvalidUseFrameNumbering => "Invalid value for use-frame-numbering field",
            Status::NotSupported => "The device does not include a modulator",
            Status::NoSuchDevice => "No device of the requested type is present",
            Status::InUse => "The hardware function is already in use",
            Status::Unknown(_) => "Unknown error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Describes a raw SDK result code. Total over `i32`.
pub fn describe(code: i32) -> &'static str {
    Status::from_raw(code).describe()
}

/// Errors that can occur when driving a DTAPI modulator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A hardware call returned a non-success status.
    #[error("{0}")]
    Hardware(Status),

    /// No device of the requested hardware type could be attached.
    #[error("No DTU-{type_number} in system: {status}")]
    DeviceNotFound { type_number: i32, status: Status },

    /// The output port could not be claimed on the attached device.
    #[error("Can't attach output channel to port {port}: {status}")]
    PortUnavailable { port: i32, status: Status },

    /// An operation needed an attached channel but there is none.
    #[error("Output channel is not attached")]
    NotAttached,

    /// A value read back from hardware is outside the known domain of a field.
    #[error("Invalid {field} value read back from hardware: {value:#x}")]
    InvalidParameter { field: &'static str, value: i32 },

    /// A value outside the range the hardware accepts for a parameter.
    #[error("{value} is outside the valid range of {property}")]
    OutOfRange { property: &'static str, value: String },

    /// A generic error for Rust-level failures not mapped to an SDK status.
    #[error("Other error: {0}")]
    Other(String),

    /// Failed to load the DTAPI shim library or resolve one of its symbols.
    #[error("Loading library: {0}")]
    LibLoading(#[from] libloading::Error),
}

impl Error {
    /// Converts a raw SDK result code to a [`Result`].
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let status = unsafe { (api.dtapi_outp_set_rf_control)(channel, frequency) };
    /// Error::from_status(status)?; // Propagate error if status != DTAPI_OK
    /// ```
    pub fn from_status(code: i32) -> Result<()> {
        match Status::from_raw(code) {
            Status::Ok => Ok(()),
            status => Err(Error::Hardware(status)),
        }
    }

    /// The SDK status behind this error, if any.
    pub fn status(&self) -> Option<Status> {
        match self {
            Error::Hardware(status)
            | Error::DeviceNotFound { status, .. }
            | Error::PortUnavailable { status, .. } => Some(*status),
            Error::NotAttached => Some(Status::NotAttached),
            _ => None,
        }
    }
}
