// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

//! The hardware seam.
//!
//! [`Hardware`], [`Device`] and [`OutputChannel`] describe the slice of the
//! DTAPI SDK the modulator sink uses. [`crate::DtapiHardware`] implements them
//! on top of the shim library; tests implement them with a recording mock.

use std::fmt;

use dtapi_sys::*;

use crate::{ModControl, Result};

/// Transmit-control state of an output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxControl {
    /// Not transmitting, FIFO writes are rejected
    Idle,
    /// Prebuffering: data accumulates in the FIFO
    Hold,
    /// Transmitting from the FIFO
    Send,
}

impl TxControl {
    pub fn raw(self) -> i32 {
        match self {
            TxControl::Idle => DTAPI_TXCTRL_IDLE,
            TxControl::Hold => DTAPI_TXCTRL_HOLD,
            TxControl::Send => DTAPI_TXCTRL_SEND,
        }
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            DTAPI_TXCTRL_IDLE => Some(TxControl::Idle),
            DTAPI_TXCTRL_HOLD => Some(TxControl::Hold),
            DTAPI_TXCTRL_SEND => Some(TxControl::Send),
            _ => None,
        }
    }
}

/// Transmit status flags as returned by `GetFlags`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxFlags(pub i32);

impl TxFlags {
    const NAMES: [(i32, &'static str); 7] = [
        (DTAPI_TX_FIFO_UFL, "FIFO_UFL"),
        (DTAPI_TX_MUX_OVF, "MUX_OVF"),
        (DTAPI_TX_READBACK_ERR, "READBACK_ERR"),
        (DTAPI_TX_SYNC_ERR, "SYNC_ERR"),
        (DTAPI_TX_TARGET_ERR, "TARGET_ERR"),
        (DTAPI_TX_LINK_ERR, "LINK_ERR"),
        (DTAPI_TX_DATA_ERR, "DATA_ERR"),
    ];

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, flag: i32) -> bool {
        self.0 & flag == flag
    }

    /// Names of the known flags that are set.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }

    /// Bits that do not correspond to any known flag.
    pub fn unknown_bits(self) -> i32 {
        Self::NAMES
            .iter()
            .fold(self.0, |bits, (flag, _)| bits & !flag)
    }
}

impl fmt::Display for TxFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for name in self.names() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(name)?;
            first = false;
        }
        let unknown = self.unknown_bits();
        if unknown != 0 {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{unknown:#x}")?;
        }
        Ok(())
    }
}

/// Entry point for attaching to physical hardware.
pub trait Hardware {
    type Device: Device;
    type Channel: OutputChannel;

    /// Attaches to the first device of the given hardware type (e.g. 215 for a DTU-215).
    fn attach_device(&self, type_number: i32) -> Result<Self::Device>;

    /// Attaches an output channel to `port` of an attached device.
    fn attach_channel(&self, device: &Self::Device, port: i32) -> Result<Self::Channel>;
}

/// An attached modulator device.
pub trait Device: Send {
    /// Detaches from the hardware. Results are not reported.
    fn detach(&mut self);
}

/// An attached output channel.
///
/// Methods take `&self`: [`OutputChannel::reset_fifo`] and
/// [`OutputChannel::set_tx_control`] are called from a cancellation thread
/// while another thread may be blocked in [`OutputChannel::write`]. The
/// driver serialises concurrent calls.
pub trait OutputChannel: Send + Sync {
    fn set_tx_mode(&self, tx_mode: i32, stuff_mode: i32) -> Result<()>;
    fn tx_mode(&self) -> Result<(i32, i32)>;

    fn set_ts_rate_bps(&self, ts_rate: i32) -> Result<()>;
    fn ts_rate_bps(&self) -> Result<i32>;

    fn set_rf_mode(&self, rf_mode: i32) -> Result<()>;

    fn set_rf_control(&self, frequency: i64) -> Result<()>;
    /// Returns the frequency and the PLL lock status.
    fn rf_control(&self) -> Result<(i64, i32)>;

    /// `level` is in 0.1 dBm.
    fn set_output_level(&self, level: i32) -> Result<()>;
    fn output_level(&self) -> Result<i32>;

    fn set_mod_control(&self, control: ModControl) -> Result<()>;
    fn mod_control(&self) -> Result<ModControl>;

    fn set_tx_control(&self, state: TxControl) -> Result<()>;

    /// Writes to the transmit FIFO, blocking until all bytes are queued.
    fn write(&self, data: &[u8]) -> Result<()>;

    /// Returns the current and latched status flags.
    fn flags(&self) -> Result<(TxFlags, TxFlags)>;
    fn fifo_load(&self) -> Result<i32>;
    fn fifo_size(&self) -> Result<i32>;

    /// Clears the transmit FIFO, releasing a blocked [`OutputChannel::write`].
    fn reset_fifo(&self) -> Result<()>;

    /// Detaches instantly, dropping whatever is still queued. Results are
    /// not reported.
    fn detach(&self);
}
