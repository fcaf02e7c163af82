// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

//! # dtapi-sys: Raw FFI bindings to the DTAPI shim library
//!
//! The DekTec DTAPI SDK is a C++ library. It is reached through a thin C-ABI
//! shim (`libdtapi.so`) that exposes one flat function per `DtDevice` /
//! `DtOutpChannel` member the modulator sink needs. This crate declares that
//! ABI: the numeric constants shared with the SDK headers and a symbol table
//! ([`DtapiLib`]) resolved at runtime with `libloading`, so nothing links
//! against the vendor library at build time.
//!
//! ## Usage
//!
//! **Most users should NOT use this crate directly.** Use the safe [`dtapi`]
//! crate instead, which provides RAII handles, `Result`-based error handling
//! and typed modulation parameters.
//!
//! ## Safety
//!
//! All functions are `unsafe`. Callers must uphold the SDK invariants:
//! - Handles come from the matching `*_new` function and are freed exactly once
//! - A channel is attached to a port only after its device is attached
//! - Out-pointers must be valid for writes for the duration of the call
//!
//! [`dtapi`]: https://docs.rs/dtapi

#![allow(non_camel_case_types)]
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::too_many_arguments)]

use std::ffi::{c_char, c_int, c_void};

/// Opaque `DtDevice*`.
pub type DtDevice = *mut c_void;

/// Opaque `DtOutpChannel*`.
pub type DtOutpChannel = *mut c_void;

/// `DTAPI_RESULT` as returned by every SDK call.
pub type DTAPI_RESULT = c_int;

pub const DTAPI_OK: DTAPI_RESULT = 0;

/// Base of the error range.
pub const DTAPI_E: DTAPI_RESULT = 0x1000;
pub const DTAPI_E_DEV_DRIVER: DTAPI_RESULT = DTAPI_E + 1;
pub const DTAPI_E_INSUF_LOAD: DTAPI_RESULT = DTAPI_E + 2;
pub const DTAPI_E_INVALID_LEVEL: DTAPI_RESULT = DTAPI_E + 3;
pub const DTAPI_E_INVALID_MODE: DTAPI_RESULT = DTAPI_E + 4;
pub const DTAPI_E_MODPARS_NOT_SET: DTAPI_RESULT = DTAPI_E + 5;
pub const DTAPI_E_MODTYPE_UNSUP: DTAPI_RESULT = DTAPI_E + 6;
pub const DTAPI_E_NO_IPPARS: DTAPI_RESULT = DTAPI_E + 7;
pub const DTAPI_E_NO_TSRATE: DTAPI_RESULT = DTAPI_E + 8;
pub const DTAPI_E_NOT_ATTACHED: DTAPI_RESULT = DTAPI_E + 9;
pub const DTAPI_E_INVALID_BUF: DTAPI_RESULT = DTAPI_E + 10;
pub const DTAPI_E_INVALID_SIZE: DTAPI_RESULT = DTAPI_E + 11;
pub const DTAPI_E_IDLE: DTAPI_RESULT = DTAPI_E + 12;
pub const DTAPI_E_INVALID_BANDWIDTH: DTAPI_RESULT = DTAPI_E + 13;
pub const DTAPI_E_INVALID_CONSTEL: DTAPI_RESULT = DTAPI_E + 14;
pub const DTAPI_E_INVALID_FHMODE: DTAPI_RESULT = DTAPI_E + 15;
pub const DTAPI_E_INVALID_GUARD: DTAPI_RESULT = DTAPI_E + 16;
pub const DTAPI_E_INVALID_INTERLVNG: DTAPI_RESULT = DTAPI_E + 17;
pub const DTAPI_E_INVALID_J83ANNEX: DTAPI_RESULT = DTAPI_E + 18;
pub const DTAPI_E_INVALID_ROLLOFF: DTAPI_RESULT = DTAPI_E + 19;
pub const DTAPI_E_INVALID_PILOTS: DTAPI_RESULT = DTAPI_E + 20;
pub const DTAPI_E_INVALID_RATE: DTAPI_RESULT = DTAPI_E + 21;
pub const DTAPI_E_INVALID_TRANSMODE: DTAPI_RESULT = DTAPI_E + 22;
pub const DTAPI_E_INVALID_USEFRAMENO: DTAPI_RESULT = DTAPI_E + 23;
pub const DTAPI_E_NOT_SUPPORTED: DTAPI_RESULT = DTAPI_E + 24;
pub const DTAPI_E_NO_SUCH_DEVICE: DTAPI_RESULT = DTAPI_E + 25;
pub const DTAPI_E_IN_USE: DTAPI_RESULT = DTAPI_E + 26;

// Modulation types (SetModControl ModType)
pub const DTAPI_MOD_DVBT: c_int = 9;

// Code rates (SetModControl ParXtra0)
pub const DTAPI_MOD_1_2: c_int = 0;
pub const DTAPI_MOD_2_3: c_int = 1;
pub const DTAPI_MOD_3_4: c_int = 2;
pub const DTAPI_MOD_4_5: c_int = 3;
pub const DTAPI_MOD_5_6: c_int = 4;
pub const DTAPI_MOD_6_7: c_int = 5;
pub const DTAPI_MOD_7_8: c_int = 6;
pub const DTAPI_MOD_1_4: c_int = 7;
pub const DTAPI_MOD_1_3: c_int = 8;
pub const DTAPI_MOD_2_5: c_int = 9;
pub const DTAPI_MOD_3_5: c_int = 10;
pub const DTAPI_MOD_8_9: c_int = 11;
pub const DTAPI_MOD_9_10: c_int = 12;

// DVB-T parameters (SetModControl ParXtra1)
pub const DTAPI_MOD_DVBT_5MHZ: c_int = 0x0000_0001;
pub const DTAPI_MOD_DVBT_6MHZ: c_int = 0x0000_0002;
pub const DTAPI_MOD_DVBT_7MHZ: c_int = 0x0000_0003;
pub const DTAPI_MOD_DVBT_8MHZ: c_int = 0x0000_0004;
pub const DTAPI_MOD_DVBT_BW_MSK: c_int = 0x0000_000F;

pub const DTAPI_MOD_DVBT_QPSK: c_int = 0x0000_0010;
pub const DTAPI_MOD_DVBT_QAM16: c_int = 0x0000_0020;
pub const DTAPI_MOD_DVBT_QAM64: c_int = 0x0000_0030;
pub const DTAPI_MOD_DVBT_CO_MSK: c_int = 0x0000_00F0;

pub const DTAPI_MOD_DVBT_G_1_32: c_int = 0x0000_0100;
pub const DTAPI_MOD_DVBT_G_1_16: c_int = 0x0000_0200;
pub const DTAPI_MOD_DVBT_G_1_8: c_int = 0x0000_0300;
pub const DTAPI_MOD_DVBT_G_1_4: c_int = 0x0000_0400;
pub const DTAPI_MOD_DVBT_GU_MSK: c_int = 0x0000_0F00;

pub const DTAPI_MOD_DVBT_INDEPTH: c_int = 0x0000_1000;
pub const DTAPI_MOD_DVBT_NATIVE: c_int = 0x0000_2000;
pub const DTAPI_MOD_DVBT_IL_MSK: c_int = 0x0000_3000;

pub const DTAPI_MOD_DVBT_2K: c_int = 0x0001_0000;
pub const DTAPI_MOD_DVBT_8K: c_int = 0x0002_0000;
pub const DTAPI_MOD_DVBT_4K: c_int = 0x0003_0000;
pub const DTAPI_MOD_DVBT_MD_MSK: c_int = 0x0003_0000;

// RF mode (SetRfMode)
pub const DTAPI_UPCONV_NORMAL: c_int = 0x0000;
pub const DTAPI_UPCONV_SPECINV: c_int = 0x0100;

// Transmit modes (SetTxMode TxMode)
pub const DTAPI_TXMODE_188: c_int = 0;
pub const DTAPI_TXMODE_192: c_int = 1;
pub const DTAPI_TXMODE_204: c_int = 2;
pub const DTAPI_TXMODE_ADD16: c_int = 3;
pub const DTAPI_TXMODE_MIN16: c_int = 4;
pub const DTAPI_TXMODE_RAW: c_int = 5;

// Stuffing modes (SetTxMode StuffMode)
pub const DTAPI_STUFF_NONE: c_int = 0;
pub const DTAPI_STUFF_NULLS: c_int = 1;

// Transmit-control states (SetTxControl / GetTxControl)
pub const DTAPI_TXCTRL_IDLE: c_int = 1;
pub const DTAPI_TXCTRL_HOLD: c_int = 2;
pub const DTAPI_TXCTRL_SEND: c_int = 3;

// Reset modes (Reset)
pub const DTAPI_FIFO_RESET: c_int = 0;
pub const DTAPI_FULL_RESET: c_int = 1;

// Detach modes (DtOutpChannel::Detach)
pub const DTAPI_INSTANT_DETACH: c_int = 1;
pub const DTAPI_WAIT_UNTIL_SENT: c_int = 2;

// Transmit status flags (GetFlags)
pub const DTAPI_TX_FIFO_UFL: c_int = 0x0002;
pub const DTAPI_TX_MUX_OVF: c_int = 0x0004;
pub const DTAPI_TX_READBACK_ERR: c_int = 0x0008;
pub const DTAPI_TX_SYNC_ERR: c_int = 0x0010;
pub const DTAPI_TX_TARGET_ERR: c_int = 0x0020;
pub const DTAPI_TX_LINK_ERR: c_int = 0x0040;
pub const DTAPI_TX_DATA_ERR: c_int = 0x0080;

/// Symbol table of the DTAPI shim library.
///
/// Every field is a function pointer resolved once in [`DtapiLib::new`]. The
/// `Library` is kept alive for as long as the table exists, so the pointers
/// never dangle.
pub struct DtapiLib {
    __library: libloading::Library,
    pub dtapi_device_new: unsafe extern "C" fn() -> DtDevice,
    pub dtapi_device_delete: unsafe extern "C" fn(device: DtDevice),
    pub dtapi_device_attach_to_type:
        unsafe extern "C" fn(device: DtDevice, type_number: c_int) -> DTAPI_RESULT,
    pub dtapi_device_detach: unsafe extern "C" fn(device: DtDevice) -> DTAPI_RESULT,
    pub dtapi_outp_new: unsafe extern "C" fn() -> DtOutpChannel,
    pub dtapi_outp_delete: unsafe extern "C" fn(channel: DtOutpChannel),
    pub dtapi_outp_attach_to_port:
        unsafe extern "C" fn(channel: DtOutpChannel, device: DtDevice, port: c_int) -> DTAPI_RESULT,
    pub dtapi_outp_detach:
        unsafe extern "C" fn(channel: DtOutpChannel, detach_mode: c_int) -> DTAPI_RESULT,
    pub dtapi_outp_set_tx_mode: unsafe extern "C" fn(
        channel: DtOutpChannel,
        tx_mode: c_int,
        stuff_mode: c_int,
    ) -> DTAPI_RESULT,
    pub dtapi_outp_get_tx_mode: unsafe extern "C" fn(
        channel: DtOutpChannel,
        tx_mode: *mut c_int,
        stuff_mode: *mut c_int,
    ) -> DTAPI_RESULT,
    pub dtapi_outp_set_ts_rate_bps:
        unsafe extern "C" fn(channel: DtOutpChannel, ts_rate: c_int) -> DTAPI_RESULT,
    pub dtapi_outp_get_ts_rate_bps:
        unsafe extern "C" fn(channel: DtOutpChannel, ts_rate: *mut c_int) -> DTAPI_RESULT,
    pub dtapi_outp_set_rf_mode:
        unsafe extern "C" fn(channel: DtOutpChannel, rf_mode: c_int) -> DTAPI_RESULT,
    pub dtapi_outp_set_rf_control:
        unsafe extern "C" fn(channel: DtOutpChannel, frequency: i64) -> DTAPI_RESULT,
    pub dtapi_outp_get_rf_control: unsafe extern "C" fn(
        channel: DtOutpChannel,
        frequency: *mut i64,
        lock_status: *mut c_int,
    ) -> DTAPI_RESULT,
    pub dtapi_outp_set_output_level:
        unsafe extern "C" fn(channel: DtOutpChannel, level: c_int) -> DTAPI_RESULT,
    pub dtapi_outp_get_output_level:
        unsafe extern "C" fn(channel: DtOutpChannel, level: *mut c_int) -> DTAPI_RESULT,
    pub dtapi_outp_set_mod_control: unsafe extern "C" fn(
        channel: DtOutpChannel,
        mod_type: c_int,
        par_xtra0: c_int,
        par_xtra1: c_int,
        par_xtra2: c_int,
    ) -> DTAPI_RESULT,
    pub dtapi_outp_get_mod_control: unsafe extern "C" fn(
        channel: DtOutpChannel,
        mod_type: *mut c_int,
        par_xtra0: *mut c_int,
        par_xtra1: *mut c_int,
        par_xtra2: *mut c_int,
    ) -> DTAPI_RESULT,
    pub dtapi_outp_set_tx_control:
        unsafe extern "C" fn(channel: DtOutpChannel, tx_control: c_int) -> DTAPI_RESULT,
    pub dtapi_outp_write: unsafe extern "C" fn(
        channel: DtOutpChannel,
        buffer: *const c_char,
        num_bytes: c_int,
    ) -> DTAPI_RESULT,
    pub dtapi_outp_get_flags: unsafe extern "C" fn(
        channel: DtOutpChannel,
        status: *mut c_int,
        latched: *mut c_int,
    ) -> DTAPI_RESULT,
    pub dtapi_outp_get_fifo_load:
        unsafe extern "C" fn(channel: DtOutpChannel, fifo_load: *mut c_int) -> DTAPI_RESULT,
    pub dtapi_outp_get_fifo_size:
        unsafe extern "C" fn(channel: DtOutpChannel, fifo_size: *mut c_int) -> DTAPI_RESULT,
    pub dtapi_outp_reset:
        unsafe extern "C" fn(channel: DtOutpChannel, reset_mode: c_int) -> DTAPI_RESULT,
}

/// Resolves one symbol and copies the function pointer out of it.
unsafe fn symbol<T: Copy>(library: &libloading::Library, name: &[u8]) -> Result<T, libloading::Error> {
    unsafe { library.get::<T>(name).map(|sym| *sym) }
}

impl DtapiLib {
    /// Loads the shim library at `path` and resolves every symbol.
    ///
    /// Fails if the library cannot be opened or any symbol is missing.
    pub unsafe fn new<P>(path: P) -> Result<Self, libloading::Error>
    where
        P: AsRef<std::ffi::OsStr>,
    {
        let library = unsafe { libloading::Library::new(path) }?;
        unsafe { Self::from_library(library) }
    }

    /// Resolves every symbol from an already opened library.
    pub unsafe fn from_library(library: libloading::Library) -> Result<Self, libloading::Error> {
        unsafe {
            Ok(Self {
                dtapi_device_new: symbol(&library, b"dtapi_device_new\0")?,
                dtapi_device_delete: symbol(&library, b"dtapi_device_delete\0")?,
                dtapi_device_attach_to_type: symbol(&library, b"dtapi_device_attach_to_type\0")?,
                dtapi_device_detach: symbol(&library, b"dtapi_device_detach\0")?,
                dtapi_outp_new: symbol(&library, b"dtapi_outp_new\0")?,
                dtapi_outp_delete: symbol(&library, b"dtapi_outp_delete\0")?,
                dtapi_outp_attach_to_port: symbol(&library, b"dtapi_outp_attach_to_port\0")?,
                dtapi_outp_detach: symbol(&library, b"dtapi_outp_detach\0")?,
                dtapi_outp_set_tx_mode: symbol(&library, b"dtapi_outp_set_tx_mode\0")?,
                dtapi_outp_get_tx_mode: symbol(&library, b"dtapi_outp_get_tx_mode\0")?,
                dtapi_outp_set_ts_rate_bps: symbol(&library, b"dtapi_outp_set_ts_rate_bps\0")?,
                dtapi_outp_get_ts_rate_bps: symbol(&library, b"dtapi_outp_get_ts_rate_bps\0")?,
                dtapi_outp_set_rf_mode: symbol(&library, b"dtapi_outp_set_rf_mode\0")?,
                dtapi_outp_set_rf_control: symbol(&library, b"dtapi_outp_set_rf_control\0")?,
                dtapi_outp_get_rf_control: symbol(&library, b"dtapi_outp_get_rf_control\0")?,
                dtapi_outp_set_output_level: symbol(&library, b"dtapi_outp_set_output_level\0")?,
                dtapi_outp_get_output_level: symbol(&library, b"dtapi_outp_get_output_level\0")?,
                dtapi_outp_set_mod_control: symbol(&library, b"dtapi_outp_set_mod_control\0")?,
                dtapi_outp_get_mod_control: symbol(&library, b"dtapi_outp_get_mod_control\0")?,
                dtapi_outp_set_tx_control: symbol(&library, b"dtapi_outp_set_tx_control\0")?,
                dtapi_outp_write: symbol(&library, b"dtapi_outp_write\0")?,
                dtapi_outp_get_flags: symbol(&library, b"dtapi_outp_get_flags\0")?,
                dtapi_outp_get_fifo_load: symbol(&library, b"dtapi_outp_get_fifo_load\0")?,
                dtapi_outp_get_fifo_size: symbol(&library, b"dtapi_outp_get_fifo_size\0")?,
                dtapi_outp_reset: symbol(&library, b"dtapi_outp_reset\0")?,
                __library: library,
            })
        }
    }
}
