// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

//! In-memory mirror of the modulator parameters.
//!
//! [`ModulationParameters`] holds every value the sink pushes to the output
//! channel. It can be fully configured before any hardware exists; the sync
//! layer in [`crate::modulator`] pushes it down on start and refreshes it from
//! the channel while attached.
//!
//! The five DVB-T fields that share the `ParXtra1` word of `SetModControl`
//! are kept as typed enums in [`DvbtParameters`] and only packed into the wire
//! word at the hardware boundary.

use dtapi_sys::*;

use crate::{Error, Result};

/// Sets the bits of `mask` in `word` to `value`, leaving all other bits alone.
///
/// # Panics
///
/// Panics if `value` has bits set outside of `mask`. Callers pass values of
/// the typed enums below, whose discriminants always sit inside their mask.
pub fn assign_masked_field(word: i32, mask: i32, value: i32) -> i32 {
    assert!(
        value & !mask == 0,
        "value {value:#x} has bits outside of mask {mask:#x}"
    );
    (word & !mask) | value
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident($glib_name:literal) {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:path => ($vname:literal, $nick:literal)
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "glib", derive(glib::Enum))]
        #[cfg_attr(feature = "glib", enum_type(name = $glib_name))]
        #[repr(i32)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[cfg_attr(feature = "glib", enum_value(name = $vname, nick = $nick))]
                $variant = $value,
            )+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Looks up the value with the given SDK constant.
            pub fn from_raw(raw: i32) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.raw() == raw)
            }

            /// The SDK constant for this value.
            pub const fn raw(self) -> i32 {
                self as i32
            }
        }
    };
}

wire_enum! {
    /// Forward error correction code rate (`ParXtra0`).
    pub enum CodeRate("GstDtapiSinkCodeRate") {
        Rate1_2 = DTAPI_MOD_1_2 => ("1/2", "1/2"),
        Rate2_3 = DTAPI_MOD_2_3 => ("2/3", "2/3"),
        Rate3_4 = DTAPI_MOD_3_4 => ("3/4", "3/4"),
        Rate4_5 = DTAPI_MOD_4_5 => ("4/5", "4/5"),
        Rate5_6 = DTAPI_MOD_5_6 => ("5/6", "5/6"),
        Rate6_7 = DTAPI_MOD_6_7 => ("6/7", "6/7"),
        Rate7_8 = DTAPI_MOD_7_8 => ("7/8", "7/8"),
        Rate1_4 = DTAPI_MOD_1_4 => ("1/4", "1/4"),
        Rate1_3 = DTAPI_MOD_1_3 => ("1/3", "1/3"),
        Rate2_5 = DTAPI_MOD_2_5 => ("2/5", "2/5"),
        Rate3_5 = DTAPI_MOD_3_5 => ("3/5", "3/5"),
        Rate8_9 = DTAPI_MOD_8_9 => ("8/9", "8/9"),
        Rate9_10 = DTAPI_MOD_9_10 => ("9/10", "9/10"),
    }
}

wire_enum! {
    /// DVB-T channel bandwidth.
    pub enum Bandwidth("GstDtapiSinkBandwidth") {
        Mhz5 = DTAPI_MOD_DVBT_5MHZ => ("5 MHz", "5"),
        Mhz6 = DTAPI_MOD_DVBT_6MHZ => ("6 MHz", "6"),
        Mhz7 = DTAPI_MOD_DVBT_7MHZ => ("7 MHz", "7"),
        Mhz8 = DTAPI_MOD_DVBT_8MHZ => ("8 MHz", "8"),
    }
}

wire_enum! {
    /// DVB-T constellation.
    pub enum Constellation("GstDtapiSinkModulation") {
        Qpsk = DTAPI_MOD_DVBT_QPSK => ("QPSK", "qpsk"),
        Qam16 = DTAPI_MOD_DVBT_QAM16 => ("QAM 16", "qam-16"),
        Qam64 = DTAPI_MOD_DVBT_QAM64 => ("QAM 64", "qam-64"),
    }
}

wire_enum! {
    /// DVB-T guard interval, as a fraction of the useful symbol time.
    pub enum GuardInterval("GstDtapiSinkGuard") {
        G1_32 = DTAPI_MOD_DVBT_G_1_32 => ("1/32", "32"),
        G1_16 = DTAPI_MOD_DVBT_G_1_16 => ("1/16", "16"),
        G1_8 = DTAPI_MOD_DVBT_G_1_8 => ("1/8", "8"),
        G1_4 = DTAPI_MOD_DVBT_G_1_4 => ("1/4", "4"),
    }
}

wire_enum! {
    /// DVB-T interleaver depth.
    pub enum Interleaving("GstDtapiSinkInterleaving") {
        InDepth = DTAPI_MOD_DVBT_INDEPTH => ("In-depth", "indepth"),
        Native = DTAPI_MOD_DVBT_NATIVE => ("Native", "native"),
    }
}

wire_enum! {
    /// DVB-T FFT size.
    pub enum TransmissionMode("GstDtapiSinkTransmissionMode") {
        Mode2K = DTAPI_MOD_DVBT_2K => ("2K", "2k"),
        Mode4K = DTAPI_MOD_DVBT_4K => ("4K", "4k"),
        Mode8K = DTAPI_MOD_DVBT_8K => ("8K", "8k"),
    }
}

wire_enum! {
    /// Spectral inversion, OR-ed into the RF mode.
    pub enum Inversion("GstDtapiSinkInversion") {
        Off = DTAPI_UPCONV_NORMAL => ("Off", "off"),
        On = DTAPI_UPCONV_SPECINV => ("On", "on"),
    }
}

wire_enum! {
    /// Packet size / framing of the transport stream written to the FIFO.
    pub enum TxMode("GstDtapiSinkTxMode") {
        Tx188 = DTAPI_TXMODE_188 => ("188", "188"),
        Tx192 = DTAPI_TXMODE_192 => ("192", "192"),
        Tx204 = DTAPI_TXMODE_204 => ("204", "204"),
        Add16 = DTAPI_TXMODE_ADD16 => ("ADD16", "ADD16"),
        Min16 = DTAPI_TXMODE_MIN16 => ("MIN16", "MIN16"),
        Raw = DTAPI_TXMODE_RAW => ("RAW", "RAW"),
    }
}

wire_enum! {
    /// What the modulator sends when no packet data is available.
    pub enum Stuffing("GstDtapiSinkStuffing") {
        None = DTAPI_STUFF_NONE => ("None", "none"),
        Nulls = DTAPI_STUFF_NULLS => ("NULL Packets", "nulls"),
    }
}

// FIXME: what is a sane default?
pub const DEFAULT_BITRATE: i32 = 24_128_342;
pub const DEFAULT_FREQUENCY: i64 = 474_000_000;
/// In 0.1 dBm.
pub const DEFAULT_OUTPUT_LEVEL: i32 = -495;
pub const DEFAULT_CODE_RATE: CodeRate = CodeRate::Rate2_3;
pub const DEFAULT_BANDWIDTH: Bandwidth = Bandwidth::Mhz8;
pub const DEFAULT_CONSTELLATION: Constellation = Constellation::Qam64;
pub const DEFAULT_GUARD: GuardInterval = GuardInterval::G1_32;
pub const DEFAULT_INTERLEAVING: Interleaving = Interleaving::Native;
pub const DEFAULT_TRANSMISSION_MODE: TransmissionMode = TransmissionMode::Mode8K;
pub const DEFAULT_INVERSION: Inversion = Inversion::Off;
pub const DEFAULT_TX_MODE: TxMode = TxMode::Tx188;
pub const DEFAULT_STUFFING: Stuffing = Stuffing::Nulls;

/// Lowest output level a user may request, in dBm.
pub const MIN_OUTPUT_POWER_DBM: f64 = -35.0;
/// Highest output level a user may request, in dBm.
pub const MAX_OUTPUT_POWER_DBM: f64 = 0.0;

/// Converts a level in dBm to the 0.1 dBm units of `SetOutputLevel`.
pub fn dbm_to_level(dbm: f64) -> i32 {
    (dbm * 10.0).round() as i32
}

/// Converts a level in 0.1 dBm to dBm.
pub fn level_to_dbm(level: i32) -> f64 {
    f64::from(level) / 10.0
}

/// The five DVB-T fields carried in the `ParXtra1` word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DvbtParameters {
    pub bandwidth: Bandwidth,
    pub constellation: Constellation,
    pub guard: GuardInterval,
    pub interleaving: Interleaving,
    pub transmission_mode: TransmissionMode,
}

impl Default for DvbtParameters {
    fn default() -> Self {
        DvbtParameters {
            bandwidth: DEFAULT_BANDWIDTH,
            constellation: DEFAULT_CONSTELLATION,
            guard: DEFAULT_GUARD,
            interleaving: DEFAULT_INTERLEAVING,
            transmission_mode: DEFAULT_TRANSMISSION_MODE,
        }
    }
}

impl DvbtParameters {
    /// Packs the fields into the `ParXtra1` wire word.
    pub fn pack(&self) -> i32 {
        [
            (DTAPI_MOD_DVBT_BW_MSK, self.bandwidth.raw()),
            (DTAPI_MOD_DVBT_CO_MSK, self.constellation.raw()),
            (DTAPI_MOD_DVBT_GU_MSK, self.guard.raw()),
            (DTAPI_MOD_DVBT_IL_MSK, self.interleaving.raw()),
            (DTAPI_MOD_DVBT_MD_MSK, self.transmission_mode.raw()),
        ]
        .into_iter()
        .fold(0, |word, (mask, value)| assign_masked_field(word, mask, value))
    }

    /// Unpacks a `ParXtra1` word read back from hardware.
    ///
    /// Fails on the first field whose bits do not match a known value.
    pub fn unpack(word: i32) -> Result<Self> {
        fn field<T>(
            word: i32,
            mask: i32,
            name: &'static str,
            from_raw: fn(i32) -> Option<T>,
        ) -> Result<T> {
            let value = word & mask;
            from_raw(value).ok_or(Error::InvalidParameter { field: name, value })
        }

        Ok(DvbtParameters {
            bandwidth: field(word, DTAPI_MOD_DVBT_BW_MSK, "bandwidth", Bandwidth::from_raw)?,
            constellation: field(
                word,
                DTAPI_MOD_DVBT_CO_MSK,
                "modulation",
                Constellation::from_raw,
            )?,
            guard: field(word, DTAPI_MOD_DVBT_GU_MSK, "guard", GuardInterval::from_raw)?,
            interleaving: field(
                word,
                DTAPI_MOD_DVBT_IL_MSK,
                "interleaving",
                Interleaving::from_raw,
            )?,
            transmission_mode: field(
                word,
                DTAPI_MOD_DVBT_MD_MSK,
                "trans-mode",
                TransmissionMode::from_raw,
            )?,
        })
    }
}

/// Arguments of `SetModControl` / results of `GetModControl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModControl {
    pub mod_type: i32,
    pub par_xtra0: i32,
    pub par_xtra1: i32,
    pub par_xtra2: i32,
}

/// Every parameter the sink pushes to an output channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulationParameters {
    /// Transport stream rate in bits per second
    pub ts_rate_bps: i32,

    /// RF carrier frequency in Hz
    pub frequency_hz: i64,

    pub code_rate: CodeRate,
    pub dvbt: DvbtParameters,
    pub inversion: Inversion,
    pub tx_mode: TxMode,
    pub stuffing: Stuffing,

    /// Output level in 0.1 dBm
    pub output_level: i32,
}

impl Default for ModulationParameters {
    fn default() -> Self {
        ModulationParameters {
            ts_rate_bps: DEFAULT_BITRATE,
            frequency_hz: DEFAULT_FREQUENCY,
            code_rate: DEFAULT_CODE_RATE,
            dvbt: DvbtParameters::default(),
            inversion: DEFAULT_INVERSION,
            tx_mode: DEFAULT_TX_MODE,
            stuffing: DEFAULT_STUFFING,
            output_level: DEFAULT_OUTPUT_LEVEL,
        }
    }
}

impl ModulationParameters {
    /// The `SetRfMode` word: normal upconversion plus the inversion flag.
    pub fn rf_mode(&self) -> i32 {
        DTAPI_UPCONV_NORMAL | self.inversion.raw()
    }

    /// The full `SetModControl` argument set for DVB-T.
    pub fn mod_control(&self) -> ModControl {
        ModControl {
            mod_type: DTAPI_MOD_DVBT,
            par_xtra0: self.code_rate.raw(),
            par_xtra1: self.dvbt.pack(),
            par_xtra2: -1,
        }
    }

    pub fn output_power_dbm(&self) -> f64 {
        level_to_dbm(self.output_level)
    }

    pub fn set_output_power_dbm(&mut self, dbm: f64) {
        self.output_level = dbm_to_level(dbm);
    }
}
