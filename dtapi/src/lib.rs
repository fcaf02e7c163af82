// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

//! # DTAPI - DekTec modulator control
//!
//! Safe Rust layer over the DekTec DTAPI SDK for driving a DVB-T modulator
//! output (DTU-215 and relatives) from a transport stream producer.
//!
//! ## Overview
//!
//! The SDK is a C++ library; it is reached through a small C-ABI shim
//! (`libdtapi.so`) that [`dtapi_sys`] loads at runtime. This crate wraps the
//! raw function table with RAII handles and typed parameters, and adds the
//! controller logic that the GStreamer sink is built on.
//!
//! ### Key Concepts
//!
//! - **Device / output channel**: hardware handles, attached by type number and port
//! - **Parameter store**: [`ModulationParameters`], configurable before anything is attached
//! - **Sync layer**: pushes the store to the channel on start, applies single
//!   changes, and refreshes the store from the channel before every access
//! - **Transmit control**: IDLE, HOLD (prebuffering) and SEND
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  attach   ┌──────────────────────────┐
//! │  Modulator   │──────────►│ Hardware (DtapiHardware  │
//! │ (controller) │           │  or a test double)       │
//! └──────┬───────┘           └──────────────────────────┘
//!        │ owns
//!        ├─► ModulationParameters
//!        ├─► Diagnostics
//!        └─► Device + Arc<OutputChannel> ◄── Canceller (unlock / unlock_stop)
//! ```
//!
//! ## Examples
//!
//! ```no_run
//! use dtapi::{DtapiHardware, Error, Modulator, Property, Bandwidth, load_api};
//!
//! # fn main() -> Result<(), dtapi::Error> {
//! let api = load_api(dtapi::config::get_dtapi_so_path())?;
//! let hardware = DtapiHardware::new(api);
//! let report = |context: &str, err: &Error| eprintln!("{context}: {err}");
//!
//! let mut modulator = Modulator::new();
//! modulator.set_property(Property::Frequency(618_000_000), &report);
//! modulator.set_property(Property::Bandwidth(Bandwidth::Mhz7), &report);
//!
//! modulator.start(&hardware, 215, 1, &report)?;
//! modulator.render(&[0x47; 188 * 7], &report)?;
//! modulator.stop();
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! - [`Modulator`] is `Send` and is meant to sit behind one mutex
//! - [`Canceller`] may be used from any thread while a render is blocked
//!
//! ## Feature Flags
//!
//! - `glib`: derive `glib::Enum` for the parameter enums

mod error;
mod hardware;
mod library;
mod modulator;
mod params;
mod property;

pub mod config;
pub mod param_sync;

pub use error::{Error, Result, Status, describe};
pub use hardware::{Device, Hardware, OutputChannel, TxControl, TxFlags};
pub use library::{DtapiApiHandle, DtapiChannel, DtapiDevice, DtapiHardware, load_api};
pub use modulator::{Canceller, Diagnostics, LinkState, Modulator, Reporter};
pub use params::*;
pub use property::{Property, PropertyId};
