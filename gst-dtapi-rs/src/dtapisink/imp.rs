//! DTAPI Sink Implementation
//!
//! This module contains the core implementation of the dtapisink element.
//! All modulator logic lives in [`dtapi::Modulator`]; the element maps
//! GStreamer callbacks onto it and turns its errors into bus messages.
//!
//! ## Implementation Structure
//! - `DtapiSink`: settings, the modulator behind one mutex, and a separate
//!   cancellation handle so `unlock()` never waits for a blocked `render()`
//! - `ObjectImpl`: GObject property system integration
//! - `ElementImpl`: element metadata and pad template
//! - `BaseSinkImpl`: start, stop, render, unlock, unlock_stop

// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

use gst::glib;
use gst::prelude::*;
use gst::subclass::prelude::*;
use gst_base::prelude::BaseSinkExt;
use gst_base::subclass::prelude::*;
use gstreamer as gst;
use gstreamer_base as gst_base;

use dtapi::config::get_dtapi_so_path;
use dtapi::{
    Canceller, Diagnostics, DtapiChannel, DtapiHardware, Modulator, PropertyId, Reporter,
};
use tracing::trace;

use std::cell::RefCell;
use std::sync::LazyLock;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::dtapisink;
use crate::dtapisink::properties;
use crate::dtapisink::state::{DEFAULT_BLOCKSIZE, Settings};

/// GStreamer debug category for dtapisink messages.
///
/// Set GST_DEBUG=dtapisink:5 to see TRACE-level logs.
pub(crate) static CAT: LazyLock<gst::DebugCategory> = LazyLock::new(|| {
    gst::DebugCategory::new(
        "dtapisink",
        gst::DebugColorFlags::empty(),
        Some("DekTec DTAPI Sink"),
    )
});

/// DTAPI Sink element implementation.
#[derive(Default)]
pub struct DtapiSink {
    /// Hardware selection (device-type, port)
    settings: Mutex<Settings>,

    /// Parameter store and hardware handles
    modulator: Mutex<Modulator<DtapiHardware>>,

    /// Shares the output channel with the modulator while attached.
    /// Locked on its own so unlock() does not wait for render().
    canceller: Mutex<Option<Canceller<DtapiChannel>>>,
}

#[glib::object_subclass]
impl ObjectSubclass for DtapiSink {
    const NAME: &'static str = "GstDtapiSink";
    type Type = dtapisink::DtapiSink;
    type ParentType = gst_base::BaseSink;
}

/// Non-fatal failures collected while the modulator is locked.
///
/// They are posted only after the lock is released: a synchronous bus
/// handler may read properties, which locks the modulator again.
#[derive(Default)]
struct PendingErrors(RefCell<Vec<String>>);

impl Reporter for PendingErrors {
    fn report(&self, context: &str, error: &dtapi::Error) {
        self.0.borrow_mut().push(format!("{context}: {error}"));
    }
}

/// Console output for the `tracing` feature. `RUST_LOG` overrides the
/// default of debug output from the modulator crates only.
#[cfg(feature = "tracing")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dtapi=debug,gstdtapi=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .finish()
        .try_init();
}

impl ObjectImpl for DtapiSink {
    fn properties() -> &'static [glib::ParamSpec] {
        static PROPERTIES: LazyLock<Vec<glib::ParamSpec>> = LazyLock::new(|| {
            let mut properties = properties::modulation_param_specs();
            properties.extend([
                // Which hardware to attach to on start
                glib::ParamSpecInt::builder("device-type")
                    .nick("Device type")
                    .blurb("Hardware type number of the modulator (e.g. 215 for a DTU-215)")
                    .minimum(0)
                    .maximum(i32::MAX)
                    .default_value(dtapi::config::DEFAULT_DEVICE_TYPE)
                    .mutable_ready()
                    .build(),
                glib::ParamSpecInt::builder("port")
                    .nick("Port")
                    .blurb("Output port on the device")
                    .minimum(1)
                    .maximum(i32::MAX)
                    .default_value(dtapi::config::DEFAULT_PORT)
                    .mutable_ready()
                    .build(),
                // Diagnostics, updated after every buffer
                glib::ParamSpecInt::builder("fifo-load")
                    .nick("FIFO load")
                    .blurb("Bytes in the transmit FIFO after the last buffer")
                    .minimum(0)
                    .read_only()
                    .build(),
                glib::ParamSpecInt::builder("fifo-size")
                    .nick("FIFO size")
                    .blurb("Size of the transmit FIFO in bytes")
                    .minimum(0)
                    .read_only()
                    .build(),
                glib::ParamSpecUInt64::builder("bytes-written")
                    .nick("Bytes written")
                    .blurb("Bytes written to the transmit FIFO since start")
                    .read_only()
                    .build(),
            ]);
            properties
        });

        PROPERTIES.as_ref()
    }

    fn constructed(&self) {
        #[cfg(feature = "tracing")]
        init_tracing();

        self.parent_constructed();

        // The hardware clocks the stream out at the configured TS rate
        let obj = self.obj();
        obj.set_sync(false);
        obj.set_blocksize(DEFAULT_BLOCKSIZE);
    }

    fn set_property(&self, _id: usize, value: &glib::Value, pspec: &glib::ParamSpec) {
        let name = pspec.name();

        if let Some(id) = PropertyId::from_name(name) {
            let property = match properties::from_value(id, value) {
                Ok(property) => property,
                Err(err) => {
                    gst::error!(CAT, imp = self, "Invalid value for {}: {}", name, err);
                    return;
                }
            };
            gst::info!(CAT, imp = self, "Setting {} to {:?}", name, property);
            if self
                .with_modulator(|modulator, reporter| modulator.set_property(property, reporter))
                .is_none()
            {
                gst::error!(CAT, imp = self, "Modulator mutex poisoned, {} ignored", name);
            }
            return;
        }

        let Ok(mut settings) = self.settings.lock() else {
            gst::error!(CAT, imp = self, "Settings mutex poisoned, {} ignored", name);
            return;
        };
        match (name, value.get::<i32>()) {
            ("device-type", Ok(device_type)) => {
                gst::info!(
                    CAT,
                    imp = self,
                    "Changing device-type from {} to {}",
                    settings.device_type,
                    device_type
                );
                settings.device_type = device_type;
            }
            ("port", Ok(port)) => {
                gst::info!(
                    CAT,
                    imp = self,
                    "Changing port from {} to {}",
                    settings.port,
                    port
                );
                settings.port = port;
            }
            (other, _) => {
                gst::error!(CAT, imp = self, "Cannot set property '{}'", other);
            }
        }
    }

    fn property(&self, _id: usize, pspec: &glib::ParamSpec) -> glib::Value {
        let name = pspec.name();

        if let Some(id) = PropertyId::from_name(name) {
            let property =
                self.with_modulator(|modulator, reporter| modulator.property(id, reporter));
            return match property {
                Some(property) => properties::to_value(property),
                None => {
                    gst::error!(CAT, imp = self, "Modulator mutex poisoned, reading {}", name);
                    pspec.default_value().clone()
                }
            };
        }

        match name {
            "device-type" => self.settings().device_type.to_value(),
            "port" => self.settings().port.to_value(),
            "fifo-load" => self.diagnostics().fifo_load.to_value(),
            "fifo-size" => self.diagnostics().fifo_size.to_value(),
            "bytes-written" => self.diagnostics().bytes_written.to_value(),
            _ => {
                gst::error!(CAT, imp = self, "Unknown property {}", name);
                pspec.default_value().clone()
            }
        }
    }
}

impl DtapiSink {
    /// Runs `f` on the locked modulator, then posts whatever it reported as
    /// element errors once the lock is released.
    ///
    /// Returns `None` when the modulator mutex is poisoned.
    pub(super) fn with_modulator<R>(
        &self,
        f: impl FnOnce(&mut Modulator<DtapiHardware>, &dyn Reporter) -> R,
    ) -> Option<R> {
        let pending = PendingErrors::default();
        let reporter: &dyn Reporter = &pending;
        let result = match self.modulator.lock() {
            Ok(mut modulator) => Some(f(&mut *modulator, reporter)),
            Err(_) => None,
        };
        for message in pending.0.into_inner() {
            gst::element_imp_error!(self, gst::ResourceError::OpenWrite, ["{}", message]);
        }
        result
    }

    fn settings(&self) -> Settings {
        self.settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn diagnostics(&self) -> Diagnostics {
        self.modulator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .diagnostics()
    }
}

impl GstObjectImpl for DtapiSink {}

impl ElementImpl for DtapiSink {
    fn metadata() -> Option<&'static gst::subclass::ElementMetadata> {
        static ELEMENT_METADATA: LazyLock<gst::subclass::ElementMetadata> = LazyLock::new(|| {
            gst::subclass::ElementMetadata::new(
                "DekTec DTAPI Sink",
                "Sink/Modulator",
                "Transmits an MPEG-2 transport stream on a DekTec DVB-T modulator",
                "Contributors to the gst-dtapi project",
            )
        });

        Some(&*ELEMENT_METADATA)
    }

    /// One always-present sink pad accepting MPEG-2 transport streams.
    fn pad_templates() -> &'static [gst::PadTemplate] {
        static PAD_TEMPLATES: LazyLock<Result<Vec<gst::PadTemplate>, glib::BoolError>> =
            LazyLock::new(|| {
                let caps = gst::Caps::builder("video/mpegts")
                    .field("mpegversion", 2i32)
                    .build();

                let sink_pad_template = gst::PadTemplate::new(
                    "sink",
                    gst::PadDirection::Sink,
                    gst::PadPresence::Always,
                    &caps,
                )?;

                Ok(vec![sink_pad_template])
            });

        match PAD_TEMPLATES.as_ref() {
            Ok(templates) => templates,
            Err(err) => {
                trace!("Failed to create pad templates: {:?}", err);
                &[]
            }
        }
    }
}

impl BaseSinkImpl for DtapiSink {
    /// Attaches to the hardware and pushes the configuration.
    ///
    /// Fails when the shim library cannot be loaded, or when the device or
    /// port cannot be claimed. Later configuration failures are posted as
    /// errors but do not fail the state change.
    fn start(&self) -> Result<(), gst::ErrorMessage> {
        let settings = self
            .settings
            .lock()
            .map_err(|e| {
                gst::error_msg!(
                    gst::CoreError::Failed,
                    ["Failed to get settings mutex: {}", e]
                )
            })?
            .clone();

        let api = dtapi::load_api(get_dtapi_so_path()).map_err(|e| {
            gst::error_msg!(
                gst::ResourceError::OpenWrite,
                ["Failed to load DTAPI library: {}", e]
            )
        })?;
        let hardware = DtapiHardware::new(api);

        let canceller = self
            .with_modulator(|modulator, reporter| {
                modulator
                    .start(&hardware, settings.device_type, settings.port, reporter)
                    .map(|()| modulator.canceller())
            })
            .ok_or_else(|| {
                gst::error_msg!(gst::CoreError::Failed, ["Modulator mutex poisoned"])
            })?
            .map_err(|e| gst::error_msg!(gst::ResourceError::OpenWrite, ["{}", e]))?;

        *self
            .canceller
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = canceller;

        gst::info!(
            CAT,
            imp = self,
            "Started on DTU-{} port {}",
            settings.device_type,
            settings.port
        );
        Ok(())
    }

    /// Releases the hardware. Never fails.
    fn stop(&self) -> Result<(), gst::ErrorMessage> {
        self.canceller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let mut modulator = self
            .modulator
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        modulator.stop();

        gst::info!(
            CAT,
            imp = self,
            "Stopped after {} bytes",
            modulator.diagnostics().bytes_written
        );
        Ok(())
    }

    fn render(&self, buffer: &gst::Buffer) -> Result<gst::FlowSuccess, gst::FlowError> {
        let map = buffer.map_readable().map_err(|_| {
            gst::element_imp_error!(self, gst::CoreError::Failed, ["Failed to map buffer"]);
            gst::FlowError::Error
        })?;

        let rendered = self
            .with_modulator(|modulator, reporter| {
                modulator
                    .render(map.as_slice(), reporter)
                    .map(|()| modulator.diagnostics())
            })
            .ok_or_else(|| {
                gst::element_imp_error!(
                    self,
                    gst::CoreError::Failed,
                    ["Modulator mutex poisoned"]
                );
                gst::FlowError::Error
            })?;
        match rendered {
            Ok(diagnostics) => {
                trace!(
                    size = map.size(),
                    fifo_load = diagnostics.fifo_load,
                    "Rendered buffer"
                );
                Ok(gst::FlowSuccess::Ok)
            }
            Err(dtapi::Error::NotAttached) => {
                gst::error!(CAT, imp = self, "Buffer received while not started");
                Err(gst::FlowError::Error)
            }
            // Already reported
            Err(_) => Err(gst::FlowError::Error),
        }
    }

    /// Flushes the transmit FIFO, which releases a blocked write.
    fn unlock(&self) -> Result<(), gst::ErrorMessage> {
        gst::debug!(CAT, imp = self, "Unlocking");

        let canceller = self
            .canceller
            .lock()
            .map_err(|e| {
                gst::error_msg!(
                    gst::CoreError::Failed,
                    ["Failed to lock canceller: {}", e]
                )
            })?
            .clone();

        match canceller {
            Some(canceller) => canceller.unlock().map_err(|e| {
                gst::error_msg!(
                    gst::ResourceError::OpenWrite,
                    ["Failed to reset FIFO: {}", e]
                )
            }),
            None => Ok(()),
        }
    }

    /// Returns the output to prebuffering.
    fn unlock_stop(&self) -> Result<(), gst::ErrorMessage> {
        gst::debug!(CAT, imp = self, "Unlock stop");

        let canceller = self
            .canceller
            .lock()
            .map_err(|e| {
                gst::error_msg!(
                    gst::CoreError::Failed,
                    ["Failed to lock canceller: {}", e]
                )
            })?
            .clone();

        match canceller {
            Some(canceller) => canceller.unlock_stop().map_err(|e| {
                gst::error_msg!(
                    gst::ResourceError::OpenWrite,
                    ["Failed to set TX control to hold: {}", e]
                )
            }),
            None => Ok(()),
        }
    }
}
