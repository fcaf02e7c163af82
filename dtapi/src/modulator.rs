// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

//! Lifecycle and transmit control of one modulator output.
//!
//! A [`Modulator`] owns the parameter store and, while attached, the device
//! and output channel handles. The element drives it from one thread and
//! guards it with a single mutex. Cancellation comes from another thread
//! through a [`Canceller`], which shares the channel but not that mutex.
//!
//! ```text
//! Uninitialized --start--> Attached(Hold) --render--> Attached(Send)
//!                               |                          |
//!                               +----------stop------------+--> Detached
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicI32, Ordering},
};

use tracing::{debug, info, trace, warn};

use crate::{
    Device, Error, Hardware, ModulationParameters, OutputChannel, Property, PropertyId, Result,
    Status, TxControl, TxFlags, param_sync,
};

/// Receives failures that must be surfaced but do not stop the operation.
pub trait Reporter {
    fn report(&self, context: &str, error: &Error);
}

impl<F: Fn(&str, &Error)> Reporter for F {
    fn report(&self, context: &str, error: &Error) {
        self(context, error)
    }
}

/// Observable state of a [`Modulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Uninitialized,
    /// Attached; carries the last transmit-control state that was accepted.
    Attached(TxControl),
    Detached,
}

/// Counters and the last observed transmit status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub bytes_written: u64,
    pub buffers_written: u64,
    pub flags: TxFlags,
    pub latched: TxFlags,
    pub fifo_load: i32,
    pub fifo_size: i32,
    pub lock_status: i32,
}

struct Link<C> {
    channel: C,
    tx_control: AtomicI32,
}

impl<C: OutputChannel> Link<C> {
    fn new(channel: C) -> Self {
        Self {
            channel,
            tx_control: AtomicI32::new(TxControl::Idle.raw()),
        }
    }

    fn set_tx_control(&self, state: TxControl) -> Result<()> {
        self.channel.set_tx_control(state)?;
        self.tx_control.store(state.raw(), Ordering::Release);
        Ok(())
    }

    fn tx_control(&self) -> TxControl {
        TxControl::from_raw(self.tx_control.load(Ordering::Acquire)).unwrap_or(TxControl::Idle)
    }
}

/// Handle for interrupting a blocked [`Modulator::render`] from another thread.
pub struct Canceller<C> {
    link: Arc<Link<C>>,
}

impl<C> Clone for Canceller<C> {
    fn clone(&self) -> Self {
        Self {
            link: self.link.clone(),
        }
    }
}

impl<C: OutputChannel> Canceller<C> {
    /// Flushes the transmit FIFO, which releases a pending write.
    pub fn unlock(&self) -> Result<()> {
        self.link.channel.reset_fifo()
    }

    /// Returns the channel to prebuffering.
    pub fn unlock_stop(&self) -> Result<()> {
        self.link.set_tx_control(TxControl::Hold)
    }
}

struct Attachment<H: Hardware> {
    link: Arc<Link<H::Channel>>,
    device: H::Device,
}

impl<H: Hardware> Drop for Attachment<H> {
    fn drop(&mut self) {
        self.link.channel.detach();
        self.device.detach();
    }
}

enum RunState<H: Hardware> {
    Uninitialized,
    Attached(Attachment<H>),
    Detached,
}

/// The modulator controller.
pub struct Modulator<H: Hardware> {
    params: ModulationParameters,
    diagnostics: Diagnostics,
    run: RunState<H>,
}

impl<H: Hardware> Default for Modulator<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Hardware> Modulator<H> {
    pub fn new() -> Self {
        Self::with_parameters(ModulationParameters::default())
    }

    pub fn with_parameters(params: ModulationParameters) -> Self {
        Self {
            params,
            diagnostics: Diagnostics::default(),
            run: RunState::Uninitialized,
        }
    }

    /// The cached parameters, without consulting the hardware.
    pub fn parameters(&self) -> &ModulationParameters {
        &self.params
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    pub fn state(&self) -> LinkState {
        match &self.run {
            RunState::Uninitialized => LinkState::Uninitialized,
            RunState::Attached(attachment) => LinkState::Attached(attachment.link.tx_control()),
            RunState::Detached => LinkState::Detached,
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.run, RunState::Attached(_))
    }

    /// Returns a cancellation handle for the current attachment.
    pub fn canceller(&self) -> Option<Canceller<H::Channel>> {
        match &self.run {
            RunState::Attached(attachment) => Some(Canceller {
                link: attachment.link.clone(),
            }),
            _ => None,
        }
    }

    /// Refreshes the cached parameters from the channel. No-op while unattached.
    pub fn resync(&mut self, reporter: &dyn Reporter) {
        if let RunState::Attached(attachment) = &self.run {
            param_sync::resync(
                &attachment.link.channel,
                &mut self.params,
                &mut self.diagnostics,
                reporter,
            );
        }
    }

    /// Reads one parameter, resynchronising from hardware first.
    pub fn property(&mut self, id: PropertyId, reporter: &dyn Reporter) -> Property {
        self.resync(reporter);
        self.params.get(id)
    }

    /// Stores one parameter and, while attached, applies it to the channel.
    ///
    /// An out-of-range value is reported and reaches neither the store nor
    /// the channel. A failed apply is reported; the stored value is kept.
    pub fn set_property(&mut self, value: Property, reporter: &dyn Reporter) {
        let id = value.id();
        self.resync(reporter);
        if let Err(err) = self.params.set(value) {
            reporter.report(id.failure_context(), &err);
            return;
        }

        if let RunState::Attached(attachment) = &self.run {
            debug!(property = id.name(), ?value, "Applying property");
            if let Err(err) = param_sync::apply(&attachment.link.channel, &self.params, id) {
                reporter.report(id.failure_context(), &err);
            }
        }
    }

    /// Attaches to the hardware and prepares the channel for transmission.
    ///
    /// Fails only when the device or the output port cannot be claimed.
    /// Configuration failures after that are reported and do not abort.
    pub fn start(
        &mut self,
        hardware: &H,
        device_type: i32,
        port: i32,
        reporter: &dyn Reporter,
    ) -> Result<()> {
        self.stop();

        let mut device = hardware.attach_device(device_type)?;
        let channel = match hardware.attach_channel(&device, port) {
            Ok(channel) => channel,
            Err(err) => {
                device.detach();
                return Err(err);
            }
        };
        let link = Arc::new(Link::new(channel));

        self.diagnostics = Diagnostics::default();
        param_sync::push_all(&link.channel, &self.params, reporter);

        if let Err(err) = link.set_tx_control(TxControl::Hold) {
            reporter.report("Failed to set TX control to hold", &err);
        }

        self.run = RunState::Attached(Attachment { link, device });
        self.resync(reporter);

        info!(device_type, port, "Attached modulator output");
        Ok(())
    }

    /// Writes one buffer to the transmit FIFO and requests transmission.
    pub fn render(&mut self, data: &[u8], reporter: &dyn Reporter) -> Result<()> {
        let link = match &self.run {
            RunState::Attached(attachment) => attachment.link.clone(),
            _ => return Err(Error::NotAttached),
        };

        if let Err(err) = link.channel.write(data) {
            reporter.report("Failed to write data", &err);
            return Err(err);
        }
        self.diagnostics.bytes_written += data.len() as u64;
        self.diagnostics.buffers_written += 1;

        match link.set_tx_control(TxControl::Send) {
            Ok(()) => {}
            Err(err) if err.status() == Some(Status::InsufficientLoad) => {
                trace!("Prebuffering, FIFO load too low to start modulation");
            }
            Err(err) => reporter.report("Failed to set TX control to send", &err),
        }

        match link.channel.flags() {
            Ok((flags, latched)) => {
                self.diagnostics.flags = flags;
                self.diagnostics.latched = latched;
                if !latched.is_empty() {
                    warn!(%latched, "Latched transmit errors");
                }
            }
            Err(err) => reporter.report("Failed to get flags", &err),
        }
        match link.channel.fifo_load() {
            Ok(load) => self.diagnostics.fifo_load = load,
            Err(err) => reporter.report("Failed to get FIFO load", &err),
        }
        match link.channel.fifo_size() {
            Ok(size) => self.diagnostics.fifo_size = size,
            Err(err) => reporter.report("Failed to get FIFO size", &err),
        }

        trace!(
            bytes = data.len(),
            total = self.diagnostics.bytes_written,
            fifo_load = self.diagnostics.fifo_load,
            fifo_size = self.diagnostics.fifo_size,
            flags = %self.diagnostics.flags,
            "Wrote buffer"
        );
        Ok(())
    }

    pub fn unlock(&self) -> Result<()> {
        self.canceller().ok_or(Error::NotAttached)?.unlock()
    }

    pub fn unlock_stop(&self) -> Result<()> {
        self.canceller().ok_or(Error::NotAttached)?.unlock_stop()
    }

    /// Releases the channel (without draining) and the device. Safe in any state.
    pub fn stop(&mut self) {
        match std::mem::replace(&mut self.run, RunState::Uninitialized) {
            RunState::Attached(attachment) => {
                drop(attachment);
                self.run = RunState::Detached;
                info!(
                    bytes_written = self.diagnostics.bytes_written,
                    "Detached modulator output"
                );
            }
            other => self.run = other,
        }
    }
}
