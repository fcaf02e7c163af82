// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

//! Recording test double for the [`Hardware`] seam.
//!
//! [`MockHardware`] keeps one shared state behind a mutex: a log of every call
//! in order, the register values last set (returned by the getters), failures
//! to inject per operation, and counters of live handles for leak checks.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Condvar, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use dtapi::{
    Device, Error, Hardware, ModControl, ModulationParameters, OutputChannel, Result, Status,
    TxControl, TxFlags,
};

/// Ensures logging is initialized only once across all tests.
static LOG_ONCE: std::sync::Once = std::sync::Once::new();

pub fn init_logging() {
    // Respects RUST_LOG
    LOG_ONCE.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .with_test_writer()
            .try_init();
    });
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AttachDevice(i32),
    AttachChannel(i32),
    DetachDevice,
    SetTxMode(i32, i32),
    GetTxMode,
    SetTsRate(i32),
    GetTsRate,
    SetRfMode(i32),
    SetRfControl(i64),
    GetRfControl,
    SetOutputLevel(i32),
    GetOutputLevel,
    SetModControl(ModControl),
    GetModControl,
    SetTxControl(TxControl),
    Write(usize),
    GetFlags,
    GetFifoLoad,
    GetFifoSize,
    ResetFifo,
    DetachChannel,
}

impl Call {
    /// Key used for failure injection. Transmit-control calls are keyed per
    /// target state so that SEND can fail while HOLD succeeds.
    fn key(&self) -> String {
        match self {
            Call::AttachDevice(_) => "attach_device".into(),
            Call::AttachChannel(_) => "attach_channel".into(),
            Call::DetachDevice => "detach_device".into(),
            Call::SetTxMode(..) => "set_tx_mode".into(),
            Call::GetTxMode => "tx_mode".into(),
            Call::SetTsRate(_) => "set_ts_rate_bps".into(),
            Call::GetTsRate => "ts_rate_bps".into(),
            Call::SetRfMode(_) => "set_rf_mode".into(),
            Call::SetRfControl(_) => "set_rf_control".into(),
            Call::GetRfControl => "rf_control".into(),
            Call::SetOutputLevel(_) => "set_output_level".into(),
            Call::GetOutputLevel => "output_level".into(),
            Call::SetModControl(_) => "set_mod_control".into(),
            Call::GetModControl => "mod_control".into(),
            Call::SetTxControl(state) => format!("set_tx_control:{state:?}"),
            Call::Write(_) => "write".into(),
            Call::GetFlags => "flags".into(),
            Call::GetFifoLoad => "fifo_load".into(),
            Call::GetFifoSize => "fifo_size".into(),
            Call::ResetFifo => "reset_fifo".into(),
            Call::DetachChannel => "detach_channel".into(),
        }
    }

    pub fn is_setter(&self) -> bool {
        matches!(
            self,
            Call::SetTxMode(..)
                | Call::SetTsRate(_)
                | Call::SetRfMode(_)
                | Call::SetRfControl(_)
                | Call::SetOutputLevel(_)
                | Call::SetModControl(_)
                | Call::SetTxControl(_)
        )
    }
}

/// Values returned by the getters. Setters overwrite them.
#[derive(Debug, Clone)]
pub struct Registers {
    pub tx_mode: i32,
    pub stuff_mode: i32,
    pub ts_rate: i32,
    pub rf_mode: i32,
    pub frequency: i64,
    pub lock_status: i32,
    pub output_level: i32,
    pub mod_control: ModControl,
    pub tx_control: TxControl,
    pub flags: TxFlags,
    pub latched: TxFlags,
    pub fifo_load: i32,
    pub fifo_size: i32,
}

impl Default for Registers {
    fn default() -> Self {
        let params = ModulationParameters::default();
        Self {
            tx_mode: params.tx_mode.raw(),
            stuff_mode: params.stuffing.raw(),
            ts_rate: params.ts_rate_bps,
            rf_mode: params.rf_mode(),
            frequency: params.frequency_hz,
            lock_status: 1,
            output_level: params.output_level,
            mod_control: params.mod_control(),
            tx_control: TxControl::Idle,
            flags: TxFlags::default(),
            latched: TxFlags::default(),
            fifo_load: 0,
            fifo_size: 8 * 1024 * 1024,
        }
    }
}

pub struct MockState {
    pub calls: Vec<Call>,
    pub device_present: bool,
    pub port_available: bool,
    pub failures: HashMap<String, Status>,
    pub registers: Registers,
    pub devices_alive: i32,
    pub channels_alive: i32,
    /// Writes wait until a FIFO reset while this is set.
    pub block_writes: bool,
    pub write_blocked: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            device_present: true,
            port_available: true,
            failures: HashMap::new(),
            registers: Registers::default(),
            devices_alive: 0,
            channels_alive: 0,
            block_writes: false,
            write_blocked: false,
        }
    }
}

#[derive(Default)]
struct Shared {
    state: Mutex<MockState>,
    changed: Condvar,
}

#[derive(Clone, Default)]
pub struct MockHardware {
    shared: Arc<Shared>,
}

impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.shared.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Makes every call with the given key fail with `status`.
    pub fn fail(&self, key: &str, status: Status) {
        self.state().failures.insert(key.to_string(), status);
    }

    pub fn registers(&self) -> Registers {
        self.state().registers.clone()
    }

    pub fn alive(&self) -> (i32, i32) {
        let state = self.state();
        (state.devices_alive, state.channels_alive)
    }

    pub fn block_writes(&self) {
        self.state().block_writes = true;
    }

    /// Waits until a write is parked in [`MockHardware::block_writes`] mode.
    pub fn wait_for_blocked_write(&self) {
        let mut state = self.state();
        while !state.write_blocked {
            state = self.shared.changed.wait(state).unwrap();
        }
    }

    fn record(&self, call: Call) -> Result<()> {
        let mut state = self.state();
        let key = call.key();
        state.calls.push(call);
        match state.failures.get(&key) {
            Some(status) => Err(Error::Hardware(*status)),
            None => Ok(()),
        }
    }
}

pub struct MockDevice {
    hardware: MockHardware,
    attached: bool,
}

impl Device for MockDevice {
    fn detach(&mut self) {
        if std::mem::take(&mut self.attached) {
            let _ = self.hardware.record(Call::DetachDevice);
        }
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.detach();
        self.hardware.state().devices_alive -= 1;
    }
}

pub struct MockChannel {
    hardware: MockHardware,
    attached: AtomicBool,
}

impl Drop for MockChannel {
    fn drop(&mut self) {
        self.detach();
        self.hardware.state().channels_alive -= 1;
    }
}

impl Hardware for MockHardware {
    type Device = MockDevice;
    type Channel = MockChannel;

    fn attach_device(&self, type_number: i32) -> Result<MockDevice> {
        self.record(Call::AttachDevice(type_number))?;
        let mut state = self.state();
        if !state.device_present {
            return Err(Error::DeviceNotFound {
                type_number,
                status: Status::NoSuchDevice,
            });
        }
        state.devices_alive += 1;
        Ok(MockDevice {
            hardware: self.clone(),
            attached: true,
        })
    }

    fn attach_channel(&self, _device: &MockDevice, port: i32) -> Result<MockChannel> {
        self.record(Call::AttachChannel(port))?;
        let mut state = self.state();
        if !state.port_available {
            return Err(Error::PortUnavailable {
                port,
                status: Status::InUse,
            });
        }
        state.channels_alive += 1;
        Ok(MockChannel {
            hardware: self.clone(),
            attached: AtomicBool::new(true),
        })
    }
}

impl OutputChannel for MockChannel {
    fn set_tx_mode(&self, tx_mode: i32, stuff_mode: i32) -> Result<()> {
        self.hardware.record(Call::SetTxMode(tx_mode, stuff_mode))?;
        let mut state = self.hardware.state();
        state.registers.tx_mode = tx_mode;
        state.registers.stuff_mode = stuff_mode;
        Ok(())
    }

    fn tx_mode(&self) -> Result<(i32, i32)> {
        self.hardware.record(Call::GetTxMode)?;
        let registers = self.hardware.registers();
        Ok((registers.tx_mode, registers.stuff_mode))
    }

    fn set_ts_rate_bps(&self, ts_rate: i32) -> Result<()> {
        self.hardware.record(Call::SetTsRate(ts_rate))?;
        self.hardware.state().registers.ts_rate = ts_rate;
        Ok(())
    }

    fn ts_rate_bps(&self) -> Result<i32> {
        self.hardware.record(Call::GetTsRate)?;
        Ok(self.hardware.registers().ts_rate)
    }

    fn set_rf_mode(&self, rf_mode: i32) -> Result<()> {
        self.hardware.record(Call::SetRfMode(rf_mode))?;
        self.hardware.state().registers.rf_mode = rf_mode;
        Ok(())
    }

    fn set_rf_control(&self, frequency: i64) -> Result<()> {
        self.hardware.record(Call::SetRfControl(frequency))?;
        self.hardware.state().registers.frequency = frequency;
        Ok(())
    }

    fn rf_control(&self) -> Result<(i64, i32)> {
        self.hardware.record(Call::GetRfControl)?;
        let registers = self.hardware.registers();
        Ok((registers.frequency, registers.lock_status))
    }

    fn set_output_level(&self, level: i32) -> Result<()> {
        self.hardware.record(Call::SetOutputLevel(level))?;
        self.hardware.state().registers.output_level = level;
        Ok(())
    }

    fn output_level(&self) -> Result<i32> {
        self.hardware.record(Call::GetOutputLevel)?;
        Ok(self.hardware.registers().output_level)
    }

    fn set_mod_control(&self, control: ModControl) -> Result<()> {
        self.hardware.record(Call::SetModControl(control))?;
        self.hardware.state().registers.mod_control = control;
        Ok(())
    }

    fn mod_control(&self) -> Result<ModControl> {
        self.hardware.record(Call::GetModControl)?;
        Ok(self.hardware.registers().mod_control)
    }

    fn set_tx_control(&self, state: TxControl) -> Result<()> {
        self.hardware.record(Call::SetTxControl(state))?;
        self.hardware.state().registers.tx_control = state;
        Ok(())
    }

    fn write(&self, data: &[u8]) -> Result<()> {
        self.hardware.record(Call::Write(data.len()))?;
        let mut state = self.hardware.state();
        if state.block_writes {
            state.write_blocked = true;
            self.hardware.shared.changed.notify_all();
            while state.block_writes {
                state = self.hardware.shared.changed.wait(state).unwrap();
            }
            state.write_blocked = false;
        }
        state.registers.fifo_load += data.len() as i32;
        Ok(())
    }

    fn flags(&self) -> Result<(TxFlags, TxFlags)> {
        self.hardware.record(Call::GetFlags)?;
        let registers = self.hardware.registers();
        Ok((registers.flags, registers.latched))
    }

    fn fifo_load(&self) -> Result<i32> {
        self.hardware.record(Call::GetFifoLoad)?;
        Ok(self.hardware.registers().fifo_load)
    }

    fn fifo_size(&self) -> Result<i32> {
        self.hardware.record(Call::GetFifoSize)?;
        Ok(self.hardware.registers().fifo_size)
    }

    fn reset_fifo(&self) -> Result<()> {
        self.hardware.record(Call::ResetFifo)?;
        let mut state = self.hardware.state();
        state.registers.fifo_load = 0;
        state.block_writes = false;
        self.hardware.shared.changed.notify_all();
        Ok(())
    }

    fn detach(&self) {
        if self.attached.swap(false, Ordering::AcqRel) {
            let _ = self.hardware.record(Call::DetachChannel);
        }
    }
}

/// Collects non-fatal reports as `"<context>: <error>"` plus the status.
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(String, Option<Status>)>>,
}

impl RecordingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .map(|(message, _)| message.clone())
            .collect()
    }

    pub fn statuses(&self) -> Vec<Option<Status>> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .map(|(_, status)| *status)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().unwrap().is_empty()
    }
}

impl dtapi::Reporter for RecordingReporter {
    fn report(&self, context: &str, error: &Error) {
        self.reports
            .lock()
            .unwrap()
            .push((format!("{context}: {error}"), error.status()));
    }
}
