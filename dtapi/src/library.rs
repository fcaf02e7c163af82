// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

//! Hardware backend on top of the DTAPI shim library.
//!
//! [`load_api`] opens the shim once; [`DtapiHardware`] then hands out RAII
//! [`DtapiDevice`] / [`DtapiChannel`] handles. Both keep the library alive
//! through a shared [`DtapiApiHandle`] and free their SDK object on drop.

use std::{
    ffi::{OsStr, c_char, c_int},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use dtapi_sys::{DTAPI_FIFO_RESET, DTAPI_INSTANT_DETACH, DtapiLib};
use tracing::debug;

use crate::{
    Device, Error, Hardware, ModControl, OutputChannel, Result, Status, TxControl, TxFlags,
};

/// Shared handle to the loaded shim library.
pub type DtapiApiHandle = Arc<DtapiLib>;

/// Loads the DTAPI shim library and resolves all of its symbols.
///
/// # Examples
///
/// ```no_run
/// use dtapi::{load_api, DtapiHardware, Hardware};
///
/// # fn main() -> Result<(), dtapi::Error> {
/// let api = load_api(dtapi::config::get_dtapi_so_path())?;
/// let hardware = DtapiHardware::new(api);
/// let device = hardware.attach_device(215)?;
/// let channel = hardware.attach_channel(&device, 1)?;
/// # Ok(())
/// # }
/// ```
pub fn load_api<P: AsRef<OsStr>>(path: P) -> Result<DtapiApiHandle> {
    let lib = unsafe { DtapiLib::new(path) }?;
    Ok(Arc::new(lib))
}

/// [`Hardware`] implementation backed by the shim library.
#[derive(Clone)]
pub struct DtapiHardware {
    api: DtapiApiHandle,
}

impl DtapiHardware {
    pub fn new(api: DtapiApiHandle) -> Self {
        Self { api }
    }
}

impl Hardware for DtapiHardware {
    type Device = DtapiDevice;
    type Channel = DtapiChannel;

    fn attach_device(&self, type_number: i32) -> Result<DtapiDevice> {
        let raw = unsafe { (self.api.dtapi_device_new)() };
        if raw.is_null() {
            return Err(Error::Other("Failed to create DtDevice.".to_string()));
        }
        // From here on the drop impl frees `raw` on every path.
        let mut device = DtapiDevice {
            api: self.api.clone(),
            device: raw,
            attached: false,
        };
        match Status::from_raw(unsafe { (self.api.dtapi_device_attach_to_type)(raw, type_number) })
        {
            Status::Ok => {
                device.attached = true;
                Ok(device)
            }
            status => Err(Error::DeviceNotFound {
                type_number,
                status,
            }),
        }
    }

    fn attach_channel(&self, device: &DtapiDevice, port: i32) -> Result<DtapiChannel> {
        let raw = unsafe { (self.api.dtapi_outp_new)() };
        if raw.is_null() {
            return Err(Error::Other("Failed to create DtOutpChannel.".to_string()));
        }
        let channel = DtapiChannel {
            api: self.api.clone(),
            channel: raw,
            attached: AtomicBool::new(false),
        };
        match Status::from_raw(unsafe {
            (self.api.dtapi_outp_attach_to_port)(raw, device.device, port)
        }) {
            Status::Ok => {
                channel.attached.store(true, Ordering::Release);
                Ok(channel)
            }
            status => Err(Error::PortUnavailable { port, status }),
        }
    }
}

/// An attached `DtDevice`.
pub struct DtapiDevice {
    api: DtapiApiHandle,
    device: dtapi_sys::DtDevice,
    attached: bool,
}

// Safety: the device object is only touched by its owner; the SDK does not
// tie it to the creating thread.
unsafe impl Send for DtapiDevice {}

impl Device for DtapiDevice {
    fn detach(&mut self) {
        if std::mem::take(&mut self.attached) {
            let status = unsafe { (self.api.dtapi_device_detach)(self.device) };
            debug!("Detached device: {}", Status::from_raw(status));
        }
    }
}

impl Drop for DtapiDevice {
    fn drop(&mut self) {
        self.detach();
        unsafe { (self.api.dtapi_device_delete)(self.device) };
    }
}

/// An attached `DtOutpChannel`.
pub struct DtapiChannel {
    api: DtapiApiHandle,
    channel: dtapi_sys::DtOutpChannel,
    attached: AtomicBool,
}

// Safety: `Reset` and `SetTxControl` are issued from the cancellation thread
// while the streaming thread may be inside `Write`; the DTAPI driver
// serialises calls on one channel object.
unsafe impl Send for DtapiChannel {}
unsafe impl Sync for DtapiChannel {}

impl DtapiChannel {
    fn call(&self, f: impl FnOnce(&DtapiLib, dtapi_sys::DtOutpChannel) -> c_int) -> Result<()> {
        Error::from_status(f(&self.api, self.channel))
    }
}

impl OutputChannel for DtapiChannel {
    fn set_tx_mode(&self, tx_mode: i32, stuff_mode: i32) -> Result<()> {
        self.call(|api, ch| unsafe { (api.dtapi_outp_set_tx_mode)(ch, tx_mode, stuff_mode) })
    }

    fn tx_mode(&self) -> Result<(i32, i32)> {
        let (mut tx_mode, mut stuff_mode) = (0, 0);
        self.call(|api, ch| unsafe {
            (api.dtapi_outp_get_tx_mode)(ch, &mut tx_mode, &mut stuff_mode)
        })?;
        Ok((tx_mode, stuff_mode))
    }

    fn set_ts_rate_bps(&self, ts_rate: i32) -> Result<()> {
        self.call(|api, ch| unsafe { (api.dtapi_outp_set_ts_rate_bps)(ch, ts_rate) })
    }

    fn ts_rate_bps(&self) -> Result<i32> {
        let mut ts_rate = 0;
        self.call(|api, ch| unsafe { (api.dtapi_outp_get_ts_rate_bps)(ch, &mut ts_rate) })?;
        Ok(ts_rate)
    }

    fn set_rf_mode(&self, rf_mode: i32) -> Result<()> {
        self.call(|api, ch| unsafe { (api.dtapi_outp_set_rf_mode)(ch, rf_mode) })
    }

    fn set_rf_control(&self, frequency: i64) -> Result<()> {
        self.call(|api, ch| unsafe { (api.dtapi_outp_set_rf_control)(ch, frequency) })
    }

    fn rf_control(&self) -> Result<(i64, i32)> {
        let (mut frequency, mut lock_status) = (0, 0);
        self.call(|api, ch| unsafe {
            (api.dtapi_outp_get_rf_control)(ch, &mut frequency, &mut lock_status)
        })?;
        Ok((frequency, lock_status))
    }

    fn set_output_level(&self, level: i32) -> Result<()> {
        self.call(|api, ch| unsafe { (api.dtapi_outp_set_output_level)(ch, level) })
    }

    fn output_level(&self) -> Result<i32> {
        let mut level = 0;
        self.call(|api, ch| unsafe { (api.dtapi_outp_get_output_level)(ch, &mut level) })?;
        Ok(level)
    }

    fn set_mod_control(&self, control: ModControl) -> Result<()> {
        self.call(|api, ch| unsafe {
            (api.dtapi_outp_set_mod_control)(
                ch,
                control.mod_type,
                control.par_xtra0,
                control.par_xtra1,
                control.par_xtra2,
            )
        })
    }

    fn mod_control(&self) -> Result<ModControl> {
        let mut control = ModControl {
            mod_type: 0,
            par_xtra0: 0,
            par_xtra1: 0,
            par_xtra2: 0,
        };
        self.call(|api, ch| unsafe {
            (api.dtapi_outp_get_mod_control)(
                ch,
                &mut control.mod_type,
                &mut control.par_xtra0,
                &mut control.par_xtra1,
                &mut control.par_xtra2,
            )
        })?;
        Ok(control)
    }

    fn set_tx_control(&self, state: TxControl) -> Result<()> {
        self.call(|api, ch| unsafe { (api.dtapi_outp_set_tx_control)(ch, state.raw()) })
    }

    fn write(&self, data: &[u8]) -> Result<()> {
        let len = c_int::try_from(data.len()).map_err(|_| Error::Hardware(Status::InvalidSize))?;
        self.call(|api, ch| unsafe {
            (api.dtapi_outp_write)(ch, data.as_ptr() as *const c_char, len)
        })
    }

    fn flags(&self) -> Result<(TxFlags, TxFlags)> {
        let (mut status, mut latched) = (0, 0);
        self.call(|api, ch| unsafe { (api.dtapi_outp_get_flags)(ch, &mut status, &mut latched) })?;
        Ok((TxFlags(status), TxFlags(latched)))
    }

    fn fifo_load(&self) -> Result<i32> {
        let mut load = 0;
        self.call(|api, ch| unsafe { (api.dtapi_outp_get_fifo_load)(ch, &mut load) })?;
        Ok(load)
    }

    fn fifo_size(&self) -> Result<i32> {
        let mut size = 0;
        self.call(|api, ch| unsafe { (api.dtapi_outp_get_fifo_size)(ch, &mut size) })?;
        Ok(size)
    }

    fn reset_fifo(&self) -> Result<()> {
        self.call(|api, ch| unsafe { (api.dtapi_outp_reset)(ch, DTAPI_FIFO_RESET) })
    }

    fn detach(&self) {
        if self.attached.swap(false, Ordering::AcqRel) {
            let status = unsafe { (self.api.dtapi_outp_detach)(self.channel, DTAPI_INSTANT_DETACH) };
            debug!("Detached output channel: {}", Status::from_raw(status));
        }
    }
}

impl Drop for DtapiChannel {
    fn drop(&mut self) {
        self.detach();
        unsafe { (self.api.dtapi_outp_delete)(self.channel) };
    }
}
