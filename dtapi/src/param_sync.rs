// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

//! Moves [`ModulationParameters`] between memory and an attached channel.
//!
//! Nothing in here is fatal: every hardware call is independent, a failure is
//! handed to the [`Reporter`] and the remaining calls still run.

use tracing::trace;

use crate::{
    CodeRate, Diagnostics, DvbtParameters, Error, ModulationParameters, OutputChannel, PropertyId,
    Reporter, Result, Stuffing, TxMode,
};

fn report_err<T>(reporter: &dyn Reporter, context: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            reporter.report(context, &err);
            None
        }
    }
}

/// Overwrites the cached parameters with what the channel reports.
///
/// A failed read leaves the cached value of that field in place.
pub fn resync<C: OutputChannel + ?Sized>(
    channel: &C,
    params: &mut ModulationParameters,
    diagnostics: &mut Diagnostics,
    reporter: &dyn Reporter,
) {
    if let Some(rate) = report_err(reporter, "Failed to get TS rate", channel.ts_rate_bps()) {
        params.ts_rate_bps = rate;
    }

    if let Some((tx_mode, stuff_mode)) =
        report_err(reporter, "Failed to get txmode", channel.tx_mode())
    {
        let decoded = TxMode::from_raw(tx_mode)
            .ok_or(Error::InvalidParameter {
                field: "transmit-mode",
                value: tx_mode,
            })
            .and_then(|tx| {
                Stuffing::from_raw(stuff_mode)
                    .map(|stuff| (tx, stuff))
                    .ok_or(Error::InvalidParameter {
                        field: "stuffing",
                        value: stuff_mode,
                    })
            });
        if let Some((tx, stuff)) = report_err(reporter, "Failed to get txmode", decoded) {
            params.tx_mode = tx;
            params.stuffing = stuff;
        }
    }

    if let Some((frequency, lock_status)) =
        report_err(reporter, "Failed to get frequency", channel.rf_control())
    {
        params.frequency_hz = frequency;
        diagnostics.lock_status = lock_status;
    }

    if let Some(level) = report_err(reporter, "Failed to get output level", channel.output_level())
    {
        params.output_level = level;
    }

    if let Some(control) = report_err(
        reporter,
        "Failed to get modulation parameters",
        channel.mod_control(),
    ) {
        let code_rate = CodeRate::from_raw(control.par_xtra0).ok_or(Error::InvalidParameter {
            field: "code-rate",
            value: control.par_xtra0,
        });
        if let Some(code_rate) =
            report_err(reporter, "Failed to get modulation parameters", code_rate)
        {
            params.code_rate = code_rate;
        }
        if let Some(dvbt) = report_err(
            reporter,
            "Failed to get modulation parameters",
            DvbtParameters::unpack(control.par_xtra1),
        ) {
            params.dvbt = dvbt;
        }
    }

    trace!(?params, "Resynced parameters from hardware");
}

/// Pushes the full parameter set, in the order the driver expects.
///
/// Every call is attempted; each failure is reported on its own.
pub fn push_all<C: OutputChannel + ?Sized>(
    channel: &C,
    params: &ModulationParameters,
    reporter: &dyn Reporter,
) {
    report_err(
        reporter,
        "Failed to set txmode",
        channel.set_tx_mode(params.tx_mode.raw(), params.stuffing.raw()),
    );
    report_err(
        reporter,
        "Failed to set TS rate",
        channel.set_ts_rate_bps(params.ts_rate_bps),
    );
    report_err(
        reporter,
        "Failed to set RF mode",
        channel.set_rf_mode(params.rf_mode()),
    );
    report_err(
        reporter,
        "Failed to set RF control",
        channel.set_rf_control(params.frequency_hz),
    );
    report_err(
        reporter,
        "Failed to set output level",
        channel.set_output_level(params.output_level),
    );
    report_err(
        reporter,
        "Failed to set modulation control",
        channel.set_mod_control(params.mod_control()),
    );
}

/// Issues the single hardware call that carries `id`.
pub fn apply<C: OutputChannel + ?Sized>(
    channel: &C,
    params: &ModulationParameters,
    id: PropertyId,
) -> Result<()> {
    match id {
        PropertyId::Bitrate => channel.set_ts_rate_bps(params.ts_rate_bps),
        PropertyId::Frequency => channel.set_rf_control(params.frequency_hz),
        PropertyId::OutputPower => channel.set_output_level(params.output_level),
        PropertyId::CodeRate
        | PropertyId::Bandwidth
        | PropertyId::Modulation
        | PropertyId::Guard
        | PropertyId::Interleaving
        | PropertyId::TransmissionMode => channel.set_mod_control(params.mod_control()),
        PropertyId::Inversion => channel.set_rf_mode(params.rf_mode()),
        PropertyId::TransmitMode | PropertyId::Stuffing => {
            channel.set_tx_mode(params.tx_mode.raw(), params.stuffing.raw())
        }
    }
}
