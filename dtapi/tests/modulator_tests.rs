// SPDX-FileCopyrightText: 2025 Contributors to the gst-dtapi project.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the modulator controller.
//!
//! All tests run against the recording [`MockHardware`] from `common`, so no
//! DekTec device or shim library is needed.

mod common;

use common::{Call, MockHardware, RecordingReporter, init_logging};
use dtapi::{
    Bandwidth, CodeRate, Constellation, DvbtParameters, Error, GuardInterval, Interleaving,
    Inversion, LinkState, ModulationParameters, Modulator, Property, PropertyId, Status,
    Stuffing, TransmissionMode, TxControl, TxMode,
};
use rstest::rstest;

const DEVICE_TYPE: i32 = 215;
const PORT: i32 = 1;

/// A whole number of 188-byte transport stream packets.
fn ts_buffer(packets: usize) -> Vec<u8> {
    let mut data = vec![0xff; 188 * packets];
    for packet in data.chunks_mut(188) {
        packet[0] = 0x47;
    }
    data
}

fn started() -> (Modulator<MockHardware>, MockHardware) {
    init_logging();
    let hardware = MockHardware::new();
    let mut modulator = Modulator::new();
    let reporter = RecordingReporter::default();
    modulator
        .start(&hardware, DEVICE_TYPE, PORT, &reporter)
        .unwrap();
    assert!(reporter.is_empty(), "{:?}", reporter.messages());
    hardware.clear_calls();
    (modulator, hardware)
}

fn setters(calls: &[Call]) -> Vec<Call> {
    calls.iter().filter(|call| call.is_setter()).cloned().collect()
}

#[test]
fn default_bandwidth_needs_no_hardware() {
    init_logging();
    let hardware = MockHardware::new();
    let mut modulator = Modulator::<MockHardware>::new();
    let reporter = RecordingReporter::default();

    assert_eq!(
        modulator.property(PropertyId::Bandwidth, &reporter),
        Property::Bandwidth(Bandwidth::Mhz8)
    );
    assert!(hardware.calls().is_empty());
    assert!(reporter.is_empty());
    assert_eq!(modulator.state(), LinkState::Uninitialized);
}

#[test]
fn unattached_setters_only_touch_the_store() {
    init_logging();
    let hardware = MockHardware::new();
    let mut modulator = Modulator::<MockHardware>::new();
    let reporter = RecordingReporter::default();

    let values = [
        Property::Bitrate(5_000_000),
        Property::Frequency(618_000_000),
        Property::OutputPower(-10.0),
        Property::CodeRate(CodeRate::Rate3_4),
        Property::Bandwidth(Bandwidth::Mhz7),
        Property::Modulation(Constellation::Qam16),
        Property::Guard(GuardInterval::G1_16),
        Property::Interleaving(Interleaving::InDepth),
        Property::TransmissionMode(TransmissionMode::Mode2K),
        Property::Inversion(Inversion::On),
        Property::TransmitMode(TxMode::Raw),
        Property::Stuffing(Stuffing::None),
    ];
    for value in values {
        modulator.set_property(value, &reporter);
        assert_eq!(modulator.property(value.id(), &reporter), value);
    }

    assert!(hardware.calls().is_empty());
    assert!(reporter.is_empty());
}

#[test]
fn start_pushes_parameters_then_holds_then_resyncs() {
    init_logging();
    let hardware = MockHardware::new();
    let mut modulator = Modulator::new();
    let reporter = RecordingReporter::default();
    let params = ModulationParameters::default();

    modulator
        .start(&hardware, DEVICE_TYPE, PORT, &reporter)
        .unwrap();

    assert_eq!(
        hardware.calls(),
        vec![
            Call::AttachDevice(DEVICE_TYPE),
            Call::AttachChannel(PORT),
            Call::SetTxMode(params.tx_mode.raw(), params.stuffing.raw()),
            Call::SetTsRate(params.ts_rate_bps),
            Call::SetRfMode(params.rf_mode()),
            Call::SetRfControl(params.frequency_hz),
            Call::SetOutputLevel(-495),
            Call::SetModControl(params.mod_control()),
            Call::SetTxControl(TxControl::Hold),
            Call::GetTsRate,
            Call::GetTxMode,
            Call::GetRfControl,
            Call::GetOutputLevel,
            Call::GetModControl,
        ]
    );
    assert!(reporter.is_empty());
    assert_eq!(modulator.state(), LinkState::Attached(TxControl::Hold));
    assert_eq!(modulator.diagnostics().lock_status, 1);
    assert_eq!(hardware.alive(), (1, 1));
}

#[test]
fn start_uses_configured_device_and_port() {
    init_logging();
    let hardware = MockHardware::new();
    let mut modulator = Modulator::new();
    let reporter = RecordingReporter::default();

    modulator.start(&hardware, 2111, 3, &reporter).unwrap();

    let calls = hardware.calls();
    assert_eq!(calls[0], Call::AttachDevice(2111));
    assert_eq!(calls[1], Call::AttachChannel(3));
}

#[test]
fn start_without_device_fails_and_stop_stays_safe() {
    init_logging();
    let hardware = MockHardware::new();
    hardware.state().device_present = false;
    let mut modulator = Modulator::new();
    let reporter = RecordingReporter::default();

    let err = modulator
        .start(&hardware, DEVICE_TYPE, PORT, &reporter)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::DeviceNotFound {
            type_number: DEVICE_TYPE,
            ..
        }
    ));
    assert_eq!(
        err.to_string(),
        "No DTU-215 in system: No device of the requested type is present"
    );
    assert_eq!(modulator.state(), LinkState::Uninitialized);

    modulator.stop();
    modulator.stop();
    assert_eq!(modulator.state(), LinkState::Uninitialized);
    assert_eq!(hardware.alive(), (0, 0));
    assert_eq!(hardware.calls(), vec![Call::AttachDevice(DEVICE_TYPE)]);
}

#[test]
fn start_with_busy_port_releases_the_device() {
    init_logging();
    let hardware = MockHardware::new();
    hardware.state().port_available = false;
    let mut modulator = Modulator::new();
    let reporter = RecordingReporter::default();

    let err = modulator
        .start(&hardware, DEVICE_TYPE, PORT, &reporter)
        .unwrap_err();
    assert_eq!(err.status(), Some(Status::InUse));
    assert_eq!(
        hardware.calls(),
        vec![
            Call::AttachDevice(DEVICE_TYPE),
            Call::AttachChannel(PORT),
            Call::DetachDevice
        ]
    );
    assert_eq!(hardware.alive(), (0, 0));
    assert!(!modulator.is_attached());
}

#[test]
fn start_attempts_every_call_despite_configuration_failures() {
    init_logging();
    let hardware = MockHardware::new();
    hardware.fail("set_ts_rate_bps", Status::InvalidRate);
    hardware.fail("set_output_level", Status::InvalidLevel);
    hardware.fail("set_tx_control:Hold", Status::InvalidMode);
    let mut modulator = Modulator::new();
    let reporter = RecordingReporter::default();

    modulator
        .start(&hardware, DEVICE_TYPE, PORT, &reporter)
        .unwrap();

    assert_eq!(setters(&hardware.calls()).len(), 7);
    assert_eq!(
        reporter.statuses(),
        vec![
            Some(Status::InvalidRate),
            Some(Status::InvalidLevel),
            Some(Status::InvalidMode)
        ]
    );
    assert!(reporter.messages()[0].starts_with("Failed to set TS rate: "));
    assert!(modulator.is_attached());
}

#[test]
fn render_after_frequency_change_writes_and_requests_send() {
    let (mut modulator, hardware) = started();
    let reporter = RecordingReporter::default();

    modulator.set_property(Property::Frequency(618_000_000), &reporter);
    assert_eq!(
        setters(&hardware.calls()),
        vec![Call::SetRfControl(618_000_000)]
    );
    hardware.clear_calls();

    let buffer = ts_buffer(7);
    modulator.render(&buffer, &reporter).unwrap();

    assert_eq!(
        hardware.calls(),
        vec![
            Call::Write(188 * 7),
            Call::SetTxControl(TxControl::Send),
            Call::GetFlags,
            Call::GetFifoLoad,
            Call::GetFifoSize,
        ]
    );
    assert!(reporter.is_empty());
    assert_eq!(modulator.state(), LinkState::Attached(TxControl::Send));

    let diagnostics = modulator.diagnostics();
    assert_eq!(diagnostics.bytes_written, 188 * 7);
    assert_eq!(diagnostics.buffers_written, 1);
    assert_eq!(diagnostics.fifo_load, 188 * 7);
    assert_eq!(diagnostics.fifo_size, hardware.registers().fifo_size);
}

#[test]
fn insufficient_load_on_send_is_expected() {
    let (mut modulator, hardware) = started();
    hardware.fail("set_tx_control:Send", Status::InsufficientLoad);
    let reporter = RecordingReporter::default();

    modulator.render(&ts_buffer(1), &reporter).unwrap();

    assert!(reporter.is_empty(), "{:?}", reporter.messages());
    assert_eq!(modulator.state(), LinkState::Attached(TxControl::Hold));
    assert!(hardware.calls().contains(&Call::GetFifoSize));
}

#[test]
fn other_send_failures_are_reported_but_the_buffer_is_accepted() {
    let (mut modulator, hardware) = started();
    hardware.fail("set_tx_control:Send", Status::NoTsRate);
    let reporter = RecordingReporter::default();

    modulator.render(&ts_buffer(2), &reporter).unwrap();

    assert_eq!(reporter.statuses(), vec![Some(Status::NoTsRate)]);
    assert!(reporter.messages()[0].starts_with("Failed to set TX control to send: "));
    assert_eq!(modulator.diagnostics().bytes_written, 188 * 2);
}

#[test]
fn write_failure_stops_the_buffer() {
    let (mut modulator, hardware) = started();
    hardware.fail("write", Status::DevDriver);
    let reporter = RecordingReporter::default();

    let err = modulator.render(&ts_buffer(3), &reporter).unwrap_err();

    assert_eq!(err.status(), Some(Status::DevDriver));
    assert_eq!(hardware.calls(), vec![Call::Write(188 * 3)]);
    assert_eq!(
        reporter.messages(),
        vec!["Failed to write data: Unclassified failure in device driver".to_string()]
    );
    assert_eq!(modulator.diagnostics().bytes_written, 0);
}

#[test]
fn diagnostic_read_failures_are_reported() {
    let (mut modulator, hardware) = started();
    hardware.fail("flags", Status::DevDriver);
    hardware.fail("fifo_load", Status::DevDriver);
    let reporter = RecordingReporter::default();

    modulator.render(&ts_buffer(1), &reporter).unwrap();

    assert_eq!(reporter.messages().len(), 2);
    assert!(hardware.calls().contains(&Call::GetFifoSize));
}

#[test]
fn render_while_unattached_is_an_error() {
    init_logging();
    let hardware = MockHardware::new();
    let mut modulator = Modulator::<MockHardware>::new();
    let reporter = RecordingReporter::default();

    assert!(matches!(
        modulator.render(&ts_buffer(1), &reporter),
        Err(Error::NotAttached)
    ));
    assert!(hardware.calls().is_empty());
}

#[test]
fn bytes_written_accumulates_and_restarts_at_zero() {
    let (mut modulator, hardware) = started();
    let reporter = RecordingReporter::default();

    for packets in [1, 2, 4] {
        modulator.render(&ts_buffer(packets), &reporter).unwrap();
    }
    assert_eq!(modulator.diagnostics().bytes_written, 188 * 7);
    assert_eq!(modulator.diagnostics().buffers_written, 3);

    modulator.stop();
    assert_eq!(modulator.diagnostics().bytes_written, 188 * 7);
    modulator
        .start(&hardware, DEVICE_TYPE, PORT, &reporter)
        .unwrap();
    assert_eq!(modulator.diagnostics().bytes_written, 0);
}

#[test]
fn unlock_then_unlock_stop_returns_to_hold() {
    let (mut modulator, hardware) = started();
    let reporter = RecordingReporter::default();
    modulator.render(&ts_buffer(1), &reporter).unwrap();
    hardware.clear_calls();

    modulator.unlock().unwrap();
    modulator.unlock_stop().unwrap();

    assert_eq!(
        hardware.calls(),
        vec![Call::ResetFifo, Call::SetTxControl(TxControl::Hold)]
    );
    assert_eq!(modulator.state(), LinkState::Attached(TxControl::Hold));
    assert_eq!(hardware.registers().tx_control, TxControl::Hold);
}

#[test]
fn unlock_failure_is_returned() {
    let (modulator, hardware) = started();
    hardware.fail("reset_fifo", Status::DevDriver);

    assert_eq!(
        modulator.unlock().unwrap_err().status(),
        Some(Status::DevDriver)
    );
    assert!(modulator.unlock_stop().is_ok());
}

#[test]
fn unlock_while_unattached_is_an_error() {
    let modulator = Modulator::<MockHardware>::new();
    assert!(matches!(modulator.unlock(), Err(Error::NotAttached)));
    assert!(matches!(modulator.unlock_stop(), Err(Error::NotAttached)));
    assert!(modulator.canceller().is_none());
}

#[test]
fn canceller_releases_a_blocked_render() {
    let (mut modulator, hardware) = started();
    let canceller = modulator.canceller().unwrap();
    hardware.block_writes();

    let streaming = std::thread::spawn(move || {
        let reporter = RecordingReporter::default();
        let result = modulator.render(&ts_buffer(10), &reporter);
        (modulator, result, reporter.is_empty())
    });

    hardware.wait_for_blocked_write();
    canceller.unlock().unwrap();
    canceller.unlock_stop().unwrap();

    let (modulator, result, no_reports) = streaming.join().unwrap();
    assert!(result.is_ok());
    assert!(no_reports);
    assert!(hardware.calls().contains(&Call::ResetFifo));

    modulator.unlock_stop().unwrap();
    assert_eq!(modulator.state(), LinkState::Attached(TxControl::Hold));
}

#[test]
fn stop_detaches_channel_instantly_then_device() {
    let (mut modulator, hardware) = started();

    modulator.stop();

    assert_eq!(
        hardware.calls(),
        vec![Call::DetachChannel, Call::DetachDevice]
    );
    assert_eq!(hardware.alive(), (0, 0));
    assert_eq!(modulator.state(), LinkState::Detached);

    hardware.clear_calls();
    modulator.stop();
    assert!(hardware.calls().is_empty());
    assert_eq!(modulator.state(), LinkState::Detached);
}

#[test]
fn modulator_can_be_restarted_after_stop() {
    let (mut modulator, hardware) = started();
    let reporter = RecordingReporter::default();
    modulator.stop();

    modulator
        .start(&hardware, DEVICE_TYPE, PORT, &reporter)
        .unwrap();
    assert_eq!(modulator.state(), LinkState::Attached(TxControl::Hold));
    assert_eq!(hardware.alive(), (1, 1));
}

#[test]
fn dropping_an_attached_modulator_releases_hardware() {
    let (modulator, hardware) = started();
    drop(modulator);
    assert_eq!(hardware.alive(), (0, 0));
    assert!(hardware.calls().contains(&Call::DetachDevice));
}

#[rstest]
#[case(Property::Bitrate(10_000_000), Call::SetTsRate(10_000_000))]
#[case(Property::Frequency(650_000_000), Call::SetRfControl(650_000_000))]
#[case(Property::OutputPower(-20.0), Call::SetOutputLevel(-200))]
#[case(Property::OutputPower(-27.3), Call::SetOutputLevel(-273))]
#[case(Property::Inversion(Inversion::On), Call::SetRfMode(Inversion::On.raw()))]
#[case(
    Property::TransmitMode(TxMode::Tx204),
    Call::SetTxMode(TxMode::Tx204.raw(), Stuffing::Nulls.raw())
)]
#[case(
    Property::Stuffing(Stuffing::None),
    Call::SetTxMode(TxMode::Tx188.raw(), Stuffing::None.raw())
)]
fn attached_setter_issues_one_hardware_call(#[case] value: Property, #[case] expected: Call) {
    let (mut modulator, hardware) = started();
    let reporter = RecordingReporter::default();

    modulator.set_property(value, &reporter);

    assert_eq!(setters(&hardware.calls()), vec![expected]);
    assert!(reporter.is_empty());
    assert_eq!(modulator.property(value.id(), &reporter), value);
}

#[rstest]
#[case(Property::CodeRate(CodeRate::Rate5_6))]
#[case(Property::Bandwidth(Bandwidth::Mhz6))]
#[case(Property::Modulation(Constellation::Qpsk))]
#[case(Property::Guard(GuardInterval::G1_4))]
#[case(Property::Interleaving(Interleaving::InDepth))]
#[case(Property::TransmissionMode(TransmissionMode::Mode2K))]
fn modulation_setters_send_the_whole_word(#[case] value: Property) {
    let (mut modulator, hardware) = started();
    let reporter = RecordingReporter::default();
    let mut expected = ModulationParameters::default();
    expected.set(value).unwrap();

    modulator.set_property(value, &reporter);

    let calls = setters(&hardware.calls());
    assert_eq!(calls, vec![Call::SetModControl(expected.mod_control())]);
    let Call::SetModControl(control) = &calls[0] else {
        unreachable!()
    };
    assert_eq!(control.mod_type, dtapi_sys::DTAPI_MOD_DVBT);
    assert_eq!(control.par_xtra2, -1);
    assert_eq!(DvbtParameters::unpack(control.par_xtra1).unwrap(), expected.dvbt);
}

#[test]
fn failed_apply_is_reported_and_keeps_the_value() {
    let (mut modulator, hardware) = started();
    hardware.fail("set_rf_control", Status::DevDriver);
    let reporter = RecordingReporter::default();

    modulator.set_property(Property::Frequency(700_000_000), &reporter);

    assert_eq!(
        reporter.messages(),
        vec!["Failed to set frequency: Unclassified failure in device driver".to_string()]
    );
    assert_eq!(modulator.parameters().frequency_hz, 700_000_000);
}

#[rstest]
#[case(Property::OutputPower(f64::NAN))]
#[case(Property::OutputPower(30.0))]
#[case(Property::OutputPower(-40.0))]
#[case(Property::Bitrate(-5))]
#[case(Property::Frequency(-474_000_000))]
fn out_of_range_value_is_reported_and_never_applied(#[case] value: Property) {
    let (mut modulator, hardware) = started();
    let reporter = RecordingReporter::default();
    let before = *modulator.parameters();

    modulator.set_property(value, &reporter);

    assert!(setters(&hardware.calls()).is_empty());
    assert_eq!(*modulator.parameters(), before);
    let messages = reporter.messages();
    assert_eq!(messages.len(), 1, "{messages:?}");
    assert!(
        messages[0].starts_with(value.id().failure_context()),
        "{messages:?}"
    );
    assert!(messages[0].contains("outside the valid range"), "{messages:?}");
    assert_eq!(reporter.statuses(), vec![None]);
}

#[test]
fn out_of_range_value_is_rejected_while_unattached() {
    init_logging();
    let mut modulator = Modulator::<MockHardware>::new();
    let reporter = RecordingReporter::default();

    modulator.set_property(Property::OutputPower(f64::NAN), &reporter);

    assert_eq!(
        modulator.property(PropertyId::OutputPower, &reporter),
        Property::OutputPower(-49.5)
    );
    assert_eq!(
        reporter.messages(),
        vec!["Failed to set output power: NaN is outside the valid range of output-power".to_string()]
    );
}

#[test]
fn get_refreshes_from_hardware() {
    let (mut modulator, hardware) = started();
    let reporter = RecordingReporter::default();
    {
        let mut state = hardware.state();
        state.registers.frequency = 500_000_000;
        state.registers.lock_status = 0;
        state.registers.output_level = -123;
    }

    assert_eq!(
        modulator.property(PropertyId::Frequency, &reporter),
        Property::Frequency(500_000_000)
    );
    assert_eq!(
        modulator.property(PropertyId::OutputPower, &reporter),
        Property::OutputPower(-12.3)
    );
    assert_eq!(modulator.diagnostics().lock_status, 0);
    assert!(hardware.calls().contains(&Call::GetRfControl));
}

#[test]
fn failed_read_back_keeps_the_cached_value() {
    let (mut modulator, hardware) = started();
    hardware.fail("rf_control", Status::DevDriver);
    hardware.state().registers.ts_rate = 1_000_000;
    let reporter = RecordingReporter::default();

    assert_eq!(
        modulator.property(PropertyId::Frequency, &reporter),
        Property::Frequency(dtapi::DEFAULT_FREQUENCY)
    );
    assert_eq!(modulator.parameters().ts_rate_bps, 1_000_000);
    assert_eq!(
        reporter.messages(),
        vec!["Failed to get frequency: Unclassified failure in device driver".to_string()]
    );
}

#[test]
fn invalid_modulation_word_is_reported() {
    let (mut modulator, hardware) = started();
    let reporter = RecordingReporter::default();
    hardware.state().registers.mod_control.par_xtra1 = 0;
    hardware.state().registers.mod_control.par_xtra0 = dtapi_sys::DTAPI_MOD_7_8;

    assert_eq!(
        modulator.property(PropertyId::Bandwidth, &reporter),
        Property::Bandwidth(Bandwidth::Mhz8)
    );
    assert_eq!(modulator.parameters().code_rate, CodeRate::Rate7_8);
    assert_eq!(reporter.messages().len(), 1);
    assert!(reporter.messages()[0].contains("Invalid bandwidth value"));
}
