use super::*;

#[test]
fn device_state_parses_and_displays_round_trip() {
    for s in ["idle", "listening", "speaking", "connecting", "starting", "unknown"] {
        let state: DeviceState = s.parse().unwrap();
        assert_eq!(state.to_string(), s);
    }
    assert_eq!(" Listening ".parse::<DeviceState>(), Ok(DeviceState::Listening));
    assert!("sleeping".parse::<DeviceState>().is_err());
}

#[test]
fn shared_device_state_defaults_to_idle_and_updates() {
    let dev = SharedDeviceState::default();
    assert!(dev.device_state().is_idle());
    dev.set(DeviceState::Speaking);
    assert_eq!(dev.device_state(), DeviceState::Speaking);
    assert!(!dev.device_state().is_idle());
}

#[test]
fn recording_sink_restores_default_rate_on_reset() {
    let sink = testing::RecordingSink::fixed_rate(16_000);
    assert!(!sink.set_output_sample_rate(Some(44_100)));
    assert_eq!(sink.output_sample_rate(), 16_000);
    assert!(sink.set_output_sample_rate(None));
    assert_eq!(sink.rate_requests(), vec![Some(44_100), None]);
}
