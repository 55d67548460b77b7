//! Pause/resume driven by the assistant's conversation state.
//!
//! The decoder thread calls [`PauseCoordinator::tick`] once per iteration.
//! A busy assistant pauses playback; the paused thread then re-checks the
//! device in short slices and resumes when it goes idle, or after a long
//! enough stretch of listening with nothing said.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::audio::{AudioSink, DeviceState, DeviceStateSource};
use crate::config::PauseSettings;

use super::buffer::{PauseReason, SharedBuffer};

pub struct PauseCoordinator {
    device: Arc<dyn DeviceStateSource>,
    settings: PauseSettings,
    listening_since: Option<Instant>,
    /// Set after a listening auto-resume until the device leaves `Listening`.
    suppress_listening: bool,
}

impl PauseCoordinator {
    pub fn new(device: Arc<dyn DeviceStateSource>, settings: PauseSettings) -> Self {
        Self {
            device,
            settings,
            listening_since: None,
            suppress_listening: false,
        }
    }

    /// Pause if the device is busy, and wait out any pause. Returns `false`
    /// once the session has been stopped.
    pub fn tick(&mut self, buffer: &SharedBuffer, sink: &dyn AudioSink) -> bool {
        if buffer.paused().is_none() {
            let state = self.device.device_state();
            if state != DeviceState::Listening {
                self.suppress_listening = false;
            }
            let busy = !state.is_idle() && !(state == DeviceState::Listening && self.suppress_listening);
            if !busy {
                return buffer.is_running();
            }
            if buffer.pause(PauseReason::Device) {
                info!(%state, "device busy, pausing playback");
                self.listening_since = (state == DeviceState::Listening).then(Instant::now);
            }
        }

        if buffer.paused().is_some() {
            // Hand the speaker path back at its default rate while paused.
            sink.set_output_sample_rate(None);
            if !self.wait_paused(buffer) {
                return false;
            }
            if !sink.output_enabled() {
                sink.enable_output(true);
            }
        }
        buffer.is_running()
    }

    fn wait_paused(&mut self, buffer: &SharedBuffer) -> bool {
        loop {
            let Some(reason) = buffer.wait_paused(self.settings.recheck()) else {
                return buffer.is_running();
            };
            if reason == PauseReason::Manual {
                continue;
            }

            match self.device.device_state() {
                DeviceState::Idle => {
                    info!("device idle, resuming playback");
                    self.listening_since = None;
                    buffer.resume();
                }
                DeviceState::Listening => {
                    let since = *self.listening_since.get_or_insert_with(Instant::now);
                    if since.elapsed() >= self.settings.auto_resume() {
                        info!(
                            listened_ms = since.elapsed().as_millis() as u64,
                            "no speech while listening, resuming playback"
                        );
                        self.listening_since = None;
                        self.suppress_listening = true;
                        buffer.resume();
                    }
                }
                DeviceState::Speaking => {
                    self.listening_since = None;
                }
                other => {
                    debug!(state = %other, "still paused");
                }
            }
        }
    }
}
