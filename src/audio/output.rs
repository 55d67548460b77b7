//! `rodio`-backed [`AudioSink`].
//!
//! The output stream is opened on a dedicated thread and kept alive there;
//! only the `Sink` handle crosses back to the caller.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStreamBuilder, Sink};
use tracing::{debug, warn};

use crate::config::OutputSettings;
use crate::error::{Error, Result};

use super::types::{AudioSink, PcmPacket};

pub struct RodioSink {
    sink: Arc<Sink>,
    enabled: AtomicBool,
    rate: AtomicU32,
    settings: OutputSettings,
    // Dropping this lets the stream thread exit and close the device.
    _keepalive: mpsc::Sender<()>,
}

impl RodioSink {
    pub fn open(settings: OutputSettings) -> Result<Self> {
        let (ready_tx, ready_rx) = mpsc::sync_channel::<std::result::Result<Arc<Sink>, String>>(1);
        let (keep_tx, keep_rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let mut stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(s) => s,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                // rodio logs to stderr when OutputStream is dropped.
                stream.log_on_drop(false);

                let sink = Arc::new(Sink::connect_new(stream.mixer()));
                if ready_tx.send(Ok(sink)).is_err() {
                    return;
                }
                // Blocks until the RodioSink (and its sender) is dropped.
                let _ = keep_rx.recv();
                debug!("audio output closed");
            })?;

        let sink = ready_rx
            .recv()
            .map_err(|_| Error::InvalidState("audio output thread exited".to_string()))?
            .map_err(|e| Error::InvalidState(format!("no audio output device: {e}")))?;

        Ok(Self {
            sink,
            enabled: AtomicBool::new(true),
            rate: AtomicU32::new(settings.sample_rate),
            settings,
            _keepalive: keep_tx,
        })
    }
}

impl AudioSink for RodioSink {
    fn enable_output(&self, enable: bool) -> bool {
        if enable {
            self.sink.play();
        } else {
            self.sink.pause();
        }
        self.enabled.store(enable, Ordering::SeqCst);
        true
    }

    fn output_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn output_data(&self, packet: PcmPacket) {
        if packet.samples.is_empty() || packet.channels == 0 {
            return;
        }
        // Back-pressure: hold the decoder the way a full I2S DMA queue would.
        while self.output_enabled() && self.sink.len() >= self.settings.max_queued_packets {
            thread::sleep(Duration::from_millis(5));
        }
        if !self.output_enabled() {
            warn!("dropping PCM packet while output is disabled");
            return;
        }
        let data: Vec<f32> = packet
            .samples
            .iter()
            .map(|&s| f32::from(s) / 32768.0)
            .collect();
        self.sink
            .append(SamplesBuffer::new(packet.channels, packet.sample_rate, data));
    }

    fn output_sample_rate(&self) -> u32 {
        self.rate.load(Ordering::SeqCst)
    }

    fn set_output_sample_rate(&self, rate: Option<u32>) -> bool {
        // rodio resamples in its mixer, so any rate is accepted.
        let rate = rate.unwrap_or(self.settings.sample_rate);
        if rate == 0 {
            return false;
        }
        self.rate.store(rate, Ordering::SeqCst);
        true
    }
}
