//! In-memory collaborators for pipeline and player tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use super::types::{AudioSink, PcmPacket};

/// Records every packet; optionally refuses sample-rate changes.
#[derive(Debug)]
pub(crate) struct RecordingSink {
    enabled: AtomicBool,
    rate: AtomicU32,
    default_rate: u32,
    accept_rate_changes: bool,
    packets: Mutex<Vec<PcmPacket>>,
    rate_requests: Mutex<Vec<Option<u32>>>,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self::with_rate_policy(24_000, true)
    }

    pub(crate) fn fixed_rate(rate: u32) -> Self {
        Self::with_rate_policy(rate, false)
    }

    fn with_rate_policy(default_rate: u32, accept_rate_changes: bool) -> Self {
        Self {
            enabled: AtomicBool::new(false),
            rate: AtomicU32::new(default_rate),
            default_rate,
            accept_rate_changes,
            packets: Mutex::new(Vec::new()),
            rate_requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn packets(&self) -> Vec<PcmPacket> {
        self.packets.lock().unwrap().clone()
    }

    pub(crate) fn packet_count(&self) -> usize {
        self.packets.lock().unwrap().len()
    }

    pub(crate) fn rate_requests(&self) -> Vec<Option<u32>> {
        self.rate_requests.lock().unwrap().clone()
    }
}

impl AudioSink for RecordingSink {
    fn enable_output(&self, enable: bool) -> bool {
        self.enabled.store(enable, Ordering::SeqCst);
        true
    }

    fn output_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn output_data(&self, packet: PcmPacket) {
        self.packets.lock().unwrap().push(packet);
    }

    fn output_sample_rate(&self) -> u32 {
        self.rate.load(Ordering::SeqCst)
    }

    fn set_output_sample_rate(&self, rate: Option<u32>) -> bool {
        self.rate_requests.lock().unwrap().push(rate);
        match rate {
            None => {
                self.rate.store(self.default_rate, Ordering::SeqCst);
                true
            }
            Some(r) if self.accept_rate_changes => {
                self.rate.store(r, Ordering::SeqCst);
                true
            }
            Some(_) => false,
        }
    }
}
