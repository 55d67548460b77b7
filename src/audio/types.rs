//! Collaborator traits and the small value types passed across them.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// One decoded, timestamped block of interleaved 16-bit PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmPacket {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
    /// Position of the first sample within the track.
    pub timestamp_ms: u64,
}

/// The speaker path.
pub trait AudioSink: Send + Sync {
    /// Turn output on or off. Returns `false` if the change could not be made.
    fn enable_output(&self, enable: bool) -> bool;
    fn output_enabled(&self) -> bool;
    /// Queue a packet for playback. May block while the output is full.
    fn output_data(&self, packet: PcmPacket);
    fn output_sample_rate(&self) -> u32;
    /// Switch the output rate; `None` restores the sink's own default.
    /// Returns `false` if the sink cannot run at the requested rate.
    fn set_output_sample_rate(&self, rate: Option<u32>) -> bool;
}

/// Conversation state of the voice assistant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DeviceState {
    #[default]
    Unknown,
    Starting,
    Idle,
    Connecting,
    Listening,
    Speaking,
}

impl DeviceState {
    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Starting,
            2 => Self::Idle,
            3 => Self::Connecting,
            4 => Self::Listening,
            5 => Self::Speaking,
            _ => Self::Unknown,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Starting => 1,
            Self::Idle => 2,
            Self::Connecting => 3,
            Self::Listening => 4,
            Self::Speaking => 5,
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Starting => "starting",
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Listening => "listening",
            Self::Speaking => "speaking",
        };
        f.write_str(s)
    }
}

impl FromStr for DeviceState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknown" => Ok(Self::Unknown),
            "starting" => Ok(Self::Starting),
            "idle" => Ok(Self::Idle),
            "connecting" => Ok(Self::Connecting),
            "listening" => Ok(Self::Listening),
            "speaking" => Ok(Self::Speaking),
            other => Err(format!("unknown device state: {other}")),
        }
    }
}

pub trait DeviceStateSource: Send + Sync {
    fn device_state(&self) -> DeviceState;
}

/// Battery and charger status. Not consulted by playback.
pub trait BatterySource: Send + Sync {
    /// Charge level in percent, if known.
    fn battery_level(&self) -> Option<u8>;
    fn is_charging(&self) -> bool;
}

/// A device state cell that other parts of the firmware (or a test) update.
#[derive(Debug)]
pub struct SharedDeviceState(AtomicU8);

impl SharedDeviceState {
    pub fn new(state: DeviceState) -> Self {
        Self(AtomicU8::new(state.as_u8()))
    }

    pub fn set(&self, state: DeviceState) {
        self.0.store(state.as_u8(), Ordering::SeqCst);
    }
}

impl Default for SharedDeviceState {
    fn default() -> Self {
        Self::new(DeviceState::Idle)
    }
}

impl DeviceStateSource for SharedDeviceState {
    fn device_state(&self) -> DeviceState {
        DeviceState::from_u8(self.0.load(Ordering::SeqCst))
    }
}
