//! Session progress shared between the decoder thread and observers.

use std::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Streaming,
    Paused,
    /// The reader hit end of file; the decoder is emptying the buffer.
    Draining,
    Stopped,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Starting,
            2 => Self::Streaming,
            3 => Self::Paused,
            4 => Self::Draining,
            5 => Self::Stopped,
            _ => Self::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Starting => 1,
            Self::Streaming => 2,
            Self::Paused => 3,
            Self::Draining => 4,
            Self::Stopped => 5,
        }
    }
}

#[derive(Debug, Default)]
pub struct Progress {
    state: AtomicU8,
    position: AtomicU64,
    elapsed_ms: AtomicU64,
    frames: AtomicU64,
    decode_errors: AtomicU64,
    bitrate_kbps: AtomicU32,
}

/// A point-in-time copy of [`Progress`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub state: SessionState,
    /// File offset of the next undecoded byte.
    pub position: u64,
    pub elapsed_ms: u64,
    pub frames: u64,
    pub decode_errors: u64,
    /// Bitrate of the first decoded frame, 0 until known.
    pub bitrate_kbps: u32,
}

impl Progress {
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn set_state(&self, state: SessionState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }

    pub fn record_frame(&self, position: u64, elapsed_ms: u64) {
        self.position.store(position, Ordering::Relaxed);
        self.elapsed_ms.store(elapsed_ms, Ordering::Relaxed);
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_position(&self, position: u64) {
        self.position.store(position, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_bitrate(&self, kbps: u32) {
        // First frame wins.
        let _ = self
            .bitrate_kbps
            .compare_exchange(0, kbps, Ordering::Relaxed, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            state: self.state(),
            position: self.position.load(Ordering::Relaxed),
            elapsed_ms: self.elapsed_ms.load(Ordering::Relaxed),
            frames: self.frames.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            bitrate_kbps: self.bitrate_kbps.load(Ordering::Relaxed),
        }
    }
}
