//! A small bit-flag event group, the hand-off between the decoder thread,
//! command handlers and the track-advance task.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A track ended on its own; apply the play mode.
pub const EVENT_TRACK_FINISHED: u32 = 1 << 0;
/// A command handler asked to skip to the next track.
pub const EVENT_SKIP: u32 = 1 << 1;
/// The advance task should exit.
pub const EVENT_SHUTDOWN: u32 = 1 << 2;

#[derive(Debug, Default)]
pub struct EventGroup {
    bits: Mutex<u32>,
    cond: Condvar,
}

impl EventGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, bits: u32) {
        let mut cur = self.bits.lock().unwrap_or_else(|e| e.into_inner());
        *cur |= bits;
        self.cond.notify_all();
    }

    pub fn clear(&self, bits: u32) {
        let mut cur = self.bits.lock().unwrap_or_else(|e| e.into_inner());
        *cur &= !bits;
    }

    pub fn get(&self) -> u32 {
        *self.bits.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Block until any bit of `mask` is set, then clear and return the set
    /// bits of `mask`. Returns 0 on timeout.
    pub fn wait_any(&self, mask: u32, timeout: Option<Duration>) -> u32 {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut cur = self.bits.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            let hit = *cur & mask;
            if hit != 0 {
                *cur &= !hit;
                return hit;
            }
            match deadline {
                None => {
                    cur = self.cond.wait(cur).unwrap_or_else(|e| e.into_inner());
                }
                Some(d) => {
                    let now = Instant::now();
                    if now >= d {
                        return 0;
                    }
                    cur = self
                        .cond
                        .wait_timeout(cur, d - now)
                        .unwrap_or_else(|e| e.into_inner())
                        .0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
