//! The reader→decoder FIFO and the session's shared run/pause flags.
//!
//! Everything lives under one mutex with one condvar. The byte counter always
//! equals the sum of queued chunk lengths.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use super::pool::AudioChunk;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PauseReason {
    /// Requested by a command handler; only a command resumes it.
    Manual,
    /// The assistant is busy; the coordinator resumes it.
    Device,
}

/// Result of offering a chunk to the buffer.
#[derive(Debug)]
pub enum Push {
    Queued,
    /// The session stopped or a reposition is pending; the chunk comes back.
    Rejected(AudioChunk),
}

#[derive(Debug)]
struct Inner {
    queue: VecDeque<AudioChunk>,
    size: usize,
    reader_active: bool,
    reader_exited: bool,
    running: bool,
    paused: Option<PauseReason>,
    seek: Option<u64>,
}

#[derive(Debug)]
pub struct SharedBuffer {
    inner: Mutex<Inner>,
    cond: Condvar,
    high_water: usize,
}

impl SharedBuffer {
    pub fn new(high_water: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                size: 0,
                reader_active: true,
                reader_exited: false,
                running: true,
                paused: None,
                seek: None,
            }),
            cond: Condvar::new(),
            high_water,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a chunk, blocking while the buffer is at the high-water mark.
    pub fn push(&self, chunk: AudioChunk) -> Push {
        let mut g = self.lock();
        while g.running && g.seek.is_none() && g.size >= self.high_water {
            g = self.cond.wait(g).unwrap_or_else(|e| e.into_inner());
        }
        if !g.running || g.seek.is_some() {
            return Push::Rejected(chunk);
        }
        g.size += chunk.len();
        g.queue.push_back(chunk);
        self.cond.notify_all();
        Push::Queued
    }

    /// Take the oldest chunk, blocking while the buffer is empty and the
    /// reader may still produce. `None` means stopped or end of file.
    pub fn pop(&self) -> Option<AudioChunk> {
        let mut g = self.lock();
        while g.running && g.queue.is_empty() && g.reader_active {
            g = self.cond.wait(g).unwrap_or_else(|e| e.into_inner());
        }
        if !g.running {
            return None;
        }
        let chunk = g.queue.pop_front()?;
        g.size -= chunk.len();
        self.cond.notify_all();
        Some(chunk)
    }

    /// Wait until `low_water` bytes are queued, the reader is done, or the
    /// session stops. Returns whether the session is still running.
    pub fn wait_for_fill(&self, low_water: usize) -> bool {
        let mut g = self.lock();
        while g.running && g.reader_active && g.size < low_water {
            g = self.cond.wait(g).unwrap_or_else(|e| e.into_inner());
        }
        g.running
    }

    /// Drop everything queued and ask the reader to continue from `pos`.
    /// The drained chunks are returned so they can go back to the pool.
    /// If the reader has already exited nothing more will arrive.
    pub fn request_seek(&self, pos: u64) -> Vec<AudioChunk> {
        let mut g = self.lock();
        let drained: Vec<AudioChunk> = g.queue.drain(..).collect();
        g.size = 0;
        g.seek = Some(pos);
        g.reader_active = !g.reader_exited;
        self.cond.notify_all();
        drained
    }

    /// Reader side: claim a pending reposition.
    pub fn take_seek(&self) -> Option<u64> {
        self.lock().seek.take()
    }

    /// Reader side: end of file reached. Blocks until a reposition is
    /// requested (returned) or the session stops (`None`).
    pub fn reader_idle(&self) -> Option<u64> {
        let mut g = self.lock();
        g.reader_active = false;
        self.cond.notify_all();
        while g.running && g.seek.is_none() {
            g = self.cond.wait(g).unwrap_or_else(|e| e.into_inner());
        }
        if !g.running {
            return None;
        }
        g.reader_active = true;
        g.seek.take()
    }

    /// Reader side: the reader is gone for good.
    pub fn reader_done(&self) {
        let mut g = self.lock();
        g.reader_active = false;
        g.reader_exited = true;
        self.cond.notify_all();
    }

    pub fn reader_active(&self) -> bool {
        self.lock().reader_active
    }

    /// Reader side: block before a read while the session is paused.
    /// Returns whether the session is still running.
    pub fn wait_while_paused(&self) -> bool {
        let mut g = self.lock();
        while g.running && g.paused.is_some() && g.seek.is_none() {
            g = self.cond.wait(g).unwrap_or_else(|e| e.into_inner());
        }
        g.running
    }

    /// Clear the running flag and wake every waiter.
    pub fn stop(&self) {
        let mut g = self.lock();
        g.running = false;
        self.cond.notify_all();
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Mark the session paused. A manual pause overrides a device pause.
    /// Returns `true` if the pause state changed.
    pub fn pause(&self, reason: PauseReason) -> bool {
        let mut g = self.lock();
        if !g.running || g.paused == Some(reason) || g.paused == Some(PauseReason::Manual) {
            return false;
        }
        g.paused = Some(reason);
        self.cond.notify_all();
        true
    }

    /// Clear any pause. Returns the reason that was cleared.
    pub fn resume(&self) -> Option<PauseReason> {
        let mut g = self.lock();
        let was = g.paused.take();
        self.cond.notify_all();
        was
    }

    pub fn paused(&self) -> Option<PauseReason> {
        self.lock().paused
    }

    /// Sleep while paused, for at most `timeout`. Returns the pause state
    /// afterwards, or `None` once stopped or resumed.
    pub fn wait_paused(&self, timeout: Duration) -> Option<PauseReason> {
        let g = self.lock();
        let (g, _) = self
            .cond
            .wait_timeout_while(g, timeout, |i| i.running && i.paused.is_some())
            .unwrap_or_else(|e| e.into_inner());
        if g.running { g.paused } else { None }
    }

    /// Bytes currently queued.
    pub fn queued_bytes(&self) -> usize {
        self.lock().size
    }

    pub fn queued_chunks(&self) -> usize {
        self.lock().queue.len()
    }

    #[cfg(test)]
    pub(super) fn counter_matches_queue(&self) -> bool {
        let g = self.lock();
        g.size == g.queue.iter().map(AudioChunk::len).sum::<usize>()
    }
}
