//! Named worker threads with a bounded join.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::warn;

use crate::error::Result;

#[derive(Debug)]
pub struct Worker {
    name: String,
    handle: JoinHandle<()>,
    // Disconnects when the thread body returns or unwinds.
    done: Receiver<()>,
}

impl Worker {
    pub fn spawn<F>(name: &str, body: F) -> Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let (done_tx, done) = mpsc::channel::<()>();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            let _done = done_tx;
            body();
        })?;
        Ok(Self {
            name: name.to_string(),
            handle,
            done,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Join within `timeout`. On timeout the thread is detached with a
    /// warning and `false` is returned.
    pub fn join_timeout(self, timeout: Duration) -> bool {
        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if self.handle.join().is_err() {
                    warn!(worker = %self.name, "worker panicked");
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    worker = %self.name,
                    timeout_ms = timeout.as_millis() as u64,
                    "worker did not exit in time, detaching"
                );
                false
            }
        }
    }
}
