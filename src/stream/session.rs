//! One playback of one file: reader thread, decoder thread, shared buffer.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use tracing::{debug, info};

use crate::audio::{AudioSink, DeviceStateSource};
use crate::config::{PauseSettings, StreamSettings};
use crate::error::Result;

use super::buffer::{PauseReason, SharedBuffer};
use super::decode::{DecodeLoop, Outcome};
use super::decoder::FrameDecoder;
use super::pause::PauseCoordinator;
use super::pool::ChunkPool;
use super::progress::{Progress, ProgressSnapshot, SessionState};
use super::reader::Reader;
use super::worker::Worker;

/// What to play and where to start.
#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    pub path: PathBuf,
    /// Saved byte offset to resume near; 0 starts at the beginning.
    pub start_offset: u64,
    /// Playback time already elapsed at `start_offset`.
    pub start_elapsed_ms: u64,
    /// Replay the file once from the top when it first runs out.
    pub rewind_on_eof: bool,
}

/// Delivered to the finish hook when the decoder thread exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub path: PathBuf,
    /// File offset of the first undecoded byte.
    pub position: u64,
    pub elapsed_ms: u64,
    pub file_size: u64,
    pub frames: u64,
    pub decode_errors: u64,
    /// The stream ran to its end.
    pub completed: bool,
    /// The session was stopped before its end.
    pub stopped: bool,
    /// Track length guessed from the first frame's bitrate.
    pub duration_estimate_ms: Option<u64>,
}

pub type FinishHook = Box<dyn FnOnce(SessionReport) + Send + 'static>;

/// Collaborators a session plays through.
pub struct SessionIo {
    pub sink: Arc<dyn AudioSink>,
    pub device: Arc<dyn DeviceStateSource>,
    pub decoder: Box<dyn FrameDecoder>,
}

pub struct StreamingSession {
    path: PathBuf,
    buffer: Arc<SharedBuffer>,
    progress: Arc<Progress>,
    sink: Arc<dyn AudioSink>,
    reader: Option<Worker>,
    decoder: Option<Worker>,
    finished: mpsc::Receiver<()>,
    join_timeout: Duration,
}

impl StreamingSession {
    /// Open `options.path` and start streaming it. The file is opened before
    /// any thread starts, so a missing file fails here.
    pub fn start(
        options: StreamOptions,
        io: SessionIo,
        stream: &StreamSettings,
        pause: &PauseSettings,
        on_finish: FinishHook,
    ) -> Result<Self> {
        let file = File::open(&options.path)?;
        let file_size = file.metadata()?.len();

        let buffer = Arc::new(SharedBuffer::new(stream.high_water));
        let pool = Arc::new(ChunkPool::new(stream.pool_slots, stream.chunk_size));
        let progress = Arc::new(Progress::default());
        progress.set_position(options.start_offset);
        progress.set_state(SessionState::Starting);

        info!(
            path = %options.path.display(),
            offset = options.start_offset,
            size = file_size,
            "starting stream"
        );

        let reader = Reader {
            file,
            buffer: Arc::clone(&buffer),
            pool: Arc::clone(&pool),
            start_offset: options.start_offset.min(file_size),
            resume_backoff: stream.resume_backoff,
            rewind_on_eof: options.rewind_on_eof,
        };
        let reader = Worker::spawn("media-reader", move || reader.run())?;

        let decode = DecodeLoop {
            buffer: Arc::clone(&buffer),
            pool,
            sink: Arc::clone(&io.sink),
            decoder: io.decoder,
            pause: PauseCoordinator::new(io.device, pause.clone()),
            progress: Arc::clone(&progress),
            settings: stream.clone(),
            resuming: options.start_offset > 0 && options.start_offset < file_size,
            start_elapsed_ms: options.start_elapsed_ms,
        };
        let (finished_tx, finished) = mpsc::channel::<()>();
        let decoder_buffer = Arc::clone(&buffer);
        let decoder_progress = Arc::clone(&progress);
        let path = options.path.clone();
        let spawned = Worker::spawn("media-decoder", move || {
            let _finished = finished_tx;
            let outcome = decode.run();
            // Releases the reader if it is parked at end of file.
            decoder_buffer.stop();
            decoder_progress.set_state(SessionState::Stopped);

            let snap = decoder_progress.snapshot();
            let report = SessionReport {
                path,
                position: snap.position,
                elapsed_ms: snap.elapsed_ms,
                file_size,
                frames: snap.frames,
                decode_errors: snap.decode_errors,
                completed: outcome == Outcome::Completed,
                stopped: outcome == Outcome::Stopped,
                duration_estimate_ms: (snap.bitrate_kbps > 0)
                    .then(|| file_size * 8 / u64::from(snap.bitrate_kbps)),
            };
            info!(
                path = %report.path.display(),
                frames = report.frames,
                elapsed_ms = report.elapsed_ms,
                completed = report.completed,
                "stream finished"
            );
            on_finish(report);
        });
        let decoder = match spawned {
            Ok(w) => w,
            Err(e) => {
                buffer.stop();
                reader.join_timeout(stream.join_timeout());
                return Err(e);
            }
        };

        Ok(Self {
            path: options.path,
            buffer,
            progress,
            sink: io.sink,
            reader: Some(reader),
            decoder: Some(decoder),
            finished,
            join_timeout: stream.join_timeout(),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn state(&self) -> SessionState {
        let state = self.progress.state();
        if state != SessionState::Stopped && self.buffer.paused().is_some() {
            SessionState::Paused
        } else {
            state
        }
    }

    pub fn progress(&self) -> ProgressSnapshot {
        let mut snap = self.progress.snapshot();
        snap.state = self.state();
        snap
    }

    pub fn is_finished(&self) -> bool {
        self.progress.state() == SessionState::Stopped
    }

    /// Pause on behalf of a command. Not undone by the device coordinator.
    pub fn pause(&self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.buffer.pause(PauseReason::Manual);
        true
    }

    /// Resume from any pause. Idempotent; also re-enables the sink.
    pub fn resume(&self) -> bool {
        if self.is_finished() {
            return false;
        }
        if self.buffer.resume().is_some() {
            debug!(path = %self.path.display(), "resumed");
        }
        if !self.sink.output_enabled() {
            self.sink.enable_output(true);
        }
        true
    }

    /// Block until the decoder thread has run the finish hook, up to `timeout`.
    pub fn wait_finished(&self, timeout: Duration) -> bool {
        !matches!(
            self.finished.recv_timeout(timeout),
            Err(mpsc::RecvTimeoutError::Timeout)
        )
    }

    /// Stop both threads and join them within the configured budget.
    /// Returns `false` if a thread had to be detached.
    pub fn stop(&mut self) -> bool {
        self.buffer.stop();
        let mut clean = true;
        if let Some(w) = self.decoder.take() {
            clean &= w.join_timeout(self.join_timeout);
        }
        if let Some(w) = self.reader.take() {
            clean &= w.join_timeout(self.join_timeout);
        }
        clean
    }
}

impl Drop for StreamingSession {
    fn drop(&mut self) {
        if self.reader.is_some() || self.decoder.is_some() {
            self.stop();
        }
    }
}
