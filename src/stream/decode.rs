//! Decoder thread: shared buffer → frame window → PCM packets.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::audio::{AudioSink, PcmPacket};
use crate::config::StreamSettings;

use super::buffer::SharedBuffer;
use super::decoder::{DecodedFrame, FrameDecoder};
use super::mpeg::{FrameHeader, HEADER_LEN, find_sync, id3v2_tag_len};
use super::pause::PauseCoordinator;
use super::pcm::{downmix_to_mono, resample};
use super::pool::{AudioChunk, ChunkPool};
use super::progress::{Progress, SessionState};
use super::window::FrameWindow;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum Outcome {
    /// The stream ran out of data.
    Completed,
    /// The session was stopped.
    Stopped,
}

enum Step {
    Decoded,
    Skipped,
    NeedData,
    Restart,
}

pub(super) struct DecodeLoop {
    pub buffer: Arc<SharedBuffer>,
    pub pool: Arc<ChunkPool>,
    pub sink: Arc<dyn AudioSink>,
    pub decoder: Box<dyn FrameDecoder>,
    pub pause: PauseCoordinator,
    pub progress: Arc<Progress>,
    pub settings: StreamSettings,
    /// Started from a saved offset that may not sit on a frame boundary.
    pub resuming: bool,
    pub start_elapsed_ms: u64,
}

struct Cursor {
    window: FrameWindow,
    eof: bool,
    want_more: bool,
    check_id3: bool,
    /// The previous frame decoded and ended exactly at the window front.
    locked: bool,
    skip_pending: usize,
    resync_failures: u32,
    elapsed_us: u64,
    frames: u64,
    refused_rate: Option<u32>,
}

impl DecodeLoop {
    pub fn run(mut self) -> Outcome {
        let mut cur = Cursor {
            window: FrameWindow::with_capacity(2 * self.settings.chunk_size),
            eof: false,
            want_more: false,
            check_id3: false,
            locked: false,
            skip_pending: 0,
            resync_failures: 0,
            elapsed_us: 0,
            frames: 0,
            refused_rate: None,
        };

        self.progress.set_state(SessionState::Starting);
        if !self.buffer.wait_for_fill(self.settings.low_water) {
            return Outcome::Stopped;
        }
        self.progress.set_state(SessionState::Streaming);

        loop {
            if !self.pause.tick(&self.buffer, self.sink.as_ref()) {
                return Outcome::Stopped;
            }

            if !cur.eof && (cur.want_more || cur.window.len() < self.settings.chunk_size) {
                cur.want_more = false;
                match self.buffer.pop() {
                    Some(chunk) => self.take_chunk(&mut cur, chunk),
                    None if !self.buffer.is_running() => return Outcome::Stopped,
                    None => {
                        cur.eof = true;
                        self.progress.set_state(SessionState::Draining);
                    }
                }
            }

            match self.step(&mut cur) {
                Step::Decoded | Step::Skipped => {}
                Step::NeedData if cur.eof => return Outcome::Completed,
                Step::NeedData => cur.want_more = true,
                Step::Restart => {
                    if !self.restart(&mut cur) {
                        return Outcome::Stopped;
                    }
                }
            }
        }
    }

    fn take_chunk(&self, cur: &mut Cursor, chunk: AudioChunk) {
        if chunk.offset() == 0 && cur.window.is_empty() {
            cur.check_id3 = true;
        }
        cur.window.append(chunk.bytes(), chunk.offset());
        self.pool.give_back(chunk);
    }

    fn step(&mut self, cur: &mut Cursor) -> Step {
        if cur.skip_pending > 0 {
            let n = cur.skip_pending.min(cur.window.len());
            cur.window.consume(n);
            cur.skip_pending -= n;
            return if cur.skip_pending > 0 { Step::NeedData } else { Step::Skipped };
        }

        if cur.check_id3 {
            if cur.window.len() < 10 && !cur.eof {
                return Step::NeedData;
            }
            cur.check_id3 = false;
            if let Some(len) = id3v2_tag_len(cur.window.as_slice()) {
                debug!(bytes = len, "skipping ID3v2 tag");
                cur.skip_pending = len;
                return Step::Skipped;
            }
        }

        if cur.window.len() < HEADER_LEN {
            return Step::NeedData;
        }
        // In sync, the next header is trusted without a lookahead check.
        if cur.locked && FrameHeader::parse(cur.window.as_slice()).is_some() {
            return self.decode_front(cur);
        }
        cur.locked = false;
        match find_sync(cur.window.as_slice()) {
            Some(0) => self.decode_front(cur),
            Some(k) => {
                debug!(bytes = k, "skipping to frame sync");
                cur.window.consume(k);
                Step::Skipped
            }
            None => self.lost_sync(cur),
        }
    }

    fn decode_front(&mut self, cur: &mut Cursor) -> Step {
        let Some(header) = FrameHeader::parse(cur.window.as_slice()) else {
            cur.window.consume(1);
            return Step::Skipped;
        };
        let len = header.frame_len();
        if cur.window.len() < len {
            return Step::NeedData;
        }
        match self.decoder.decode(&cur.window.as_slice()[..len], &header) {
            Ok(frame) => {
                cur.window.consume(len);
                cur.locked = true;
                self.resuming = false;
                cur.resync_failures = 0;
                self.emit(cur, &header, frame);
                Step::Decoded
            }
            Err(e) => {
                debug!(position = cur.window.position(), "frame rejected: {e}");
                self.progress.record_decode_error();
                cur.locked = false;
                cur.window.consume(1);
                Step::Skipped
            }
        }
    }

    fn lost_sync(&mut self, cur: &mut Cursor) -> Step {
        if self.resuming {
            cur.resync_failures += 1;
            if cur.resync_failures > self.settings.resync_attempts {
                return Step::Restart;
            }
            debug!(
                attempt = cur.resync_failures,
                position = cur.window.position(),
                "no frame sync after resume, skipping forward"
            );
            cur.window
                .consume(self.settings.resync_step.min(cur.window.len()));
            return Step::Skipped;
        }

        // A header may straddle the window end.
        if cur.window.len() < HEADER_LEN {
            return Step::NeedData;
        }
        cur.window.keep_tail(HEADER_LEN - 1);
        Step::NeedData
    }

    fn restart(&mut self, cur: &mut Cursor) -> bool {
        warn!("no frame sync near the resume point, restarting from the beginning");
        for chunk in self.buffer.request_seek(0) {
            self.pool.give_back(chunk);
        }
        self.decoder.reset();
        self.resuming = false;
        self.start_elapsed_ms = 0;
        cur.window.clear();
        cur.locked = false;
        cur.eof = false;
        cur.want_more = false;
        cur.skip_pending = 0;
        cur.resync_failures = 0;
        cur.elapsed_us = 0;
        self.progress.set_state(SessionState::Streaming);
        self.buffer.wait_for_fill(self.settings.low_water)
    }

    fn emit(&mut self, cur: &mut Cursor, header: &FrameHeader, frame: DecodedFrame) {
        let channels = frame.channels.max(1);
        let rate = if frame.sample_rate > 0 {
            frame.sample_rate
        } else {
            header.sample_rate
        };
        let per_channel = frame.samples.len() / usize::from(channels);
        let mut samples = if channels > 1 {
            downmix_to_mono(&frame.samples, channels)
        } else {
            frame.samples
        };

        if !self.sink.output_enabled() {
            self.sink.enable_output(true);
        }
        let mut out_rate = rate;
        if self.sink.output_sample_rate() != rate {
            let accepted = cur.refused_rate != Some(rate) && self.sink.set_output_sample_rate(Some(rate));
            if !accepted {
                out_rate = self.sink.output_sample_rate();
                if cur.refused_rate != Some(rate) {
                    warn!(
                        track_rate = rate,
                        sink_rate = out_rate,
                        "sink refused the track rate, converting in software"
                    );
                    cur.refused_rate = Some(rate);
                }
                samples = resample(&samples, rate, out_rate);
            }
        }

        let timestamp_ms = self.start_elapsed_ms + cur.elapsed_us / 1000;
        cur.elapsed_us += per_channel as u64 * 1_000_000 / u64::from(rate);
        self.sink.output_data(PcmPacket {
            sample_rate: out_rate,
            channels: 1,
            samples,
            timestamp_ms,
        });

        cur.frames += 1;
        let elapsed_ms = self.start_elapsed_ms + cur.elapsed_us / 1000;
        let position = cur.window.position();
        self.progress.set_bitrate(header.bitrate_kbps);
        self.progress.record_frame(position, elapsed_ms);

        let every = self.settings.progress_log_frames;
        if every > 0 && cur.frames % every == 0 {
            info!(frames = cur.frames, elapsed_ms, position, "playback progress");
        }
    }
}
