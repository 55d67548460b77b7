//! Buffered reader/decoder pipeline for one track at a time.
//!
//! A [`StreamingSession`] owns a reader thread that fills a bounded FIFO of
//! pool chunks from the card and a decoder thread that drains it frame by
//! frame into the [`AudioSink`](crate::audio::AudioSink). The decoder thread
//! also runs the device-driven pause coordinator.

mod buffer;
mod decode;
mod decoder;
mod mpeg;
mod pause;
mod pcm;
mod pool;
mod progress;
mod reader;
mod session;
mod window;
mod worker;

pub use buffer::{PauseReason, Push, SharedBuffer};
pub use decoder::{DecodedFrame, FrameDecoder, SymphoniaFrameDecoder};
pub use mpeg::{FrameHeader, MpegVersion, find_sync, id3v2_tag_len};
pub use pcm::{downmix_to_mono, resample};
pub use pool::{AudioChunk, ChunkPool};
pub use progress::{ProgressSnapshot, SessionState};
pub use session::{FinishHook, SessionIo, SessionReport, StreamOptions, StreamingSession};
pub use worker::Worker;


#[cfg(test)]
pub(crate) mod testing;
