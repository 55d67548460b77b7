//! Offline SD-card music and story playback for the Xiaozhi voice assistant.
//!
//! The crate scans a music tree and a story tree into in-memory indexes,
//! matches spoken requests against them, and streams the chosen file through
//! a buffered reader/decoder pipeline into an [`AudioSink`](audio::AudioSink).
//! Playback pauses while the assistant is busy and resumes from a persisted
//! position after a restart. [`MediaPlayer`](player::MediaPlayer) is the
//! entry point.

pub mod audio;
pub mod config;
pub mod error;
pub mod event;
pub mod library;
pub mod playback;
pub mod player;
pub mod search;
pub mod storage;
pub mod stream;

pub use error::{Error, Result};
pub use player::{MediaPlayer, PlayerIo};
