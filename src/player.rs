//! The playback facade command handlers talk to.
//!
//! [`MediaPlayer`] owns both indexes, the playback state, at most one
//! [`StreamingSession`](crate::stream::StreamingSession) and the task that
//! advances to the next track. Every command returns `bool`; failures are
//! logged where they happen.

mod advance;
mod engine;
mod types;

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::audio::{AudioSink, BatterySource, DeviceStateSource};
use crate::config::Settings;
use crate::error::Result;
use crate::event::{EVENT_SHUTDOWN, EVENT_SKIP};
use crate::library::{MusicEntry, MusicIndex, StoryIndex};
use crate::playback::PlayMode;
use crate::storage::KvStore;
use crate::stream::{FrameDecoder, SymphoniaFrameDecoder, Worker};

use engine::Engine;

pub use types::{NowPlaying, PlayerStatus};

/// Builds a fresh frame decoder for each session.
pub type DecoderFactory = Box<dyn Fn() -> Box<dyn FrameDecoder> + Send + Sync>;

/// The collaborators a player runs against.
pub struct PlayerIo {
    pub sink: Arc<dyn AudioSink>,
    pub device: Arc<dyn DeviceStateSource>,
    pub store: Arc<dyn KvStore>,
    pub battery: Option<Arc<dyn BatterySource>>,
}

pub struct MediaPlayer {
    engine: Arc<Engine>,
    advance: Option<Worker>,
}

fn report<T>(what: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("{what} failed: {e}");
            None
        }
    }
}

impl MediaPlayer {
    pub fn new(settings: Settings, io: PlayerIo) -> Result<Self> {
        let decoders: DecoderFactory =
            Box::new(|| -> Box<dyn FrameDecoder> { Box::new(SymphoniaFrameDecoder::new()) });
        Self::with_decoder(settings, io, decoders)
    }

    pub fn with_decoder(settings: Settings, io: PlayerIo, decoders: DecoderFactory) -> Result<Self> {
        let engine = Arc::new(Engine::new(settings, io, decoders));
        let advance = advance::spawn(Arc::clone(&engine))?;
        Ok(Self {
            engine,
            advance: Some(advance),
        })
    }

    /// Reseed the generator behind random mode and random picks.
    pub fn seed_rng(&self, seed: u64) {
        self.engine.seed_rng(seed);
    }

    /// Rebuild the music index from `root`, or the configured music root.
    pub fn scan_music_library(&self, root: Option<&Path>) -> bool {
        report("music scan", self.engine.scan_music(root)).is_some()
    }

    /// Rebuild the story index from `root`, or the configured story root.
    pub fn scan_story_library(&self, root: Option<&Path>) -> bool {
        report("story scan", self.engine.scan_stories(root)).is_some()
    }

    /// The current music index generation.
    pub fn music_index(&self) -> Arc<MusicIndex> {
        self.engine.music_snapshot()
    }

    pub fn story_index(&self) -> Arc<StoryIndex> {
        self.engine.story_snapshot()
    }

    /// Best fuzzy matches for `query`, best first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<MusicEntry> {
        self.engine.search(query, limit)
    }

    pub fn play_from_sd(&self, path: &Path) -> bool {
        report("play file", self.engine.play_file(path)).is_some()
    }

    /// Play position `position` of the active playlist (clamped).
    pub fn play_index(&self, position: usize) -> bool {
        report("play index", self.engine.play_index(position)).is_some()
    }

    pub fn play_song(&self, query: &str) -> bool {
        report("play song", self.engine.play_song(query)).is_some()
    }

    pub fn play_by_artist(&self, artist: &str) -> bool {
        report("play artist", self.engine.play_by_artist(artist)).is_some()
    }

    /// Start a story from its first chapter. Either name may be left out;
    /// a random story is chosen then.
    pub fn play_story(&self, category: Option<&str>, story: Option<&str>) -> bool {
        report("play story", self.engine.play_story(category, story, 0)).is_some()
    }

    /// Start a story at `chapter` (0-based, clamped to the last chapter).
    pub fn play_story_chapter(&self, category: Option<&str>, story: &str, chapter: usize) -> bool {
        report(
            "play chapter",
            self.engine.play_story(category, Some(story), chapter),
        )
        .is_some()
    }

    /// Skip to the next track or chapter now.
    pub fn next(&self) -> bool {
        report("next", self.engine.next()).is_some()
    }

    /// Ask the advance task to skip; returns immediately.
    pub fn request_next(&self) {
        self.engine.events.set(EVENT_SKIP);
    }

    /// Stop playback and persist the position. Returns whether anything was playing.
    pub fn stop(&self) -> bool {
        self.engine.stop()
    }

    pub fn pause(&self) -> bool {
        self.engine.pause()
    }

    pub fn resume(&self) -> bool {
        self.engine.resume()
    }

    pub fn set_play_mode(&self, mode: PlayMode) -> bool {
        report("set play mode", self.engine.set_play_mode(mode)).is_some()
    }

    pub fn set_story_mode(&self, mode: PlayMode) -> bool {
        report("set story mode", self.engine.set_story_mode(mode)).is_some()
    }

    pub fn resume_saved_playback(&self) -> bool {
        report("resume music", self.engine.resume_saved_playback()).is_some()
    }

    pub fn resume_saved_story_playback(&self) -> bool {
        report("resume story", self.engine.resume_saved_story_playback()).is_some()
    }

    /// Save a playlist of the best match for each of `songs`.
    pub fn create_playlist(&self, name: &str, songs: &[&str]) -> bool {
        report("create playlist", self.engine.create_playlist(name, songs)).is_some()
    }

    pub fn play_playlist(&self, name: &str) -> bool {
        report("play playlist", self.engine.play_playlist(name)).is_some()
    }

    pub fn delete_playlist(&self, name: &str) -> bool {
        report("delete playlist", self.engine.delete_playlist(name)).unwrap_or(false)
    }

    pub fn playlist_names(&self) -> Vec<String> {
        self.engine.playlist_names()
    }

    pub fn status(&self) -> PlayerStatus {
        self.engine.status()
    }
}

impl Drop for MediaPlayer {
    fn drop(&mut self) {
        self.engine.events.set(EVENT_SHUTDOWN);
        if let Some(advance) = self.advance.take() {
            // The task may be mid-switch, joining a session of its own.
            advance.join_timeout(self.engine.settings().stream.join_timeout() * 4);
        }
        self.engine.stop();
    }
}

#[cfg(test)]
mod tests;
