use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level engine settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/xiaozhi-media/config.toml` or
/// `~/.config/xiaozhi-media/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `XIAOZHI__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub stream: StreamSettings,
    pub pause: PauseSettings,
    pub search: SearchSettings,
    pub playback: PlaybackSettings,
    pub storage: StorageSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Root of the music tree on the card.
    pub music_root: PathBuf,
    /// Root of the story tree: `<root>/<category>/<story>/<chapter files>`.
    pub story_root: PathBuf,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Optional cap on music directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            music_root: PathBuf::from("/sdcard/音乐"),
            story_root: PathBuf::from("/sdcard/故事"),
            extensions: ["mp3", "wav", "flac", "aac", "m4a", "ogg", "wma"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            follow_links: true,
            include_hidden: false,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Bytes read from the card per chunk.
    pub chunk_size: usize,
    /// Number of preallocated chunk slots per session.
    pub pool_slots: usize,
    /// Reader blocks once this many bytes are queued.
    pub high_water: usize,
    /// Decoder waits for this many queued bytes before starting.
    pub low_water: usize,
    /// Bytes to back up before a saved resume offset.
    pub resume_backoff: u64,
    /// Forward skip per failed resync attempt while resuming.
    pub resync_step: usize,
    /// Failed resync attempts before restarting from byte 0.
    pub resync_attempts: u32,
    /// Budget for joining each worker thread on stop (milliseconds).
    pub join_timeout_ms: u64,
    /// Log progress every N decoded frames (0 disables).
    pub progress_log_frames: u64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            chunk_size: 4 * 1024,
            pool_slots: 72,
            high_water: 256 * 1024,
            low_water: 32 * 1024,
            resume_backoff: 2 * 1024,
            resync_step: 2 * 1024,
            resync_attempts: 5,
            join_timeout_ms: 300,
            progress_log_frames: 1000,
        }
    }
}

impl StreamSettings {
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PauseSettings {
    /// How often a paused decoder re-checks device state (milliseconds).
    pub recheck_ms: u64,
    /// Continuous listening time after which playback resumes on its own (milliseconds).
    pub auto_resume_ms: u64,
}

impl Default for PauseSettings {
    fn default() -> Self {
        Self {
            recheck_ms: 2_000,
            auto_resume_ms: 10_000,
        }
    }
}

impl PauseSettings {
    pub fn recheck(&self) -> Duration {
        Duration::from_millis(self.recheck_ms)
    }

    pub fn auto_resume(&self) -> Duration {
        Duration::from_millis(self.auto_resume_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Fuzzy candidates scoring below this are not returned.
    pub min_fuzzy_score: i32,
    /// Maximum number of tracks returned for an artist query.
    pub artist_limit: usize,
    /// Edit distance up to which the supplementary Levenshtein bonus applies.
    pub levenshtein_threshold: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_fuzzy_score: 250,
            artist_limit: 5,
            levenshtein_threshold: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Default mode for music.
    pub mode: PlayModeSetting,
    /// Default mode for stories.
    pub story_mode: PlayModeSetting,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            mode: PlayModeSetting::Order,
            story_mode: PlayModeSetting::Order,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayModeSetting {
    #[serde(alias = "single", alias = "play-once")]
    Once,
    #[serde(alias = "repeat", alias = "repeat-one", alias = "loop-one")]
    Loop,
    #[serde(alias = "shuffle")]
    Random,
    #[serde(alias = "sequential", alias = "in-order")]
    Order,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Where resume points and playlists are persisted. `None` keeps them in memory.
    pub path: Option<PathBuf>,
    /// Key namespace used inside the store.
    pub namespace: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: None,
            namespace: "music".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Rate the speaker path runs at when no track asks for another one.
    pub sample_rate: u32,
    /// PCM packets allowed to queue in the output before `output_data` blocks.
    pub max_queued_packets: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            max_queued_packets: 12,
        }
    }
}
