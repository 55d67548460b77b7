use std::fmt;
use std::path::{Path, PathBuf};

use crate::playback::PlayMode;
use crate::stream::ProgressSnapshot;

/// What a session is (or was last) playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NowPlaying {
    /// An entry of the music index.
    Track {
        index: usize,
        path: PathBuf,
        title: String,
        duration_ms: Option<u64>,
    },
    /// A chapter, identified by names so it survives a rescan.
    Chapter {
        category: String,
        story: String,
        chapter: usize,
        path: PathBuf,
    },
    /// A file outside the music index.
    File { path: PathBuf },
}

impl NowPlaying {
    pub fn path(&self) -> &Path {
        match self {
            Self::Track { path, .. } | Self::Chapter { path, .. } | Self::File { path } => path,
        }
    }

    pub fn is_story(&self) -> bool {
        matches!(self, Self::Chapter { .. })
    }
}

impl fmt::Display for NowPlaying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Track { title, .. } => f.write_str(title),
            Self::Chapter {
                category,
                story,
                chapter,
                ..
            } => write!(f, "{category} / {story} #{}", chapter + 1),
            Self::File { path } => write!(f, "{}", path.display()),
        }
    }
}

/// A point-in-time view of the player for status displays.
#[derive(Debug, Clone)]
pub struct PlayerStatus {
    pub now_playing: Option<NowPlaying>,
    pub progress: Option<ProgressSnapshot>,
    pub mode: PlayMode,
    pub story_mode: PlayMode,
    pub playlist: String,
    pub playlist_position: usize,
    pub tracks: usize,
    pub stories: usize,
    pub battery_level: Option<u8>,
    pub charging: bool,
}
