//! Resume points, modes and saved playlists on top of a [`KvStore`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::storage::KvStore;

use super::mode::PlayMode;
use super::resume::{ResumePoint, round_down_offset};

const MUSIC_INDEX: &str = "music_index";
const MUSIC_PATH: &str = "music_path";
const MUSIC_OFFSET: &str = "music_offset";
const MUSIC_MS: &str = "music_ms";
const MUSIC_DURATION_MS: &str = "music_duration_ms";
const STORY_CATEGORY: &str = "story_category";
const STORY_NAME: &str = "story_name";
const STORY_CHAPTER: &str = "story_chapter";
const STORY_OFFSET: &str = "story_offset";
const STORY_MS: &str = "story_ms";
const STORY_DURATION_MS: &str = "story_duration_ms";
const PLAY_MODE: &str = "play_mode";
const STORY_MODE: &str = "story_mode";
const LAST_PLAYLIST: &str = "last_playlist";
const PLAYLISTS: &str = "playlists";
const PLAYLIST_PREFIX: &str = "playlist.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicResume {
    pub index: usize,
    /// Path of the track when it was saved, to detect a reshuffled index.
    pub path: Option<PathBuf>,
    pub point: ResumePoint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryResume {
    pub category: String,
    pub story: String,
    pub chapter: usize,
    pub point: ResumePoint,
}

#[derive(Clone)]
pub struct PlaybackStore {
    kv: Arc<dyn KvStore>,
    namespace: String,
}

impl std::fmt::Debug for PlaybackStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl PlaybackStore {
    pub fn new(kv: Arc<dyn KvStore>, namespace: impl Into<String>) -> Self {
        Self {
            kv,
            namespace: namespace.into(),
        }
    }

    fn get_u64(&self, key: &str) -> Option<u64> {
        self.kv
            .get_i64(&self.namespace, key)
            .and_then(|v| u64::try_from(v).ok())
    }

    fn set_u64(&self, key: &str, value: u64) {
        self.kv
            .set_i64(&self.namespace, key, i64::try_from(value).unwrap_or(i64::MAX));
    }

    fn get_usize(&self, key: &str) -> Option<usize> {
        self.kv
            .get_i32(&self.namespace, key)
            .and_then(|v| usize::try_from(v).ok())
    }

    fn set_usize(&self, key: &str, value: usize) {
        self.kv
            .set_i32(&self.namespace, key, i32::try_from(value).unwrap_or(i32::MAX));
    }

    /// Record the music position. The offset is rounded down to 1 KiB.
    pub fn save_music(&self, index: usize, path: &Path, point: ResumePoint) -> Result<()> {
        let offset = round_down_offset(point.offset);
        self.set_usize(MUSIC_INDEX, index);
        self.kv
            .set_string(&self.namespace, MUSIC_PATH, &path.to_string_lossy());
        self.set_u64(MUSIC_OFFSET, offset);
        self.set_u64(MUSIC_MS, point.elapsed_ms);
        match point.duration_ms {
            Some(d) => self.set_u64(MUSIC_DURATION_MS, d),
            None => self.kv.remove(&self.namespace, MUSIC_DURATION_MS),
        }
        debug!(index, offset, elapsed_ms = point.elapsed_ms, "music position saved");
        self.kv.commit()
    }

    pub fn load_music(&self) -> Option<MusicResume> {
        let index = self.get_usize(MUSIC_INDEX)?;
        Some(MusicResume {
            index,
            path: self
                .kv
                .get_string(&self.namespace, MUSIC_PATH)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            point: ResumePoint {
                offset: self.get_u64(MUSIC_OFFSET).unwrap_or(0),
                elapsed_ms: self.get_u64(MUSIC_MS).unwrap_or(0),
                duration_ms: self.get_u64(MUSIC_DURATION_MS),
            },
        })
    }

    /// Record the story position. The offset is rounded down to 1 KiB.
    pub fn save_story(
        &self,
        category: &str,
        story: &str,
        chapter: usize,
        point: ResumePoint,
    ) -> Result<()> {
        let offset = round_down_offset(point.offset);
        self.kv.set_string(&self.namespace, STORY_CATEGORY, category);
        self.kv.set_string(&self.namespace, STORY_NAME, story);
        self.set_usize(STORY_CHAPTER, chapter);
        self.set_u64(STORY_OFFSET, offset);
        self.set_u64(STORY_MS, point.elapsed_ms);
        match point.duration_ms {
            Some(d) => self.set_u64(STORY_DURATION_MS, d),
            None => self.kv.remove(&self.namespace, STORY_DURATION_MS),
        }
        debug!(category, story, chapter, offset, "story position saved");
        self.kv.commit()
    }

    pub fn load_story(&self) -> Option<StoryResume> {
        let category = self.kv.get_string(&self.namespace, STORY_CATEGORY)?;
        let story = self.kv.get_string(&self.namespace, STORY_NAME)?;
        Some(StoryResume {
            category,
            story,
            chapter: self.get_usize(STORY_CHAPTER).unwrap_or(0),
            point: ResumePoint {
                offset: self.get_u64(STORY_OFFSET).unwrap_or(0),
                elapsed_ms: self.get_u64(STORY_MS).unwrap_or(0),
                duration_ms: self.get_u64(STORY_DURATION_MS),
            },
        })
    }

    pub fn save_modes(&self, music: PlayMode, story: PlayMode) -> Result<()> {
        self.kv.set_i32(&self.namespace, PLAY_MODE, music.as_i32());
        self.kv.set_i32(&self.namespace, STORY_MODE, story.as_i32());
        self.kv.commit()
    }

    /// Saved music and story modes; unknown values read as absent.
    pub fn load_modes(&self) -> (Option<PlayMode>, Option<PlayMode>) {
        let get = |key: &str| {
            self.kv
                .get_i32(&self.namespace, key)
                .and_then(PlayMode::from_i32)
        };
        (get(PLAY_MODE), get(STORY_MODE))
    }

    pub fn playlist_names(&self) -> Vec<String> {
        self.kv
            .get_string(&self.namespace, PLAYLISTS)
            .map(|s| {
                s.lines()
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn set_playlist_names(&self, names: &[String]) {
        self.kv
            .set_string(&self.namespace, PLAYLISTS, &names.join("\n"));
    }

    /// Store (or replace) a named list of track paths.
    pub fn save_playlist(&self, name: &str, paths: &[PathBuf]) -> Result<()> {
        let joined = paths
            .iter()
            .map(|p| p.to_string_lossy())
            .collect::<Vec<_>>()
            .join("\n");
        self.kv
            .set_string(&self.namespace, &format!("{PLAYLIST_PREFIX}{name}"), &joined);
        let mut names = self.playlist_names();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
            self.set_playlist_names(&names);
        }
        self.kv.commit()
    }

    pub fn load_playlist(&self, name: &str) -> Option<Vec<PathBuf>> {
        let joined = self
            .kv
            .get_string(&self.namespace, &format!("{PLAYLIST_PREFIX}{name}"))?;
        Some(
            joined
                .lines()
                .filter(|l| !l.is_empty())
                .map(PathBuf::from)
                .collect(),
        )
    }

    /// Remove a playlist. Returns whether it existed.
    pub fn delete_playlist(&self, name: &str) -> Result<bool> {
        let key = format!("{PLAYLIST_PREFIX}{name}");
        let existed = self.kv.get_string(&self.namespace, &key).is_some();
        self.kv.remove(&self.namespace, &key);
        let mut names = self.playlist_names();
        names.retain(|n| n != name);
        self.set_playlist_names(&names);
        if self.last_playlist().as_deref() == Some(name) {
            self.kv.remove(&self.namespace, LAST_PLAYLIST);
        }
        self.kv.commit()?;
        Ok(existed)
    }

    pub fn set_last_playlist(&self, name: Option<&str>) -> Result<()> {
        match name {
            Some(n) => self.kv.set_string(&self.namespace, LAST_PLAYLIST, n),
            None => self.kv.remove(&self.namespace, LAST_PLAYLIST),
        }
        self.kv.commit()
    }

    pub fn last_playlist(&self) -> Option<String> {
        self.kv
            .get_string(&self.namespace, LAST_PLAYLIST)
            .filter(|n| !n.is_empty())
    }
}
