use std::path::PathBuf;

use rand::Rng;
use tracing::debug;

use crate::library::MusicIndex;

/// Name of the implicit whole-library playlist.
pub const FULL_LIBRARY: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistTracks {
    /// Every track of the current index, in index order.
    FullLibrary,
    /// A saved list. `indexes` is `paths` resolved against the current index
    /// generation; paths that are no longer on the card are left out.
    Custom {
        paths: Vec<PathBuf>,
        indexes: Vec<usize>,
    },
}

/// The active playlist and the cursor into it.
///
/// `current_index` and `previous_index` are playlist positions, not index
/// entries; [`track`](Self::track) maps one to the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistState {
    pub name: String,
    pub tracks: PlaylistTracks,
    pub current_index: usize,
    pub previous_index: Option<usize>,
}

impl Default for PlaylistState {
    fn default() -> Self {
        Self::full_library()
    }
}

impl PlaylistState {
    pub fn full_library() -> Self {
        Self {
            name: FULL_LIBRARY.to_string(),
            tracks: PlaylistTracks::FullLibrary,
            current_index: 0,
            previous_index: None,
        }
    }

    pub fn custom(name: impl Into<String>, paths: Vec<PathBuf>, index: &MusicIndex) -> Self {
        let mut state = Self {
            name: name.into(),
            tracks: PlaylistTracks::Custom {
                paths,
                indexes: Vec::new(),
            },
            current_index: 0,
            previous_index: None,
        };
        state.resolve(index);
        state
    }

    pub fn is_full_library(&self) -> bool {
        matches!(self.tracks, PlaylistTracks::FullLibrary)
    }

    /// Number of playable positions given the current library size.
    pub fn len(&self, library_len: usize) -> usize {
        match &self.tracks {
            PlaylistTracks::FullLibrary => library_len,
            PlaylistTracks::Custom { indexes, .. } => indexes.len(),
        }
    }

    /// Index entry at playlist `position`. Full-library positions are not
    /// bounds-checked here.
    pub fn track(&self, position: usize) -> Option<usize> {
        match &self.tracks {
            PlaylistTracks::FullLibrary => Some(position),
            PlaylistTracks::Custom { indexes, .. } => indexes.get(position).copied(),
        }
    }

    pub fn current_track(&self) -> Option<usize> {
        self.track(self.current_index)
    }

    /// Playlist position holding index entry `track`.
    pub fn position_of(&self, track: usize) -> Option<usize> {
        match &self.tracks {
            PlaylistTracks::FullLibrary => Some(track),
            PlaylistTracks::Custom { indexes, .. } => indexes.iter().position(|&i| i == track),
        }
    }

    /// Re-map a saved list onto a new index generation and clamp the cursor.
    pub fn resolve(&mut self, index: &MusicIndex) {
        if let PlaylistTracks::Custom { paths, indexes } = &mut self.tracks {
            *indexes = paths.iter().filter_map(|p| index.find_by_path(p)).collect();
            if indexes.len() < paths.len() {
                debug!(
                    playlist = %self.name,
                    missing = paths.len() - indexes.len(),
                    "playlist entries not on the card"
                );
            }
        }
        let len = self.len(index.len());
        if self.current_index >= len {
            self.current_index = len.saturating_sub(1);
        }
        self.previous_index = self.previous_index.filter(|&p| p < len);
    }

    /// Move to `position`, clamped to the last entry. `None` for an empty list.
    pub fn set_play_index(&mut self, position: usize, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let position = position.min(len - 1);
        self.previous_index = Some(self.current_index);
        self.current_index = position;
        Some(position)
    }

    /// Next position in order, wrapping to 0 after the last.
    pub fn next_order(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let next = (self.current_index + 1) % len;
        self.set_play_index(next, len)
    }

    /// A uniformly chosen position other than the current one. With a single
    /// entry that entry is chosen again.
    pub fn next_random<R: Rng + ?Sized>(&mut self, len: usize, rng: &mut R) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let current = self.current_index.min(len - 1);
        let next = if len == 1 {
            0
        } else {
            let pick = rng.gen_range(0..len - 1);
            if pick >= current { pick + 1 } else { pick }
        };
        self.set_play_index(next, len)
    }
}
