use std::path::{Path, PathBuf};
use std::time::Duration;

/// One playable file found under the music root.
#[derive(Debug, Clone)]
pub struct MusicEntry {
    pub file_path: PathBuf,
    pub file_name: String,
    pub song_name: String,
    /// Empty when the file name carries no artist.
    pub artist: String,
    pub song_normalized: String,
    pub artist_normalized: String,
    /// Token form of `"<artist> <title>"`.
    pub token_normalized: String,
    /// Search form of artist and title concatenated.
    pub full_normalized: String,
    pub file_size: u64,
    pub duration: Option<Duration>,
}

impl MusicEntry {
    pub fn display(&self) -> String {
        if self.artist.is_empty() {
            self.song_name.clone()
        } else {
            format!("{} - {}", self.artist, self.song_name)
        }
    }
}

/// A story directory: `<story_root>/<category>/<story>/<chapters>`.
#[derive(Debug, Clone)]
pub struct StoryEntry {
    pub category: String,
    pub story_name: String,
    /// Sorted by full path.
    pub chapters: Vec<PathBuf>,
    pub category_normalized: String,
    pub story_normalized: String,
    /// Token form of `"<category> <story>"`.
    pub token_normalized: String,
    /// Position of `category` in the owning index's category list.
    pub category_index: usize,
}

impl StoryEntry {
    pub fn chapter(&self, chapter: usize) -> Option<&Path> {
        self.chapters.get(chapter).map(PathBuf::as_path)
    }
}

/// A top-level story directory and the stories under it, in index order.
#[derive(Debug, Clone)]
pub struct StoryCategory {
    pub name: String,
    pub normalized: String,
    pub stories: Vec<usize>,
}
