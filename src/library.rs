//! Media index built from the SD card.
//!
//! A scan walks the filesystem without holding any lock, builds a complete
//! new index generation, and swaps it in under the library mutex. Readers
//! take an `Arc` snapshot and keep the old generation alive until they drop
//! it, so a rescan never frees data that a lookup is still reading.

mod index;
mod model;
mod scan;
mod story;

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::config::LibrarySettings;
use crate::error::Result;

pub use index::{MusicIndex, View};
pub use model::{MusicEntry, StoryCategory, StoryEntry};
pub use story::StoryIndex;
pub(crate) use scan::read_duration;

/// Holds the current generation of an index behind a swap-only lock.
#[derive(Debug)]
struct IndexCell<I> {
    current: Mutex<Arc<I>>,
    generation: AtomicU64,
}

impl<I: Default> IndexCell<I> {
    fn new() -> Self {
        Self {
            current: Mutex::new(Arc::new(I::default())),
            generation: AtomicU64::new(0),
        }
    }

    fn snapshot(&self) -> Arc<I> {
        match self.current.lock() {
            Ok(g) => Arc::clone(&g),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn swap(&self, index: I) {
        let old = {
            let mut g = self.current.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *g, Arc::new(index))
        };
        // Freed here, outside the lock, unless a reader still holds it.
        drop(old);
    }
}

/// All tracks under the music root.
#[derive(Debug)]
pub struct MusicLibrary {
    cell: IndexCell<MusicIndex>,
    settings: LibrarySettings,
}

impl MusicLibrary {
    pub fn new(settings: LibrarySettings) -> Self {
        Self {
            cell: IndexCell::new(),
            settings,
        }
    }

    /// Rebuild the index from `root`. On failure the previous index stays.
    pub fn scan(&self, root: &Path) -> Result<usize> {
        let entries = scan::collect_music(root, &self.settings)?;
        let count = entries.len();
        let index = MusicIndex::build(entries, self.cell.next_generation());
        info!(root = %root.display(), tracks = count, generation = index.generation(), "music index rebuilt");
        self.cell.swap(index);
        Ok(count)
    }

    pub fn snapshot(&self) -> Arc<MusicIndex> {
        self.cell.snapshot()
    }
}

/// All stories under the story root.
#[derive(Debug)]
pub struct StoryLibrary {
    cell: IndexCell<StoryIndex>,
    settings: LibrarySettings,
}

impl StoryLibrary {
    pub fn new(settings: LibrarySettings) -> Self {
        Self {
            cell: IndexCell::new(),
            settings,
        }
    }

    /// Rebuild the story index from `root`. On failure the previous index stays.
    pub fn scan(&self, root: &Path) -> Result<usize> {
        let stories = scan::collect_stories(root, &self.settings)?;
        let count = stories.len();
        let index = StoryIndex::build(stories, self.cell.next_generation());
        info!(
            root = %root.display(),
            stories = count,
            categories = index.categories().len(),
            generation = index.generation(),
            "story index rebuilt"
        );
        self.cell.swap(index);
        Ok(count)
    }

    pub fn snapshot(&self) -> Arc<StoryIndex> {
        self.cell.snapshot()
    }
}

#[cfg(test)]
mod tests;
