use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::file::AudioFile;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;
use crate::error::{Error, Result};
use crate::search::{normalize_for_search, normalize_for_token, parse_song_meta};

use super::model::{MusicEntry, StoryEntry};

pub(super) fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            settings
                .extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.'))
                .any(|e| !e.is_empty() && e.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

pub(crate) fn read_duration(path: &Path) -> Option<Duration> {
    lofty::read_from_path(path)
        .ok()
        .map(|tagged| tagged.properties().duration())
        .filter(|d| !d.is_zero())
}

fn ensure_dir(root: &Path) -> Result<()> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(Error::NotFound(format!("{} is not a directory", root.display())))
    }
}

fn push_checked<T>(out: &mut Vec<T>, item: T) -> Result<()> {
    out.try_reserve(1)
        .map_err(|e| Error::InvalidState(format!("index allocation failed: {e}")))?;
    out.push(item);
    Ok(())
}

/// Walk `root` depth-first in file-name order and build one entry per audio file.
///
/// Walk errors on individual entries are skipped; running out of memory
/// aborts the whole build so no half-populated list escapes.
pub(super) fn collect_music(root: &Path, settings: &LibrarySettings) -> Result<Vec<MusicEntry>> {
    ensure_dir(root)?;

    let mut walker = WalkDir::new(root)
        .follow_links(settings.follow_links)
        .sort_by_file_name();
    if let Some(d) = settings.max_depth {
        walker = walker.max_depth(d);
    }

    let mut entries: Vec<MusicEntry> = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                debug!("skipping unreadable entry: {err}");
                None
            }
        })
    {
        let path = entry.path();
        if !entry.file_type().is_file() && !path.is_file() {
            continue;
        }
        if !is_audio_file(path, settings) {
            continue;
        }

        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let file_size = match entry.metadata() {
            Ok(m) => m.len(),
            Err(err) => {
                warn!(path = %path.display(), "stat failed: {err}");
                continue;
            }
        };

        let meta = parse_song_meta(&file_name);
        let full_normalized = format!("{}{}", meta.artist_normalized, meta.title_normalized);

        push_checked(
            &mut entries,
            MusicEntry {
                file_path: path.to_path_buf(),
                file_name,
                song_name: meta.title,
                artist: meta.artist,
                song_normalized: meta.title_normalized,
                artist_normalized: meta.artist_normalized,
                token_normalized: meta.token_normalized,
                full_normalized,
                file_size,
                duration: read_duration(path),
            },
        )?;
    }

    Ok(entries)
}

/// Immediate children of `dir` passing `keep`, sorted by file name.
fn children(
    dir: &Path,
    settings: &LibrarySettings,
    keep: impl Fn(&walkdir::DirEntry) -> bool,
) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(settings.follow_links)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| settings.include_hidden || !is_hidden(e.path()))
        .filter(|e| keep(e))
        .map(|e| e.into_path())
        .collect()
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Two-level walk: categories, then stories, then chapter files.
/// Stories without any chapter are skipped.
pub(super) fn collect_stories(root: &Path, settings: &LibrarySettings) -> Result<Vec<StoryEntry>> {
    ensure_dir(root)?;

    let mut stories: Vec<StoryEntry> = Vec::new();
    for category_dir in children(root, settings, |e| e.path().is_dir()) {
        let category = dir_name(&category_dir);

        for story_dir in children(&category_dir, settings, |e| e.path().is_dir()) {
            let story_name = dir_name(&story_dir);

            let mut chapters = children(&story_dir, settings, |e| {
                e.path().is_file() && is_audio_file(e.path(), settings)
            });
            if chapters.is_empty() {
                debug!(category = %category, story = %story_name, "story has no chapters, skipping");
                continue;
            }
            chapters.sort();

            push_checked(
                &mut stories,
                StoryEntry {
                    category_normalized: normalize_for_search(&category),
                    story_normalized: normalize_for_search(&story_name),
                    token_normalized: normalize_for_token(&format!("{category} {story_name}")),
                    category: category.clone(),
                    story_name,
                    chapters,
                    category_index: 0,
                },
            )?;
        }
    }

    Ok(stories)
}
