//! One immutable generation of the music index plus its sorted views.

use std::cmp::Ordering;
use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::SearchSettings;
use crate::search::{Query, Ranked, best, normalize_for_search, top_k};

use super::model::MusicEntry;

/// Which sorted projection of the arena to use.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum View {
    ByTitle,
    ByArtistTitle,
    ByArtist,
}

/// Entries in scan order plus three index vectors sorted for binary search.
///
/// Views hold positions into `entries` of the same generation only; a new
/// scan produces a whole new `MusicIndex`.
#[derive(Debug, Default)]
pub struct MusicIndex {
    generation: u64,
    entries: Vec<MusicEntry>,
    by_title: Vec<usize>,
    by_artist_title: Vec<usize>,
    by_artist: Vec<usize>,
}

fn cmp_title(a: &MusicEntry, b: &MusicEntry) -> Ordering {
    a.song_normalized
        .cmp(&b.song_normalized)
        .then_with(|| a.file_name.len().cmp(&b.file_name.len()))
        .then_with(|| a.file_path.cmp(&b.file_path))
}

fn cmp_artist_title(a: &MusicEntry, b: &MusicEntry) -> Ordering {
    a.artist_normalized
        .cmp(&b.artist_normalized)
        .then_with(|| cmp_title(a, b))
}

impl MusicIndex {
    pub fn build(entries: Vec<MusicEntry>, generation: u64) -> Self {
        let sorted = |cmp: fn(&MusicEntry, &MusicEntry) -> Ordering| {
            let mut view: Vec<usize> = (0..entries.len()).collect();
            view.sort_by(|&a, &b| cmp(&entries[a], &entries[b]));
            view
        };

        let by_title = sorted(cmp_title);
        let by_artist_title = sorted(cmp_artist_title);
        let mut by_artist = by_artist_title.clone();
        by_artist.retain(|&i| !entries[i].artist_normalized.is_empty());

        Self {
            generation,
            entries,
            by_title,
            by_artist_title,
            by_artist,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MusicEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[MusicEntry] {
        &self.entries
    }

    pub fn view(&self, view: View) -> &[usize] {
        match view {
            View::ByTitle => &self.by_title,
            View::ByArtistTitle => &self.by_artist_title,
            View::ByArtist => &self.by_artist,
        }
    }

    /// Exact lookup on the normalized title; the shortest file name wins on duplicates.
    pub fn find_by_title(&self, title: &str) -> Option<usize> {
        let key = normalize_for_search(title);
        if key.is_empty() {
            return None;
        }
        let view = &self.by_title;
        let start = view.partition_point(|&i| self.entries[i].song_normalized < key);
        view.get(start)
            .copied()
            .filter(|&i| self.entries[i].song_normalized == key)
    }

    /// Exact lookup on the normalized `(artist, title)` pair.
    pub fn find_by_artist_title(&self, artist: &str, title: &str) -> Option<usize> {
        let artist = normalize_for_search(artist);
        let title = normalize_for_search(title);
        if title.is_empty() {
            return None;
        }
        let key = (artist.as_str(), title.as_str());
        let view = &self.by_artist_title;
        let start = view.partition_point(|&i| {
            let e = &self.entries[i];
            (e.artist_normalized.as_str(), e.song_normalized.as_str()) < key
        });
        view.get(start).copied().filter(|&i| {
            let e = &self.entries[i];
            e.artist_normalized == key.0 && e.song_normalized == key.1
        })
    }

    pub fn find_by_path(&self, path: &Path) -> Option<usize> {
        self.entries.iter().position(|e| e.file_path == path)
    }

    fn rank(&self, query: &Query, index: usize) -> Ranked {
        let e = &self.entries[index];
        let score = query
            .score(&e.song_normalized, &e.token_normalized)
            .max(query.score(&e.full_normalized, &e.token_normalized));
        Ranked {
            index,
            score,
            len: e.song_name.chars().count(),
        }
    }

    /// Title lookup: binary search first, then a scored linear scan.
    pub fn search(&self, query: &str, settings: &SearchSettings) -> Option<usize> {
        if let Some(i) = self.find_by_title(query) {
            return Some(i);
        }
        let q = Query::new(query, settings.levenshtein_threshold);
        if q.is_empty() {
            return None;
        }
        best((0..self.entries.len()).map(|i| self.rank(&q, i)))
            .filter(|r| r.score >= settings.min_fuzzy_score)
            .map(|r| r.index)
    }

    /// Up to `limit` fuzzy candidates, best first.
    pub fn search_ranked(&self, query: &str, limit: usize, settings: &SearchSettings) -> Vec<Ranked> {
        let q = Query::new(query, settings.levenshtein_threshold);
        if q.is_empty() {
            return Vec::new();
        }
        top_k(
            (0..self.entries.len())
                .map(|i| self.rank(&q, i))
                .filter(|r| r.score >= settings.min_fuzzy_score),
            limit,
        )
    }

    /// Tracks by one artist, at most `settings.artist_limit`.
    ///
    /// More exact matches than the limit are sampled at random; otherwise the
    /// best-scoring candidates are returned, exact matches first.
    pub fn find_by_artist<R: Rng + ?Sized>(
        &self,
        artist: &str,
        settings: &SearchSettings,
        rng: &mut R,
    ) -> Vec<usize> {
        let limit = settings.artist_limit;
        let key = normalize_for_search(artist);
        if key.is_empty() || limit == 0 {
            return Vec::new();
        }

        let view = &self.by_artist;
        let start = view.partition_point(|&i| self.entries[i].artist_normalized < key);
        let end = view.partition_point(|&i| self.entries[i].artist_normalized <= key);
        let exact = &view[start..end];
        if exact.len() > limit {
            return exact.choose_multiple(rng, limit).copied().collect();
        }

        let q = Query::new(artist, settings.levenshtein_threshold);
        let scored = view.iter().map(|&i| {
            let e = &self.entries[i];
            Ranked {
                index: i,
                score: q.score(&e.artist_normalized, &e.token_normalized),
                len: e.song_name.chars().count(),
            }
        });
        top_k(
            scored.filter(|r| {
                r.score >= settings.min_fuzzy_score || self.entries[r.index].artist_normalized == key
            }),
            limit,
        )
        .into_iter()
        .map(|r| r.index)
        .collect()
    }
}
