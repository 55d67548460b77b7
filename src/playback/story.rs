use rand::Rng;
use rand::seq::SliceRandom;

use crate::library::StoryIndex;

use super::mode::PlayMode;

/// A chapter of a story in one index generation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StoryCursor {
    pub story: usize,
    pub chapter: usize,
}

impl StoryCursor {
    pub fn new(story: usize, chapter: usize) -> Self {
        Self { story, chapter }
    }
}

/// The chapter after `at`.
///
/// Past the last chapter, `Loop` goes back to chapter 0 of the same story and
/// every other mode moves on with [`next_story_in_category`].
pub fn next_chapter_in_story<R: Rng + ?Sized>(
    index: &StoryIndex,
    at: StoryCursor,
    mode: PlayMode,
    rng: &mut R,
) -> Option<StoryCursor> {
    let entry = index.get(at.story)?;
    if at.chapter + 1 < entry.chapters.len() {
        return Some(StoryCursor::new(at.story, at.chapter + 1));
    }
    if mode == PlayMode::Loop && !entry.chapters.is_empty() {
        return Some(StoryCursor::new(at.story, 0));
    }
    next_story_in_category(index, at.story, mode, rng).map(|s| StoryCursor::new(s, 0))
}

/// The story to play after `story`.
///
/// `Random` picks another story of the same category; every other mode takes
/// the following one. When the category has nothing left, any story with
/// chapters is picked at random from the whole library.
pub fn next_story_in_category<R: Rng + ?Sized>(
    index: &StoryIndex,
    story: usize,
    mode: PlayMode,
    rng: &mut R,
) -> Option<usize> {
    let entry = index.get(story)?;
    let playable = |s: &usize| index.get(*s).is_some_and(|e| !e.chapters.is_empty());

    if let Some(category) = index.category(entry.category_index) {
        let candidate = if mode == PlayMode::Random {
            let others: Vec<usize> = category
                .stories
                .iter()
                .copied()
                .filter(|&s| s != story)
                .filter(playable)
                .collect();
            others.choose(rng).copied()
        } else {
            index.position_in_category(story).and_then(|pos| {
                category.stories[pos + 1..]
                    .iter()
                    .copied()
                    .find(playable)
            })
        };
        if candidate.is_some() {
            return candidate;
        }
    }

    let anywhere: Vec<usize> = (0..index.len()).filter(playable).collect();
    let others: Vec<usize> = anywhere.iter().copied().filter(|&s| s != story).collect();
    if others.is_empty() {
        anywhere.first().copied()
    } else {
        others.choose(rng).copied()
    }
}
