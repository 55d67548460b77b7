//! Story index: categories, stories and chapter lists.

use crate::config::SearchSettings;
use crate::search::{Query, Ranked, best, normalize_for_search};

use super::model::{StoryCategory, StoryEntry};

#[derive(Debug, Default)]
pub struct StoryIndex {
    generation: u64,
    stories: Vec<StoryEntry>,
    categories: Vec<StoryCategory>,
    /// Story positions sorted by normalized story name.
    by_name: Vec<usize>,
}

impl StoryIndex {
    /// `stories` must arrive grouped by category, as the scanner yields them.
    pub fn build(mut stories: Vec<StoryEntry>, generation: u64) -> Self {
        let mut categories: Vec<StoryCategory> = Vec::new();
        for (i, story) in stories.iter_mut().enumerate() {
            let same = categories
                .last()
                .map(|c| c.name == story.category)
                .unwrap_or(false);
            if !same {
                categories.push(StoryCategory {
                    name: story.category.clone(),
                    normalized: story.category_normalized.clone(),
                    stories: Vec::new(),
                });
            }
            let ci = categories.len() - 1;
            story.category_index = ci;
            categories[ci].stories.push(i);
        }

        let mut by_name: Vec<usize> = (0..stories.len()).collect();
        by_name.sort_by(|&a, &b| {
            stories[a]
                .story_normalized
                .cmp(&stories[b].story_normalized)
                .then_with(|| a.cmp(&b))
        });

        Self {
            generation,
            stories,
            categories,
            by_name,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    pub fn get(&self, story: usize) -> Option<&StoryEntry> {
        self.stories.get(story)
    }

    pub fn stories(&self) -> &[StoryEntry] {
        &self.stories
    }

    pub fn categories(&self) -> &[StoryCategory] {
        &self.categories
    }

    pub fn category(&self, category: usize) -> Option<&StoryCategory> {
        self.categories.get(category)
    }

    /// Position of `story` within its category's story list.
    pub fn position_in_category(&self, story: usize) -> Option<usize> {
        let entry = self.stories.get(story)?;
        self.categories
            .get(entry.category_index)?
            .stories
            .iter()
            .position(|&s| s == story)
    }

    /// Look a story up by its exact (raw) category and story names.
    pub fn locate(&self, category: &str, story_name: &str) -> Option<usize> {
        self.stories
            .iter()
            .position(|s| s.category == category && s.story_name == story_name)
    }

    pub fn find_category(&self, query: &str, settings: &SearchSettings) -> Option<usize> {
        let key = normalize_for_search(query);
        if key.is_empty() {
            return None;
        }
        if let Some(i) = self.categories.iter().position(|c| c.normalized == key) {
            return Some(i);
        }
        let q = Query::new(query, settings.levenshtein_threshold);
        best(self.categories.iter().enumerate().map(|(i, c)| Ranked {
            index: i,
            score: q.score(&c.normalized, &c.normalized),
            len: c.name.chars().count(),
        }))
        .filter(|r| r.score >= settings.min_fuzzy_score)
        .map(|r| r.index)
    }

    /// Exact story-name lookup by binary search, then a scored scan.
    pub fn find_story(&self, query: &str, settings: &SearchSettings) -> Option<usize> {
        self.find_story_where(query, settings, |_| true)
    }

    /// Like [`find_story`](Self::find_story) restricted to one category.
    pub fn find_story_in_category(
        &self,
        category: usize,
        query: &str,
        settings: &SearchSettings,
    ) -> Option<usize> {
        self.find_story_where(query, settings, |s| s.category_index == category)
    }

    fn find_story_where(
        &self,
        query: &str,
        settings: &SearchSettings,
        keep: impl Fn(&StoryEntry) -> bool,
    ) -> Option<usize> {
        let key = normalize_for_search(query);
        if key.is_empty() {
            return None;
        }

        let start = self
            .by_name
            .partition_point(|&i| self.stories[i].story_normalized < key);
        let exact = self.by_name[start..]
            .iter()
            .take_while(|&&i| self.stories[i].story_normalized == key)
            .copied()
            .find(|&i| keep(&self.stories[i]));
        if exact.is_some() {
            return exact;
        }

        let q = Query::new(query, settings.levenshtein_threshold);
        best(
            self.stories
                .iter()
                .enumerate()
                .filter(|(_, s)| keep(s))
                .map(|(i, s)| Ranked {
                    index: i,
                    score: q.score(&s.story_normalized, &s.token_normalized),
                    len: s.story_name.chars().count(),
                }),
        )
        .filter(|r| r.score >= settings.min_fuzzy_score)
        .map(|r| r.index)
    }
}
