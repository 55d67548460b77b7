//! Heuristic match scoring.
//!
//! Scores are additive with weights ordered containment > prefix >
//! subsequence > token order > byte overlap > length difference. A bounded
//! edit distance adds a small bonus on top. Exact equality earns every signal
//! at its maximum plus [`WEIGHT_EXACT`], which no other candidate can reach.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::normalize::{normalize_for_search, normalize_for_token, tokens};

pub const WEIGHT_EXACT: i32 = 1000;
pub const WEIGHT_CONTAINS: i32 = 600;
pub const WEIGHT_CONTAINED_IN_QUERY: i32 = 300;
pub const WEIGHT_PREFIX: i32 = 400;
pub const WEIGHT_SUBSEQUENCE: i32 = 250;
pub const WEIGHT_TOKEN_ORDER: i32 = 150;
/// Byte-histogram overlap contributes 0..=100.
pub const WEIGHT_OVERLAP_MAX: i32 = 100;
const LENGTH_BONUS_MAX: i32 = 10;
const LENGTH_PENALTY_MAX: i32 = 20;
const LEVENSHTEIN_STEP: i32 = 5;
/// Strings longer than this (in chars) skip the edit-distance bonus.
const LEVENSHTEIN_MAX_CHARS: usize = 64;

/// A prepared query: both normalized forms computed once per lookup.
#[derive(Debug, Clone)]
pub struct Query {
    pub normalized: String,
    pub token: String,
    pub levenshtein_threshold: usize,
}

impl Query {
    pub fn new(raw: &str, levenshtein_threshold: usize) -> Self {
        Self {
            normalized: normalize_for_search(raw),
            token: normalize_for_token(raw),
            levenshtein_threshold,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    /// Score a candidate given its search-normalized and token-normalized forms.
    pub fn score(&self, candidate: &str, candidate_tokens: &str) -> i32 {
        let q = self.normalized.as_str();
        if q.is_empty() || candidate.is_empty() {
            return 0;
        }

        let mut score = 0;
        if candidate == q {
            score += WEIGHT_EXACT;
        }
        if candidate.contains(q) {
            score += WEIGHT_CONTAINS;
        } else if candidate.chars().count() >= 2 && q.contains(candidate) {
            score += WEIGHT_CONTAINED_IN_QUERY;
        }
        if candidate.starts_with(q) {
            score += WEIGHT_PREFIX;
        }
        if is_subsequence(q, candidate) {
            score += WEIGHT_SUBSEQUENCE;
        }
        if tokens_in_order(&self.token, candidate_tokens) {
            score += WEIGHT_TOKEN_ORDER;
        }
        score += byte_overlap_percent(q, candidate);

        let q_len = q.chars().count();
        let c_len = candidate.chars().count();
        let diff = q_len.abs_diff(c_len) as i32;
        score += (LENGTH_BONUS_MAX - diff).max(-LENGTH_PENALTY_MAX);

        if q_len <= LEVENSHTEIN_MAX_CHARS && c_len <= LEVENSHTEIN_MAX_CHARS {
            if let Some(d) = bounded_levenshtein(q, candidate, self.levenshtein_threshold) {
                score += (self.levenshtein_threshold + 1 - d) as i32 * LEVENSHTEIN_STEP;
            }
        }
        score
    }
}

/// True when every char of `needle` appears in `hay` in order.
pub fn is_subsequence(needle: &str, hay: &str) -> bool {
    let mut hay_chars = hay.chars();
    needle.chars().all(|n| hay_chars.any(|h| h == n))
}

/// True when each query token occurs in `candidate_tokens`, each one after
/// the end of the previous match.
pub fn tokens_in_order(query_tokens: &str, candidate_tokens: &str) -> bool {
    let mut rest = candidate_tokens;
    let mut any = false;
    for t in tokens(query_tokens) {
        any = true;
        match rest.find(t) {
            Some(pos) => rest = &rest[pos + t.len()..],
            None => return false,
        }
    }
    any
}

/// Shared byte multiset size over the longer length, scaled to 0..=100.
pub fn byte_overlap_percent(a: &str, b: &str) -> i32 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0;
    }
    let mut hist = [0i32; 256];
    for &byte in a.as_bytes() {
        hist[byte as usize] += 1;
    }
    let mut shared = 0usize;
    for &byte in b.as_bytes() {
        let slot = &mut hist[byte as usize];
        if *slot > 0 {
            *slot -= 1;
            shared += 1;
        }
    }
    (shared * WEIGHT_OVERLAP_MAX as usize / longest) as i32
}

/// Levenshtein distance over chars, or `None` once it must exceed `max`.
pub fn bounded_levenshtein(a: &str, b: &str, max: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max {
        return None;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        let mut row_min = cur[0];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
            row_min = row_min.min(cur[j + 1]);
        }
        if row_min > max {
            return None;
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    let d = prev[b.len()];
    (d <= max).then_some(d)
}

/// A scored candidate. Greater is better: higher score, then shorter name,
/// then lower index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranked {
    pub index: usize,
    pub score: i32,
    pub len: usize,
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.len.cmp(&self.len))
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Keep the best `k` candidates with a bounded min-heap; best first.
pub fn top_k(candidates: impl IntoIterator<Item = Ranked>, k: usize) -> Vec<Ranked> {
    if k == 0 {
        return Vec::new();
    }
    let mut heap: BinaryHeap<Reverse<Ranked>> = BinaryHeap::with_capacity(k + 1);
    for c in candidates {
        heap.push(Reverse(c));
        if heap.len() > k {
            heap.pop();
        }
    }
    // Ascending order of Reverse is descending order of Ranked.
    heap.into_sorted_vec().into_iter().map(|Reverse(r)| r).collect()
}

/// The single best candidate.
pub fn best(candidates: impl IntoIterator<Item = Ranked>) -> Option<Ranked> {
    candidates.into_iter().max()
}
