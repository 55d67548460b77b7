//! Title/artist extraction from file names.

use std::path::Path;

use super::normalize::{normalize_for_search, normalize_for_token};

/// Title and artist parsed from a file name, raw and normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongMeta {
    pub title: String,
    pub artist: String,
    pub title_normalized: String,
    pub artist_normalized: String,
    /// Token form of `"<artist> <title>"`.
    pub token_normalized: String,
}

/// Parse `"<artist>-<title>.<ext>"` style names.
///
/// The split only happens when the part before the first `-` contains a
/// letter or a non-ASCII character and the part after it is non-empty, so
/// `"01-Intro.mp3"` stays a single title. A trailing bracketed annotation
/// such as `(Live)` or `[320k]` is stripped from both parts.
pub fn parse_song_meta(file_name: &str) -> SongMeta {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);

    let (artist, title) = match stem.split_once('-') {
        Some((left, right))
            if left.chars().any(|c| c.is_alphabetic() || !c.is_ascii())
                && !right.trim().is_empty() =>
        {
            (strip_annotation(left), strip_annotation(right))
        }
        _ => (String::new(), strip_annotation(stem)),
    };

    let title = if title.is_empty() {
        stem.trim().to_string()
    } else {
        title
    };

    let token_source = if artist.is_empty() {
        title.clone()
    } else {
        format!("{artist} {title}")
    };

    SongMeta {
        title_normalized: normalize_for_search(&title),
        artist_normalized: normalize_for_search(&artist),
        token_normalized: normalize_for_token(&token_source),
        title,
        artist,
    }
}

/// Remove trailing bracket annotations (`(...)`, `[...]`, `（...）`, `【...】`)
/// and surrounding whitespace.
pub fn strip_annotation(s: &str) -> String {
    const PAIRS: [(char, char); 4] = [('(', ')'), ('[', ']'), ('（', '）'), ('【', '】')];

    let mut cur = s.trim();
    loop {
        let mut stripped = false;
        for (open, close) in PAIRS {
            if cur.ends_with(close) {
                if let Some(pos) = cur.rfind(open) {
                    // Keep the text when the whole name is one bracketed group.
                    if pos > 0 {
                        cur = cur[..pos].trim_end();
                        stripped = true;
                        break;
                    }
                }
            }
        }
        if !stripped {
            break;
        }
    }
    cur.to_string()
}
