//! Normalization and fuzzy matching of song and story names.
//!
//! Everything here is pure: the media index feeds entries in, and callers
//! get ranked indices back.

mod meta;
mod normalize;
mod score;

pub use meta::{SongMeta, parse_song_meta, strip_annotation};
pub use normalize::{normalize_for_search, normalize_for_token, tokens};
pub use score::{
    Query, Ranked, best, bounded_levenshtein, byte_overlap_percent, is_subsequence,
    tokens_in_order, top_k,
};
