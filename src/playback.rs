//! Playback state: play modes, playlists, story navigation and the persisted
//! resume point.
//!
//! Nothing here touches the streaming pipeline. The player facade decides what
//! to play with these helpers and hands the result to a session.

mod mode;
mod playlist;
mod resume;
mod store;
mod story;

pub use mode::PlayMode;
pub use playlist::{PlaylistState, PlaylistTracks};
pub use resume::{OFFSET_GRANULARITY, ResumePoint, StartAt, round_down_offset};
pub use store::{MusicResume, PlaybackStore, StoryResume};
pub use story::{StoryCursor, next_chapter_in_story, next_story_in_category};
