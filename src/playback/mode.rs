use std::fmt;
use std::str::FromStr;

use crate::config::PlayModeSetting;

/// What happens when a track (or chapter) ends on its own.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlayMode {
    /// Stop after the current track.
    Once,
    /// Replay the current track.
    Loop,
    /// Pick a different track at random.
    Random,
    /// Move to the next track, wrapping at the end.
    #[default]
    Order,
}

impl PlayMode {
    /// Stored form; stable across releases.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Once => 0,
            Self::Loop => 1,
            Self::Random => 2,
            Self::Order => 3,
        }
    }

    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::Once),
            1 => Some(Self::Loop),
            2 => Some(Self::Random),
            3 => Some(Self::Order),
            _ => None,
        }
    }
}

impl From<PlayModeSetting> for PlayMode {
    fn from(s: PlayModeSetting) -> Self {
        match s {
            PlayModeSetting::Once => Self::Once,
            PlayModeSetting::Loop => Self::Loop,
            PlayModeSetting::Random => Self::Random,
            PlayModeSetting::Order => Self::Order,
        }
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Once => "once",
            Self::Loop => "loop",
            Self::Random => "random",
            Self::Order => "order",
        })
    }
}

impl FromStr for PlayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "once" | "single" => Ok(Self::Once),
            "loop" | "repeat" => Ok(Self::Loop),
            "random" | "shuffle" => Ok(Self::Random),
            "order" | "sequential" => Ok(Self::Order),
            other => Err(format!("unknown play mode: {other}")),
        }
    }
}
