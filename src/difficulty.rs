//! Difficulty presets. Each level is an immutable bundle of goal score,
//! session length and spawn cadence, selected before a session starts.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Named difficulty level (matches the `data-difficulty` attribute on the page).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Level {
    #[default]
    Easy,
    Normal,
    Hard,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Easy, Level::Normal, Level::Hard];

    pub fn id(self) -> &'static str {
        match self {
            Level::Easy => "easy",
            Level::Normal => "normal",
            Level::Hard => "hard",
        }
    }

    pub fn profile(self) -> &'static DifficultyProfile {
        match self {
            Level::Easy => &EASY,
            Level::Normal => &NORMAL,
            Level::Hard => &HARD,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown difficulty level: {0:?}")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Level::Easy),
            "normal" => Ok(Level::Normal),
            "hard" => Ok(Level::Hard),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Immutable per-level tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DifficultyProfile {
    pub level: Level,
    pub label: &'static str,
    pub target_score: u32,     // drops needed to win
    pub duration_seconds: u32, // session length
    pub spawn_interval_ms: u32,
}

pub static EASY: DifficultyProfile = DifficultyProfile {
    level: Level::Easy,
    label: "Easy",
    target_score: 8,
    duration_seconds: 30,
    spawn_interval_ms: 900,
};

pub static NORMAL: DifficultyProfile = DifficultyProfile {
    level: Level::Normal,
    label: "Normal",
    target_score: 12,
    duration_seconds: 25,
    spawn_interval_ms: 700,
};

pub static HARD: DifficultyProfile = DifficultyProfile {
    level: Level::Hard,
    label: "Hard",
    target_score: 18,
    duration_seconds: 20,
    spawn_interval_ms: 550,
};
