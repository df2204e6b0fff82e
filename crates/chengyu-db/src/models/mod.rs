//! Database models.

mod progress;
mod session;

pub use progress::*;
pub use session::*;

use crate::error::{Error, Result};
use chengyu_core::{Difficulty, GameType};
use chrono::{DateTime, TimeZone, Utc};

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| Error::Serialization(format!("timestamp out of range: {ms}")))
}

/// Secondary-key text for one `(game_type, difficulty)` leaderboard bucket,
/// e.g. `"idiom:easy"`.
pub(crate) fn bucket_key(game_type: GameType, difficulty: Difficulty) -> String {
    format!("{}:{}", game_type.as_str(), difficulty.as_str())
}

pub(crate) fn parse_game_type(s: &str) -> Result<GameType> {
    GameType::parse(s).map_err(|e| Error::Serialization(e.to_string()))
}

pub(crate) fn parse_difficulty(s: &str) -> Result<Difficulty> {
    Difficulty::parse(s).map_err(|e| Error::Serialization(e.to_string()))
}
