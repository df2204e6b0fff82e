//! Score, leaderboard, and achievement models for database storage.

use super::{bucket_key, from_millis, parse_difficulty, parse_game_type, to_millis};
use crate::error::{Error, Result};
use chengyu_core::{PlayerId, ScoreRecord, SessionId};
use chengyu_engine::{Achievement, AchievementType, LeaderboardEntry};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored score record, one per finished game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 4, version = 1)]
#[native_db]
pub struct StoredScore {
    /// Primary key - the session that produced the record.
    #[primary_key]
    pub id: u64,
    #[secondary_key]
    pub player: u64,
    /// `"{game_type}:{difficulty}"`, the leaderboard bucket.
    #[secondary_key]
    pub bucket: String,
    pub game_type: String,
    pub difficulty: String,
    pub target_text: String,
    pub submitted_text: String,
    pub score: u32,
    pub time_taken_secs: u32,
    pub hints_used: u8,
    pub accuracy: f64,
    pub completed: bool,
    /// Unix milliseconds.
    pub recorded_at: i64,
}

impl StoredScore {
    pub fn from_record(record: &ScoreRecord) -> Self {
        Self {
            id: record.session.raw(),
            player: record.player.raw(),
            bucket: bucket_key(record.game_type, record.difficulty),
            game_type: record.game_type.as_str().to_string(),
            difficulty: record.difficulty.as_str().to_string(),
            target_text: record.target_text.clone(),
            submitted_text: record.submitted_text.clone(),
            score: record.score,
            time_taken_secs: record.time_taken_secs,
            hints_used: record.hints_used,
            accuracy: record.accuracy,
            completed: record.completed,
            recorded_at: to_millis(record.recorded_at),
        }
    }

    pub fn to_record(&self) -> Result<ScoreRecord> {
        Ok(ScoreRecord {
            session: SessionId::new(self.id),
            player: PlayerId::new(self.player),
            game_type: parse_game_type(&self.game_type)?,
            difficulty: parse_difficulty(&self.difficulty)?,
            target_text: self.target_text.clone(),
            submitted_text: self.submitted_text.clone(),
            score: self.score,
            time_taken_secs: self.time_taken_secs,
            hints_used: self.hints_used,
            accuracy: self.accuracy,
            completed: self.completed,
            recorded_at: from_millis(self.recorded_at)?,
        })
    }
}

/// Stored leaderboard row, replaced wholesale on each bucket recompute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 5, version = 1)]
#[native_db]
pub struct StoredLeaderboardEntry {
    /// Primary key - `"{game_type}:{difficulty}:p{player}"`.
    #[primary_key]
    pub id: String,
    /// `"{game_type}:{difficulty}"`, the scan prefix for one bucket.
    #[secondary_key]
    pub bucket: String,
    pub player: u64,
    pub game_type: String,
    pub difficulty: String,
    pub rank: u32,
    pub total_score: u64,
    pub average_score: f64,
    pub games_played: u32,
    pub accuracy: f64,
    /// Unix milliseconds.
    pub last_updated: i64,
}

impl StoredLeaderboardEntry {
    pub fn row_key(
        player: PlayerId,
        game_type: chengyu_core::GameType,
        difficulty: chengyu_core::Difficulty,
    ) -> String {
        format!("{}:p{}", bucket_key(game_type, difficulty), player.raw())
    }

    pub fn from_entry(entry: &LeaderboardEntry) -> Self {
        Self {
            id: Self::row_key(entry.player, entry.game_type, entry.difficulty),
            bucket: bucket_key(entry.game_type, entry.difficulty),
            player: entry.player.raw(),
            game_type: entry.game_type.as_str().to_string(),
            difficulty: entry.difficulty.as_str().to_string(),
            rank: entry.rank,
            total_score: entry.total_score,
            average_score: entry.average_score,
            games_played: entry.games_played,
            accuracy: entry.accuracy,
            last_updated: to_millis(entry.last_updated),
        }
    }

    pub fn to_entry(&self) -> Result<LeaderboardEntry> {
        Ok(LeaderboardEntry {
            player: PlayerId::new(self.player),
            game_type: parse_game_type(&self.game_type)?,
            difficulty: parse_difficulty(&self.difficulty)?,
            rank: self.rank,
            total_score: self.total_score,
            average_score: self.average_score,
            games_played: self.games_played,
            accuracy: self.accuracy,
            last_updated: from_millis(self.last_updated)?,
        })
    }
}

/// Stored achievement unlock, at most one per `(player, kind)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 6, version = 1)]
#[native_db]
pub struct StoredAchievement {
    /// Primary key - `"p{player}:{kind}"`.
    #[primary_key]
    pub id: String,
    #[secondary_key]
    pub player: u64,
    pub kind: String,
    pub title: String,
    pub description: String,
    /// Unix milliseconds.
    pub unlocked_at: i64,
    pub metadata: Option<String>,
}

impl StoredAchievement {
    pub fn row_key(player: PlayerId, kind: AchievementType) -> String {
        format!("p{}:{}", player.raw(), kind.as_str())
    }

    pub fn from_achievement(achievement: &Achievement) -> Self {
        Self {
            id: Self::row_key(achievement.player, achievement.kind),
            player: achievement.player.raw(),
            kind: achievement.kind.as_str().to_string(),
            title: achievement.title.clone(),
            description: achievement.description.clone(),
            unlocked_at: to_millis(achievement.unlocked_at),
            metadata: achievement.metadata.clone(),
        }
    }

    pub fn to_achievement(&self) -> Result<Achievement> {
        Ok(Achievement {
            player: PlayerId::new(self.player),
            kind: AchievementType::parse(&self.kind)
                .map_err(|e| Error::Serialization(e.to_string()))?,
            title: self.title.clone(),
            description: self.description.clone(),
            unlocked_at: from_millis(self.unlocked_at)?,
            metadata: self.metadata.clone(),
        })
    }
}
