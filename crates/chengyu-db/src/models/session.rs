//! Session models for database storage.

use super::{from_millis, parse_difficulty, parse_game_type, to_millis};
use crate::error::{Error, Result};
use chengyu_core::{
    GameSession, HintUsageEntry, PlayerId, SessionId, SessionStatus, TargetId, TokenLayout,
};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored game session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredSession {
    /// Primary key - session ID.
    #[primary_key]
    pub id: u64,
    /// Owning player.
    #[secondary_key]
    pub player: u64,
    pub game_type: String,
    pub difficulty: String,
    /// Lifecycle status, see `status_code`.
    pub status: u8,
    pub target_id: String,
    pub target_text: String,
    pub tokens: Vec<String>,
    pub scrambled: Vec<String>,
    /// Unix milliseconds.
    pub started_at: i64,
    pub completed_at: Option<i64>,
    pub hints_used: u8,
    pub score: Option<u32>,
}

fn status_code(status: SessionStatus) -> u8 {
    match status {
        SessionStatus::Active => 0,
        SessionStatus::Completed => 1,
        SessionStatus::Abandoned => 2,
        SessionStatus::Expired => 3,
    }
}

fn status_from_code(code: u8) -> Result<SessionStatus> {
    match code {
        0 => Ok(SessionStatus::Active),
        1 => Ok(SessionStatus::Completed),
        2 => Ok(SessionStatus::Abandoned),
        3 => Ok(SessionStatus::Expired),
        other => Err(Error::Serialization(format!(
            "unknown session status code: {other}"
        ))),
    }
}

impl StoredSession {
    /// Create from a game session.
    pub fn from_session(session: &GameSession) -> Self {
        Self {
            id: session.id.raw(),
            player: session.player.raw(),
            game_type: session.game_type.as_str().to_string(),
            difficulty: session.difficulty.as_str().to_string(),
            status: status_code(session.status),
            target_id: session.target_id.as_str().to_string(),
            target_text: session.target_text.clone(),
            tokens: session.layout.tokens.clone(),
            scrambled: session.layout.scrambled.clone(),
            started_at: to_millis(session.started_at),
            completed_at: session.completed_at.map(to_millis),
            hints_used: session.hints_used,
            score: session.score,
        }
    }

    /// Convert back to a game session.
    pub fn to_session(&self) -> Result<GameSession> {
        Ok(GameSession {
            id: SessionId::new(self.id),
            player: PlayerId::new(self.player),
            game_type: parse_game_type(&self.game_type)?,
            difficulty: parse_difficulty(&self.difficulty)?,
            status: status_from_code(self.status)?,
            target_id: TargetId::new(self.target_id.clone()),
            target_text: self.target_text.clone(),
            layout: TokenLayout {
                tokens: self.tokens.clone(),
                scrambled: self.scrambled.clone(),
            },
            started_at: from_millis(self.started_at)?,
            completed_at: self.completed_at.map(from_millis).transpose()?,
            hints_used: self.hints_used,
            score: self.score,
        })
    }
}

/// Stored hint usage row, one per issued hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 2, version = 1)]
#[native_db]
pub struct StoredHintUsage {
    /// Primary key - `"s{session}:{level}"`, one row per issued level.
    #[primary_key]
    pub id: String,
    #[secondary_key]
    pub session: u64,
    pub level: u8,
    pub penalty: u32,
    /// Unix milliseconds.
    pub used_at: i64,
}

impl StoredHintUsage {
    pub fn from_entry(entry: &HintUsageEntry) -> Self {
        Self {
            id: format!("s{}:{}", entry.session.raw(), entry.level),
            session: entry.session.raw(),
            level: entry.level,
            penalty: entry.penalty,
            used_at: to_millis(entry.used_at),
        }
    }

    pub fn to_entry(&self) -> Result<HintUsageEntry> {
        Ok(HintUsageEntry {
            session: SessionId::new(self.session),
            level: self.level,
            penalty: self.penalty,
            used_at: from_millis(self.used_at)?,
        })
    }
}

/// Stored no-repeat history row, one per question a player has been served.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 3, version = 1)]
#[native_db]
pub struct StoredSeenTarget {
    /// Primary key - `"p{player}:{game_type}:{target}"`.
    #[primary_key]
    pub id: String,
    /// `"p{player}:{game_type}"`, the scan prefix for one history set.
    #[secondary_key]
    pub owner: String,
    pub target_id: String,
}

impl StoredSeenTarget {
    pub fn owner_key(player: PlayerId, game_type: chengyu_core::GameType) -> String {
        format!("p{}:{}", player.raw(), game_type.as_str())
    }

    pub fn new(player: PlayerId, game_type: chengyu_core::GameType, target: &TargetId) -> Self {
        let owner = Self::owner_key(player, game_type);
        Self {
            id: format!("{owner}:{}", target.as_str()),
            owner,
            target_id: target.as_str().to_string(),
        }
    }
}
