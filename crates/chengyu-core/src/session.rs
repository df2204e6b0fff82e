//! Game session state machine and completion records
//!
//! A session is `Active` from creation until exactly one terminal
//! transition: `Completed` (scored submit), `Abandoned` (player restart),
//! or `Expired` (idle sweep). Terminal sessions are never mutated again.

use crate::error::{Error, Result};
use crate::identity::{PlayerId, SessionId, TargetId};
use crate::scramble::TokenLayout;
use crate::types::{Difficulty, GameType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum hints per session
pub const MAX_HINTS: u8 = 3;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// In play; the only state that accepts submits and hints
    Active,
    /// Finished with a scored submission
    Completed,
    /// Discarded by an explicit restart
    Abandoned,
    /// Closed by the idle sweep
    Expired,
}

impl SessionStatus {
    /// Whether this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

/// A single play-through of one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: SessionId,
    pub player: PlayerId,
    pub game_type: GameType,
    pub difficulty: Difficulty,
    pub status: SessionStatus,
    pub target_id: TargetId,
    /// The answer in target order, as text
    pub target_text: String,
    pub layout: TokenLayout,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Hint levels consumed so far, `0..=3`
    pub hints_used: u8,
    /// Final score, set on completion
    pub score: Option<u32>,
}

impl GameSession {
    /// Create a fresh active session
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: SessionId,
        player: PlayerId,
        game_type: GameType,
        difficulty: Difficulty,
        target_id: TargetId,
        target_text: String,
        layout: TokenLayout,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            player,
            game_type,
            difficulty,
            status: SessionStatus::Active,
            target_id,
            target_text,
            layout,
            started_at,
            completed_at: None,
            hints_used: 0,
            score: None,
        }
    }

    /// Whether the session still accepts play actions
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Record one more consumed hint level
    pub fn use_hint(&mut self) -> Result<u8> {
        self.ensure_active()?;
        if self.hints_used >= MAX_HINTS {
            return Err(Error::Exhausted(format!(
                "{} has no hint levels left",
                self.id
            )));
        }
        self.hints_used += 1;
        Ok(self.hints_used)
    }

    /// Transition to `Completed` with a final score
    pub fn complete(&mut self, at: DateTime<Utc>, score: u32) -> Result<()> {
        self.ensure_active()?;
        self.status = SessionStatus::Completed;
        self.completed_at = Some(at);
        self.score = Some(score);
        Ok(())
    }

    /// Transition to `Abandoned`
    pub fn abandon(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.ensure_active()?;
        self.status = SessionStatus::Abandoned;
        self.completed_at = Some(at);
        Ok(())
    }

    /// Transition to `Expired`
    pub fn expire(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.ensure_active()?;
        self.status = SessionStatus::Expired;
        self.completed_at = Some(at);
        Ok(())
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "{} is not active ({:?})",
                self.id, self.status
            )))
        }
    }
}

/// Immutable record of a completed game, written once at submit time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub session: SessionId,
    pub player: PlayerId,
    pub game_type: GameType,
    pub difficulty: Difficulty,
    pub target_text: String,
    pub submitted_text: String,
    pub score: u32,
    pub time_taken_secs: u32,
    pub hints_used: u8,
    /// `0.0..=1.0`
    pub accuracy: f64,
    pub completed: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only log row for one hint request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintUsageEntry {
    pub session: SessionId,
    /// `1..=3`
    pub level: u8,
    pub penalty: u32,
    pub used_at: DateTime<Utc>,
}
