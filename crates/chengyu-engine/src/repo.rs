//! Repository traits
//!
//! Storage is injected into the engine components through these traits
//! (constructor injection, no global persistence layer). The `chengyu-db`
//! crate provides the durable implementation; [`crate::MemoryStore`] backs
//! tests and embedded deployments.

use crate::achievements::Achievement;
use crate::error::Result;
use crate::ranking::LeaderboardEntry;
use chengyu_core::{
    Difficulty, GameSession, GameType, HintUsageEntry, PlayerId, ScoreRecord, SessionId,
    SessionStatus, TargetId,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// Terminal update applied to an active session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionCompletion {
    /// Target status; must be terminal
    pub status: SessionStatus,
    pub at: DateTime<Utc>,
    /// Final score, for `Completed` only
    pub score: Option<u32>,
    /// Guard for scored completions: fail with `InvalidState` unless the
    /// stored hint counter still matches, so a hint granted after the score
    /// was computed forces a re-read instead of silently landing a score
    /// that skipped its penalty
    pub expected_hints: Option<u8>,
}

/// Session storage
///
/// `insert_active`, `finish`, and `record_hint` are conditional updates
/// against the stored state: they fail with `InvalidState` unless the
/// check holds at write time (no other active session for the player, the
/// session still `Active`, the hint counter at the expected level). That
/// compare-and-set is the enforcement point for the one-active-session
/// invariant under concurrent starts and submits.
pub trait SessionRepository: Send + Sync {
    /// Atomically insert a fresh active session, failing with
    /// `InvalidState` if the player already has one
    fn insert_active(&self, session: &GameSession) -> Result<()>;

    fn get(&self, id: SessionId) -> Result<Option<GameSession>>;

    /// The player's single active session, if any
    fn find_active_by_player(&self, player: PlayerId) -> Result<Option<GameSession>>;

    /// Every active session, for the expiry sweep
    fn active_sessions(&self) -> Result<Vec<GameSession>>;

    /// Atomically transition an active session to a terminal status,
    /// returning the finished session
    fn finish(&self, id: SessionId, completion: SessionCompletion) -> Result<GameSession>;

    /// Atomically bump the hint counter to `level` (which must be the
    /// current counter plus one) on an active session
    fn record_hint(&self, id: SessionId, level: u8) -> Result<()>;
}

/// Score record storage; records are append-only
pub trait ScoreRepository: Send + Sync {
    fn insert(&self, record: &ScoreRecord) -> Result<()>;

    /// All of one player's records, across buckets
    fn by_player(&self, player: PlayerId) -> Result<Vec<ScoreRecord>>;

    /// All records in one `(game_type, difficulty)` bucket
    fn by_bucket(&self, game_type: GameType, difficulty: Difficulty) -> Result<Vec<ScoreRecord>>;
}

/// Leaderboard storage; buckets are replaced wholesale, never patched
pub trait LeaderboardRepository: Send + Sync {
    /// Replace every entry for a bucket with `entries`
    fn replace_bucket(
        &self,
        game_type: GameType,
        difficulty: Difficulty,
        entries: Vec<LeaderboardEntry>,
    ) -> Result<()>;

    /// A bucket's entries ordered by rank
    fn bucket(&self, game_type: GameType, difficulty: Difficulty)
        -> Result<Vec<LeaderboardEntry>>;

    /// One player's entry in one bucket
    fn entry(
        &self,
        player: PlayerId,
        game_type: GameType,
        difficulty: Difficulty,
    ) -> Result<Option<LeaderboardEntry>>;
}

/// Achievement storage
pub trait AchievementRepository: Send + Sync {
    /// Check-then-insert on `(player, achievement type)`.
    /// Returns `true` if a new row was created, `false` if already unlocked.
    fn unlock(&self, achievement: &Achievement) -> Result<bool>;

    fn by_player(&self, player: PlayerId) -> Result<Vec<Achievement>>;
}

/// Append-only hint usage log
pub trait HintLogRepository: Send + Sync {
    fn append(&self, entry: &HintUsageEntry) -> Result<()>;

    fn by_session(&self, session: SessionId) -> Result<Vec<HintUsageEntry>>;
}

/// No-repeat exclusion history, per player and game type
pub trait HistoryRepository: Send + Sync {
    fn seen(&self, player: PlayerId, game_type: GameType) -> Result<HashSet<TargetId>>;

    fn mark_seen(&self, player: PlayerId, game_type: GameType, target: &TargetId) -> Result<()>;

    /// Forget everything the player has seen for one game type
    fn clear(&self, player: PlayerId, game_type: GameType) -> Result<()>;
}

/// The full set of repositories the engine needs
#[derive(Clone)]
pub struct Repos {
    pub sessions: Arc<dyn SessionRepository>,
    pub scores: Arc<dyn ScoreRepository>,
    pub boards: Arc<dyn LeaderboardRepository>,
    pub achievements: Arc<dyn AchievementRepository>,
    pub hint_log: Arc<dyn HintLogRepository>,
    pub history: Arc<dyn HistoryRepository>,
}

impl Repos {
    /// Wire every repository to one backing store
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: SessionRepository
            + ScoreRepository
            + LeaderboardRepository
            + AchievementRepository
            + HintLogRepository
            + HistoryRepository
            + 'static,
    {
        Self {
            sessions: store.clone(),
            scores: store.clone(),
            boards: store.clone(),
            achievements: store.clone(),
            hint_log: store.clone(),
            history: store,
        }
    }
}
