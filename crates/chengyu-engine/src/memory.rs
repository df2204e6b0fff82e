//! In-memory repository implementation
//!
//! Backs the engine's tests and small embedded deployments. Everything
//! lives under one mutex, so the conditional session updates (`finish`,
//! `record_hint`) are atomic by construction.

use crate::achievements::Achievement;
use crate::error::Result;
use crate::ranking::LeaderboardEntry;
use crate::repo::{
    AchievementRepository, HintLogRepository, HistoryRepository, LeaderboardRepository,
    ScoreRepository, SessionCompletion, SessionRepository,
};
use chengyu_core::{
    Difficulty, Error as CoreError, GameSession, GameType, HintUsageEntry, PlayerId, ScoreRecord,
    SessionId, SessionStatus, TargetId,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    sessions: HashMap<SessionId, GameSession>,
    scores: Vec<ScoreRecord>,
    boards: HashMap<(GameType, Difficulty), Vec<LeaderboardEntry>>,
    achievements: HashMap<(PlayerId, &'static str), Achievement>,
    hints: Vec<HintUsageEntry>,
    seen: HashMap<(PlayerId, GameType), HashSet<TargetId>>,
}

/// Mutex-guarded in-memory store implementing every repository trait
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionRepository for MemoryStore {
    fn insert_active(&self, session: &GameSession) -> Result<()> {
        let mut inner = self.lock();
        if let Some(existing) = inner
            .sessions
            .values()
            .find(|s| s.player == session.player && s.is_active())
        {
            return Err(CoreError::InvalidState(format!(
                "{} already has an active session ({})",
                session.player, existing.id
            ))
            .into());
        }
        inner.sessions.insert(session.id, session.clone());
        Ok(())
    }

    fn get(&self, id: SessionId) -> Result<Option<GameSession>> {
        Ok(self.lock().sessions.get(&id).cloned())
    }

    fn find_active_by_player(&self, player: PlayerId) -> Result<Option<GameSession>> {
        Ok(self
            .lock()
            .sessions
            .values()
            .find(|s| s.player == player && s.is_active())
            .cloned())
    }

    fn active_sessions(&self) -> Result<Vec<GameSession>> {
        Ok(self
            .lock()
            .sessions
            .values()
            .filter(|s| s.is_active())
            .cloned()
            .collect())
    }

    fn finish(&self, id: SessionId, completion: SessionCompletion) -> Result<GameSession> {
        let mut inner = self.lock();
        let session = inner
            .sessions
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        if let Some(expected) = completion.expected_hints {
            if session.hints_used != expected {
                return Err(CoreError::InvalidState(format!(
                    "{} hint counter moved: expected {}, found {}",
                    id, expected, session.hints_used
                ))
                .into());
            }
        }
        match completion.status {
            SessionStatus::Completed => {
                session.complete(completion.at, completion.score.unwrap_or(0))?
            }
            SessionStatus::Abandoned => session.abandon(completion.at)?,
            SessionStatus::Expired => session.expire(completion.at)?,
            SessionStatus::Active => {
                return Err(CoreError::InvalidArgument(
                    "finish requires a terminal status".to_string(),
                )
                .into())
            }
        }
        Ok(session.clone())
    }

    fn record_hint(&self, id: SessionId, level: u8) -> Result<()> {
        let mut inner = self.lock();
        let session = inner
            .sessions
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        if session.hints_used + 1 != level {
            return Err(CoreError::InvalidState(format!(
                "{} hint level raced: counter at {}, requested {}",
                id, session.hints_used, level
            ))
            .into());
        }
        session.use_hint()?;
        Ok(())
    }
}

impl ScoreRepository for MemoryStore {
    fn insert(&self, record: &ScoreRecord) -> Result<()> {
        self.lock().scores.push(record.clone());
        Ok(())
    }

    fn by_player(&self, player: PlayerId) -> Result<Vec<ScoreRecord>> {
        Ok(self
            .lock()
            .scores
            .iter()
            .filter(|r| r.player == player)
            .cloned()
            .collect())
    }

    fn by_bucket(&self, game_type: GameType, difficulty: Difficulty) -> Result<Vec<ScoreRecord>> {
        Ok(self
            .lock()
            .scores
            .iter()
            .filter(|r| r.game_type == game_type && r.difficulty == difficulty)
            .cloned()
            .collect())
    }
}

impl LeaderboardRepository for MemoryStore {
    fn replace_bucket(
        &self,
        game_type: GameType,
        difficulty: Difficulty,
        entries: Vec<LeaderboardEntry>,
    ) -> Result<()> {
        self.lock().boards.insert((game_type, difficulty), entries);
        Ok(())
    }

    fn bucket(
        &self,
        game_type: GameType,
        difficulty: Difficulty,
    ) -> Result<Vec<LeaderboardEntry>> {
        Ok(self
            .lock()
            .boards
            .get(&(game_type, difficulty))
            .cloned()
            .unwrap_or_default())
    }

    fn entry(
        &self,
        player: PlayerId,
        game_type: GameType,
        difficulty: Difficulty,
    ) -> Result<Option<LeaderboardEntry>> {
        Ok(self
            .lock()
            .boards
            .get(&(game_type, difficulty))
            .and_then(|entries| entries.iter().find(|e| e.player == player))
            .cloned())
    }
}

impl AchievementRepository for MemoryStore {
    fn unlock(&self, achievement: &Achievement) -> Result<bool> {
        let mut inner = self.lock();
        let key = (achievement.player, achievement.kind.as_str());
        if inner.achievements.contains_key(&key) {
            return Ok(false);
        }
        inner.achievements.insert(key, achievement.clone());
        Ok(true)
    }

    fn by_player(&self, player: PlayerId) -> Result<Vec<Achievement>> {
        let mut rows: Vec<Achievement> = self
            .lock()
            .achievements
            .values()
            .filter(|a| a.player == player)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.unlocked_at.cmp(&b.unlocked_at));
        Ok(rows)
    }
}

impl HintLogRepository for MemoryStore {
    fn append(&self, entry: &HintUsageEntry) -> Result<()> {
        self.lock().hints.push(entry.clone());
        Ok(())
    }

    fn by_session(&self, session: SessionId) -> Result<Vec<HintUsageEntry>> {
        Ok(self
            .lock()
            .hints
            .iter()
            .filter(|h| h.session == session)
            .cloned()
            .collect())
    }
}

impl HistoryRepository for MemoryStore {
    fn seen(&self, player: PlayerId, game_type: GameType) -> Result<HashSet<TargetId>> {
        Ok(self
            .lock()
            .seen
            .get(&(player, game_type))
            .cloned()
            .unwrap_or_default())
    }

    fn mark_seen(&self, player: PlayerId, game_type: GameType, target: &TargetId) -> Result<()> {
        self.lock()
            .seen
            .entry((player, game_type))
            .or_default()
            .insert(target.clone());
        Ok(())
    }

    fn clear(&self, player: PlayerId, game_type: GameType) -> Result<()> {
        self.lock().seen.remove(&(player, game_type));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chengyu_core::{GameRng, TokenLayout};
    use chrono::{TimeZone, Utc};

    fn session(id: u64, player: u64) -> GameSession {
        let mut rng = GameRng::new(id);
        GameSession::new(
            SessionId::new(id),
            PlayerId::new(player),
            GameType::Idiom,
            Difficulty::Easy,
            TargetId::new("yfs"),
            "一帆风顺".to_string(),
            TokenLayout::scramble(chengyu_core::char_tokens("一帆风顺"), &mut rng),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_find_active_by_player() {
        let store = MemoryStore::new();
        let s = session(1, 7);
        store.insert_active(&s).unwrap();

        assert!(store.find_active_by_player(PlayerId::new(7)).unwrap().is_some());
        assert!(store.find_active_by_player(PlayerId::new(8)).unwrap().is_none());
    }

    #[test]
    fn test_insert_active_rejects_second_active_session() {
        let store = MemoryStore::new();
        store.insert_active(&session(1, 7)).unwrap();

        let err = store.insert_active(&session(2, 7)).unwrap_err();
        assert!(matches!(err, Error::Core(CoreError::InvalidState(_))));
        // Other players are unaffected
        store.insert_active(&session(3, 8)).unwrap();
        // A finished session frees the slot
        store
            .finish(
                SessionId::new(1),
                SessionCompletion {
                    status: SessionStatus::Abandoned,
                    at: session(1, 7).started_at,
                    score: None,
                    expected_hints: None,
                },
            )
            .unwrap();
        store.insert_active(&session(4, 7)).unwrap();
    }

    #[test]
    fn test_insert_active_is_atomic_under_concurrent_starts() {
        use std::sync::{Arc, Barrier};

        let store = Arc::new(MemoryStore::new());
        for round in 0..50u64 {
            let barrier = Arc::new(Barrier::new(2));
            let handles: Vec<_> = (0..2u64)
                .map(|t| {
                    let store = store.clone();
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        let s = session(round * 2 + t + 1, round);
                        barrier.wait();
                        store.insert_active(&s).is_ok()
                    })
                })
                .collect();
            let successes = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|ok| *ok)
                .count();
            assert_eq!(successes, 1);
        }
    }

    #[test]
    fn test_finish_is_conditional() {
        let store = MemoryStore::new();
        let s = session(1, 7);
        let at = s.started_at;
        store.insert_active(&s).unwrap();

        let completion = SessionCompletion {
            status: SessionStatus::Completed,
            at,
            score: Some(100),
            expected_hints: None,
        };
        let finished = store.finish(s.id, completion).unwrap();
        assert_eq!(finished.score, Some(100));

        // Second finish must fail, not silently re-score
        let err = store.finish(s.id, completion).unwrap_err();
        assert!(matches!(err, Error::Core(CoreError::InvalidState(_))));
    }

    #[test]
    fn test_finish_checks_hint_counter() {
        let store = MemoryStore::new();
        let s = session(1, 7);
        let at = s.started_at;
        store.insert_active(&s).unwrap();
        store.record_hint(s.id, 1).unwrap();

        // A completion scored before the hint landed must not win
        let err = store
            .finish(
                s.id,
                SessionCompletion {
                    status: SessionStatus::Completed,
                    at,
                    score: Some(175),
                    expected_hints: Some(0),
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Core(CoreError::InvalidState(_))));
        assert!(store.get(s.id).unwrap().unwrap().is_active());

        store
            .finish(
                s.id,
                SessionCompletion {
                    status: SessionStatus::Completed,
                    at,
                    score: Some(165),
                    expected_hints: Some(1),
                },
            )
            .unwrap();
    }

    #[test]
    fn test_record_hint_rejects_raced_level() {
        let store = MemoryStore::new();
        let s = session(1, 7);
        store.insert_active(&s).unwrap();

        store.record_hint(s.id, 1).unwrap();
        // Re-submitting the same level is a race, not a no-op
        let err = store.record_hint(s.id, 1).unwrap_err();
        assert!(matches!(err, Error::Core(CoreError::InvalidState(_))));
        store.record_hint(s.id, 2).unwrap();
    }

    #[test]
    fn test_history_round_trip() {
        let store = MemoryStore::new();
        let player = PlayerId::new(1);
        let target = TargetId::new("yfs");

        store.mark_seen(player, GameType::Idiom, &target).unwrap();
        assert!(store.seen(player, GameType::Idiom).unwrap().contains(&target));
        // Other game type unaffected
        assert!(store.seen(player, GameType::Sentence).unwrap().is_empty());

        store.clear(player, GameType::Idiom).unwrap();
        assert!(store.seen(player, GameType::Idiom).unwrap().is_empty());
    }
}
