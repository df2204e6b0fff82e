//! Engine repository traits implemented over the native_db store.
//!
//! The conditional session updates (`insert_active`, `finish`,
//! `record_hint`) run their read-check-write inside one rw transaction,
//! which is what makes them safe under concurrent starts and submits.

use crate::error::Error;
use crate::models::*;
use chengyu_core::{
    Difficulty, Error as CoreError, GameSession, GameType, HintUsageEntry, PlayerId, ScoreRecord,
    SessionId, SessionStatus, TargetId,
};
use chengyu_engine::{
    Achievement, AchievementRepository, HintLogRepository, HistoryRepository, LeaderboardEntry,
    LeaderboardRepository, Result, ScoreRepository, SessionCompletion, SessionRepository,
};
use std::collections::HashSet;

use crate::store::Store;

fn db_err(e: native_db::db_type::Error) -> Error {
    Error::Database(e.to_string())
}

impl SessionRepository for Store {
    fn insert_active(&self, session: &GameSession) -> Result<()> {
        // Check and insert inside one rw transaction; native_db serializes
        // writers, so two racing starts cannot both pass the check.
        let rw = self.db.rw_transaction().map_err(db_err)?;
        {
            let scan = rw
                .scan()
                .secondary::<StoredSession>(StoredSessionKey::player)
                .map_err(db_err)?;
            let iter = scan.start_with(session.player.raw()).map_err(db_err)?;
            let rows: std::result::Result<Vec<StoredSession>, _> = iter.collect();
            let rows = rows.map_err(db_err)?;
            for row in rows {
                let existing = row.to_session()?;
                if existing.is_active() {
                    return Err(CoreError::InvalidState(format!(
                        "{} already has an active session ({})",
                        session.player, existing.id
                    ))
                    .into());
                }
            }
        }
        rw.upsert(StoredSession::from_session(session))
            .map_err(db_err)?;
        rw.commit().map_err(db_err)?;
        Ok(())
    }

    fn get(&self, id: SessionId) -> Result<Option<GameSession>> {
        let r = self.db.r_transaction().map_err(db_err)?;
        let stored: Option<StoredSession> = r.get().primary(id.raw()).map_err(db_err)?;
        Ok(stored.map(|s| s.to_session()).transpose()?)
    }

    fn find_active_by_player(&self, player: PlayerId) -> Result<Option<GameSession>> {
        let r = self.db.r_transaction().map_err(db_err)?;
        let scan = r
            .scan()
            .secondary::<StoredSession>(StoredSessionKey::player)
            .map_err(db_err)?;
        let iter = scan.start_with(player.raw()).map_err(db_err)?;
        let rows: std::result::Result<Vec<StoredSession>, _> = iter.collect();
        let rows = rows.map_err(db_err)?;
        for row in rows {
            let session = row.to_session()?;
            if session.is_active() {
                return Ok(Some(session));
            }
        }
        Ok(None)
    }

    fn active_sessions(&self) -> Result<Vec<GameSession>> {
        let r = self.db.r_transaction().map_err(db_err)?;
        let scan = r.scan().primary::<StoredSession>().map_err(db_err)?;
        let iter = scan.all().map_err(db_err)?;
        let rows: std::result::Result<Vec<StoredSession>, _> = iter.collect();
        let rows = rows.map_err(db_err)?;
        let mut sessions = Vec::new();
        for row in rows {
            let session = row.to_session()?;
            if session.is_active() {
                sessions.push(session);
            }
        }
        Ok(sessions)
    }

    fn finish(&self, id: SessionId, completion: SessionCompletion) -> Result<GameSession> {
        let rw = self.db.rw_transaction().map_err(db_err)?;
        let stored: Option<StoredSession> = rw.get().primary(id.raw()).map_err(db_err)?;
        let stored = stored.ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        let mut session = stored.to_session()?;
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
        rw.upsert(StoredSession::from_session(&session))
            .map_err(db_err)?;
        rw.commit().map_err(db_err)?;
        Ok(session)
    }

    fn record_hint(&self, id: SessionId, level: u8) -> Result<()> {
        let rw = self.db.rw_transaction().map_err(db_err)?;
        let stored: Option<StoredSession> = rw.get().primary(id.raw()).map_err(db_err)?;
        let stored = stored.ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        let mut session = stored.to_session()?;
        if session.hints_used + 1 != level {
            return Err(CoreError::InvalidState(format!(
                "{} hint level raced: counter at {}, requested {}",
                id, session.hints_used, level
            ))
            .into());
        }
        session.use_hint()?;
        rw.upsert(StoredSession::from_session(&session))
            .map_err(db_err)?;
        rw.commit().map_err(db_err)?;
        Ok(())
    }
}

impl ScoreRepository for Store {
    fn insert(&self, record: &ScoreRecord) -> Result<()> {
        let rw = self.db.rw_transaction().map_err(db_err)?;
        rw.upsert(StoredScore::from_record(record)).map_err(db_err)?;
        rw.commit().map_err(db_err)?;
        Ok(())
    }

    fn by_player(&self, player: PlayerId) -> Result<Vec<ScoreRecord>> {
        let r = self.db.r_transaction().map_err(db_err)?;
        let scan = r
            .scan()
            .secondary::<StoredScore>(StoredScoreKey::player)
            .map_err(db_err)?;
        let iter = scan.start_with(player.raw()).map_err(db_err)?;
        let rows: std::result::Result<Vec<StoredScore>, _> = iter.collect();
        let rows = rows.map_err(db_err)?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(row.to_record()?);
        }
        Ok(records)
    }

    fn by_bucket(&self, game_type: GameType, difficulty: Difficulty) -> Result<Vec<ScoreRecord>> {
        let key = crate::models::bucket_key(game_type, difficulty);
        let r = self.db.r_transaction().map_err(db_err)?;
        let scan = r
            .scan()
            .secondary::<StoredScore>(StoredScoreKey::bucket)
            .map_err(db_err)?;
        let iter = scan.start_with(key.as_str()).map_err(db_err)?;
        let rows: std::result::Result<Vec<StoredScore>, _> = iter.collect();
        let rows = rows.map_err(db_err)?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let record = row.to_record()?;
            if record.game_type == game_type && record.difficulty == difficulty {
                records.push(record);
            }
        }
        Ok(records)
    }
}

impl LeaderboardRepository for Store {
    fn replace_bucket(
        &self,
        game_type: GameType,
        difficulty: Difficulty,
        entries: Vec<LeaderboardEntry>,
    ) -> Result<()> {
        let key = crate::models::bucket_key(game_type, difficulty);

        // Collect existing row keys first, then replace in one rw
        // transaction. A replace is idempotent, so a concurrent recompute
        // of the same bucket converges on the later writer.
        let stale_ids: Vec<String> = {
            let r = self.db.r_transaction().map_err(db_err)?;
            let scan = r
                .scan()
                .secondary::<StoredLeaderboardEntry>(StoredLeaderboardEntryKey::bucket)
                .map_err(db_err)?;
            let iter = scan.start_with(key.as_str()).map_err(db_err)?;
            let rows: std::result::Result<Vec<StoredLeaderboardEntry>, _> = iter.collect();
            rows.map_err(db_err)?.into_iter().map(|e| e.id).collect()
        };

        let rw = self.db.rw_transaction().map_err(db_err)?;
        for id in stale_ids {
            let row: Option<StoredLeaderboardEntry> =
                rw.get().primary(id).map_err(db_err)?;
            if let Some(row) = row {
                rw.remove(row).map_err(db_err)?;
            }
        }
        for entry in &entries {
            rw.upsert(StoredLeaderboardEntry::from_entry(entry))
                .map_err(db_err)?;
        }
        rw.commit().map_err(db_err)?;
        Ok(())
    }

    fn bucket(
        &self,
        game_type: GameType,
        difficulty: Difficulty,
    ) -> Result<Vec<LeaderboardEntry>> {
        let key = crate::models::bucket_key(game_type, difficulty);
        let r = self.db.r_transaction().map_err(db_err)?;
        let scan = r
            .scan()
            .secondary::<StoredLeaderboardEntry>(StoredLeaderboardEntryKey::bucket)
            .map_err(db_err)?;
        let iter = scan.start_with(key.as_str()).map_err(db_err)?;
        let rows: std::result::Result<Vec<StoredLeaderboardEntry>, _> = iter.collect();
        let rows = rows.map_err(db_err)?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let entry = row.to_entry()?;
            if entry.game_type == game_type && entry.difficulty == difficulty {
                entries.push(entry);
            }
        }
        entries.sort_by_key(|e| e.rank);
        Ok(entries)
    }

    fn entry(
        &self,
        player: PlayerId,
        game_type: GameType,
        difficulty: Difficulty,
    ) -> Result<Option<LeaderboardEntry>> {
        let r = self.db.r_transaction().map_err(db_err)?;
        let stored: Option<StoredLeaderboardEntry> = r
            .get()
            .primary(StoredLeaderboardEntry::row_key(player, game_type, difficulty))
            .map_err(db_err)?;
        Ok(stored.map(|s| s.to_entry()).transpose()?)
    }
}

impl AchievementRepository for Store {
    fn unlock(&self, achievement: &Achievement) -> Result<bool> {
        let key = StoredAchievement::row_key(achievement.player, achievement.kind);
        let rw = self.db.rw_transaction().map_err(db_err)?;
        let existing: Option<StoredAchievement> =
            rw.get().primary(key).map_err(db_err)?;
        if existing.is_some() {
            return Ok(false);
        }
        rw.upsert(StoredAchievement::from_achievement(achievement))
            .map_err(db_err)?;
        rw.commit().map_err(db_err)?;
        Ok(true)
    }

    fn by_player(&self, player: PlayerId) -> Result<Vec<Achievement>> {
        let r = self.db.r_transaction().map_err(db_err)?;
        let scan = r
            .scan()
            .secondary::<StoredAchievement>(StoredAchievementKey::player)
            .map_err(db_err)?;
        let iter = scan.start_with(player.raw()).map_err(db_err)?;
        let rows: std::result::Result<Vec<StoredAchievement>, _> = iter.collect();
        let rows = rows.map_err(db_err)?;
        let mut achievements = Vec::with_capacity(rows.len());
        for row in rows {
            achievements.push(row.to_achievement()?);
        }
        achievements.sort_by(|a, b| a.unlocked_at.cmp(&b.unlocked_at));
        Ok(achievements)
    }
}

impl HintLogRepository for Store {
    fn append(&self, entry: &HintUsageEntry) -> Result<()> {
        let rw = self.db.rw_transaction().map_err(db_err)?;
        rw.upsert(StoredHintUsage::from_entry(entry)).map_err(db_err)?;
        rw.commit().map_err(db_err)?;
        Ok(())
    }

    fn by_session(&self, session: SessionId) -> Result<Vec<HintUsageEntry>> {
        let r = self.db.r_transaction().map_err(db_err)?;
        let scan = r
            .scan()
            .secondary::<StoredHintUsage>(StoredHintUsageKey::session)
            .map_err(db_err)?;
        let iter = scan.start_with(session.raw()).map_err(db_err)?;
        let rows: std::result::Result<Vec<StoredHintUsage>, _> = iter.collect();
        let rows = rows.map_err(db_err)?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(row.to_entry()?);
        }
        entries.sort_by_key(|e| e.level);
        Ok(entries)
    }
}

impl HistoryRepository for Store {
    fn seen(&self, player: PlayerId, game_type: GameType) -> Result<HashSet<TargetId>> {
        let owner = StoredSeenTarget::owner_key(player, game_type);
        let r = self.db.r_transaction().map_err(db_err)?;
        let scan = r
            .scan()
            .secondary::<StoredSeenTarget>(StoredSeenTargetKey::owner)
            .map_err(db_err)?;
        let iter = scan.start_with(owner.as_str()).map_err(db_err)?;
        let rows: std::result::Result<Vec<StoredSeenTarget>, _> = iter.collect();
        let rows = rows.map_err(db_err)?;
        Ok(rows
            .into_iter()
            .filter(|row| row.owner == owner)
            .map(|row| TargetId::new(row.target_id))
            .collect())
    }

    fn mark_seen(&self, player: PlayerId, game_type: GameType, target: &TargetId) -> Result<()> {
        let rw = self.db.rw_transaction().map_err(db_err)?;
        rw.upsert(StoredSeenTarget::new(player, game_type, target))
            .map_err(db_err)?;
        rw.commit().map_err(db_err)?;
        Ok(())
    }

    fn clear(&self, player: PlayerId, game_type: GameType) -> Result<()> {
        let owner = StoredSeenTarget::owner_key(player, game_type);
        let stale_ids: Vec<String> = {
            let r = self.db.r_transaction().map_err(db_err)?;
            let scan = r
                .scan()
                .secondary::<StoredSeenTarget>(StoredSeenTargetKey::owner)
                .map_err(db_err)?;
            let iter = scan.start_with(owner.as_str()).map_err(db_err)?;
            let rows: std::result::Result<Vec<StoredSeenTarget>, _> = iter.collect();
            rows.map_err(db_err)?
                .into_iter()
                .filter(|row| row.owner == owner)
                .map(|row| row.id)
                .collect()
        };

        let rw = self.db.rw_transaction().map_err(db_err)?;
        for id in stale_ids {
            let row: Option<StoredSeenTarget> = rw.get().primary(id).map_err(db_err)?;
            if let Some(row) = row {
                rw.remove(row).map_err(db_err)?;
            }
        }
        rw.commit().map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chengyu_core::{GameRng, TokenLayout};
    use chengyu_engine::Error as EngineError;
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
    fn test_session_round_trip() {
        let store = Store::in_memory().unwrap();
        let s = session(1, 7);
        store.insert_active(&s).unwrap();

        let loaded = store.get(s.id).unwrap().unwrap();
        assert_eq!(loaded, s);
        assert!(store.find_active_by_player(PlayerId::new(7)).unwrap().is_some());
        assert!(store.find_active_by_player(PlayerId::new(8)).unwrap().is_none());
    }

    #[test]
    fn test_insert_active_rejects_second_active_session() {
        let store = Store::in_memory().unwrap();
        store.insert_active(&session(1, 7)).unwrap();

        let err = store.insert_active(&session(2, 7)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidState(_))
        ));
        store.insert_active(&session(3, 8)).unwrap();

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
    fn test_finish_is_conditional() {
        let store = Store::in_memory().unwrap();
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
        assert!(store.active_sessions().unwrap().is_empty());

        let err = store.finish(s.id, completion).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidState(_))
        ));
    }

    #[test]
    fn test_finish_checks_hint_counter() {
        let store = Store::in_memory().unwrap();
        let s = session(1, 7);
        let at = s.started_at;
        store.insert_active(&s).unwrap();
        store.record_hint(s.id, 1).unwrap();

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
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidState(_))
        ));
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
        let store = Store::in_memory().unwrap();
        let s = session(1, 7);
        store.insert_active(&s).unwrap();

        store.record_hint(s.id, 1).unwrap();
        let err = store.record_hint(s.id, 1).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidState(_))
        ));
        store.record_hint(s.id, 2).unwrap();
        assert_eq!(store.get(s.id).unwrap().unwrap().hints_used, 2);
    }

    #[test]
    fn test_replace_bucket_drops_stale_rows() {
        let store = Store::in_memory().unwrap();
        let entry = |player: u64, rank: u32| LeaderboardEntry {
            player: PlayerId::new(player),
            game_type: GameType::Idiom,
            difficulty: Difficulty::Easy,
            rank,
            total_score: 100,
            average_score: 100.0,
            games_played: 1,
            accuracy: 1.0,
            last_updated: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };

        store
            .replace_bucket(
                GameType::Idiom,
                Difficulty::Easy,
                vec![entry(1, 1), entry(2, 2)],
            )
            .unwrap();
        store
            .replace_bucket(GameType::Idiom, Difficulty::Easy, vec![entry(2, 1)])
            .unwrap();

        let board = store.bucket(GameType::Idiom, Difficulty::Easy).unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].player, PlayerId::new(2));
        assert!(store
            .entry(PlayerId::new(1), GameType::Idiom, Difficulty::Easy)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_scores_by_bucket_and_player() {
        let store = Store::in_memory().unwrap();
        let record = |session: u64, player: u64, difficulty: Difficulty| ScoreRecord {
            session: SessionId::new(session),
            player: PlayerId::new(player),
            game_type: GameType::Idiom,
            difficulty,
            target_text: "一帆风顺".to_string(),
            submitted_text: "一帆风顺".to_string(),
            score: 175,
            time_taken_secs: 45,
            hints_used: 0,
            accuracy: 1.0,
            completed: true,
            recorded_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };

        ScoreRepository::insert(&store, &record(1, 1, Difficulty::Easy)).unwrap();
        ScoreRepository::insert(&store, &record(2, 1, Difficulty::Hard)).unwrap();
        ScoreRepository::insert(&store, &record(3, 2, Difficulty::Easy)).unwrap();

        assert_eq!(
            ScoreRepository::by_player(&store, PlayerId::new(1)).unwrap().len(),
            2
        );
        assert_eq!(
            store.by_bucket(GameType::Idiom, Difficulty::Easy).unwrap().len(),
            2
        );
        assert_eq!(
            store.by_bucket(GameType::Idiom, Difficulty::Hard).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_hint_log_handles_extreme_session_ids() {
        let store = Store::in_memory().unwrap();
        let session = SessionId::new(u64::MAX);
        let used_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        for (level, penalty) in [(1u8, 10u32), (2, 20)] {
            store
                .append(&HintUsageEntry {
                    session,
                    level,
                    penalty,
                    used_at,
                })
                .unwrap();
        }

        let log = store.by_session(session).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].level, 1);
        assert_eq!(log[1].level, 2);
        assert!(store.by_session(SessionId::new(1)).unwrap().is_empty());
    }

    #[test]
    fn test_history_round_trip() {
        let store = Store::in_memory().unwrap();
        let player = PlayerId::new(1);
        let target = TargetId::new("yfs");

        store.mark_seen(player, GameType::Idiom, &target).unwrap();
        assert!(store.seen(player, GameType::Idiom).unwrap().contains(&target));
        assert!(store.seen(player, GameType::Sentence).unwrap().is_empty());

        store.clear(player, GameType::Idiom).unwrap();
        assert!(store.seen(player, GameType::Idiom).unwrap().is_empty());
    }
}
