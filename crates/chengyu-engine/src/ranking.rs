//! Leaderboard ranking
//!
//! Each `(game_type, difficulty)` bucket is recomputed from scratch out of
//! the score records and written back as a full replacement set, so a
//! repeated or concurrent recompute of the same bucket is idempotent.

use crate::error::Result;
use crate::repo::{LeaderboardRepository, ScoreRepository};
use chengyu_core::{Clock, Difficulty, GameType, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// One player's row on one leaderboard bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player: PlayerId,
    pub game_type: GameType,
    pub difficulty: Difficulty,
    /// Strict ordinal rank, `1..=N` with no gaps and no shared ranks
    pub rank: u32,
    pub total_score: u64,
    pub average_score: f64,
    pub games_played: u32,
    /// Mean accuracy across the player's records in this bucket
    pub accuracy: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Default)]
struct Aggregate {
    total_score: u64,
    games_played: u32,
    accuracy_sum: f64,
}

/// Recomputes leaderboard buckets from score records
pub struct LeaderboardRanker {
    scores: Arc<dyn ScoreRepository>,
    boards: Arc<dyn LeaderboardRepository>,
    clock: Arc<dyn Clock>,
}

impl LeaderboardRanker {
    pub fn new(
        scores: Arc<dyn ScoreRepository>,
        boards: Arc<dyn LeaderboardRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            scores,
            boards,
            clock,
        }
    }

    /// Recompute one bucket and replace its stored entries.
    ///
    /// Ordering is total score descending, ties broken by average score
    /// descending, then games played descending, then player id ascending.
    /// The final chain is a total order, so ranks are strictly ordinal:
    /// `1..=N`, no shared ranks. Players with zero records simply do not
    /// appear, which drops their stale rows on replacement.
    ///
    /// Returns the number of ranked players.
    pub fn recompute_bucket(&self, game_type: GameType, difficulty: Difficulty) -> Result<usize> {
        let records = self.scores.by_bucket(game_type, difficulty)?;

        let mut aggregates: HashMap<PlayerId, Aggregate> = HashMap::new();
        for record in &records {
            let agg = aggregates.entry(record.player).or_default();
            agg.total_score += record.score as u64;
            agg.games_played += 1;
            agg.accuracy_sum += record.accuracy;
        }

        let now = self.clock.now();
        let mut entries: Vec<LeaderboardEntry> = aggregates
            .into_iter()
            .map(|(player, agg)| {
                let games = agg.games_played.max(1) as f64;
                LeaderboardEntry {
                    player,
                    game_type,
                    difficulty,
                    rank: 0,
                    total_score: agg.total_score,
                    average_score: agg.total_score as f64 / games,
                    games_played: agg.games_played,
                    accuracy: agg.accuracy_sum / games,
                    last_updated: now,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then(
                    b.average_score
                        .partial_cmp(&a.average_score)
                        .unwrap_or(Ordering::Equal),
                )
                .then(b.games_played.cmp(&a.games_played))
                .then(a.player.cmp(&b.player))
        });
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = (i + 1) as u32;
        }

        let count = entries.len();
        self.boards.replace_bucket(game_type, difficulty, entries)?;
        Ok(count)
    }

    /// Recompute every bucket, logging and skipping individual failures
    /// so one bad bucket cannot block the rest of the sweep.
    ///
    /// Returns the number of buckets successfully recomputed.
    pub fn recompute_all(&self) -> usize {
        let mut done = 0;
        for game_type in GameType::all() {
            for difficulty in Difficulty::all() {
                match self.recompute_bucket(game_type, difficulty) {
                    Ok(_) => done += 1,
                    Err(e) => {
                        log::warn!(
                            "leaderboard recompute failed for {game_type}/{difficulty}: {e}"
                        );
                    }
                }
            }
        }
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use chengyu_core::{ManualClock, ScoreRecord, SessionId};
    use chrono::TimeZone;

    fn record(player: u64, session: u64, score: u32, accuracy: f64) -> ScoreRecord {
        ScoreRecord {
            session: SessionId::new(session),
            player: PlayerId::new(player),
            game_type: GameType::Idiom,
            difficulty: Difficulty::Easy,
            target_text: "一帆风顺".to_string(),
            submitted_text: "一帆风顺".to_string(),
            score,
            time_taken_secs: 60,
            hints_used: 0,
            accuracy,
            completed: true,
            recorded_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    fn ranker(store: &Arc<MemoryStore>) -> LeaderboardRanker {
        let clock = Arc::new(ManualClock::at(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        LeaderboardRanker::new(store.clone(), store.clone(), clock)
    }

    #[test]
    fn test_ranks_are_strict_ordinal() {
        let store = Arc::new(MemoryStore::new());
        let ranker = ranker(&store);

        // Players 1 and 2 tie on total; player 2 has fewer games so a
        // higher average and wins the tie-break.
        ScoreRepository::insert(store.as_ref(), &record(1, 1, 100, 1.0)).unwrap();
        ScoreRepository::insert(store.as_ref(), &record(1, 2, 100, 1.0)).unwrap();
        ScoreRepository::insert(store.as_ref(), &record(2, 3, 200, 1.0)).unwrap();
        ScoreRepository::insert(store.as_ref(), &record(3, 4, 50, 0.5)).unwrap();

        let n = ranker
            .recompute_bucket(GameType::Idiom, Difficulty::Easy)
            .unwrap();
        assert_eq!(n, 3);

        let board = store
            .bucket(GameType::Idiom, Difficulty::Easy)
            .unwrap();
        let ranks: Vec<u32> = board.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(board[0].player, PlayerId::new(2));
        assert_eq!(board[1].player, PlayerId::new(1));
        assert_eq!(board[2].player, PlayerId::new(3));
    }

    #[test]
    fn test_higher_total_never_ranks_lower() {
        let store = Arc::new(MemoryStore::new());
        let ranker = ranker(&store);
        for p in 1..=5u64 {
            ScoreRepository::insert(store.as_ref(), &record(p, p, (p * 10) as u32, 1.0)).unwrap();
        }
        ranker
            .recompute_bucket(GameType::Idiom, Difficulty::Easy)
            .unwrap();
        let board = store.bucket(GameType::Idiom, Difficulty::Easy).unwrap();
        for pair in board.windows(2) {
            assert!(pair[0].total_score >= pair[1].total_score);
            assert!(pair[0].rank < pair[1].rank);
        }
    }

    #[test]
    fn test_full_tie_breaks_on_player_id() {
        let store = Arc::new(MemoryStore::new());
        let ranker = ranker(&store);
        ScoreRepository::insert(store.as_ref(), &record(9, 1, 100, 1.0)).unwrap();
        ScoreRepository::insert(store.as_ref(), &record(4, 2, 100, 1.0)).unwrap();
        ranker
            .recompute_bucket(GameType::Idiom, Difficulty::Easy)
            .unwrap();
        let board = store.bucket(GameType::Idiom, Difficulty::Easy).unwrap();
        assert_eq!(board[0].player, PlayerId::new(4));
        assert_eq!(board[1].player, PlayerId::new(9));
    }

    #[test]
    fn test_recompute_replaces_stale_rows() {
        let store = Arc::new(MemoryStore::new());
        let ranker = ranker(&store);
        ScoreRepository::insert(store.as_ref(), &record(1, 1, 100, 1.0)).unwrap();
        ranker
            .recompute_bucket(GameType::Idiom, Difficulty::Easy)
            .unwrap();
        assert_eq!(
            store.bucket(GameType::Idiom, Difficulty::Easy).unwrap().len(),
            1
        );

        // A stale board row for a player with no records is dropped by the
        // next full replacement.
        store
            .replace_bucket(GameType::Idiom, Difficulty::Easy, Vec::new())
            .unwrap();
        ranker
            .recompute_bucket(GameType::Idiom, Difficulty::Easy)
            .unwrap();
        let board = store.bucket(GameType::Idiom, Difficulty::Easy).unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].player, PlayerId::new(1));
    }

    #[test]
    fn test_empty_bucket_is_identity() {
        let store = Arc::new(MemoryStore::new());
        let ranker = ranker(&store);
        let n = ranker
            .recompute_bucket(GameType::Sentence, Difficulty::Expert)
            .unwrap();
        assert_eq!(n, 0);
        assert!(store
            .bucket(GameType::Sentence, Difficulty::Expert)
            .unwrap()
            .is_empty());
    }
}
