//! Achievement evaluation
//!
//! Runs after every completed game. Rules are evaluated against the
//! player's aggregate record history plus the just-finished game, and
//! unlocking is idempotent: at most one row ever exists per
//! `(player, achievement type)`.

use crate::error::Result;
use crate::repo::{AchievementRepository, LeaderboardRepository, ScoreRepository};
use chengyu_core::{Clock, Difficulty, GameType, PlayerId, ScoreRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Completed games needed for the perfect-play achievement
const PERFECT_SCORE_GAMES: u32 = 5;
/// Completed games needed for `HundredGames`
const HUNDRED_GAMES: u32 = 100;
/// Hint-free completed games needed for `HintFree`
const HINT_FREE_GAMES: u32 = 10;
/// Board position at or above which `TopRanked` unlocks
const TOP_RANK: u32 = 10;
/// Single-game score threshold for `HighScorer`
const HIGH_SCORE: u32 = 1000;
/// Single-game time threshold for `SpeedDemon`, in seconds
const SPEED_SECS: u32 = 30;

/// The fixed achievement catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AchievementType {
    FirstWin,
    SpeedDemon,
    PerfectScore,
    HundredGames,
    HintFree,
    TopRanked,
    HighScorer,
}

impl AchievementType {
    /// All achievement types
    pub fn all() -> [AchievementType; 7] {
        [
            AchievementType::FirstWin,
            AchievementType::SpeedDemon,
            AchievementType::PerfectScore,
            AchievementType::HundredGames,
            AchievementType::HintFree,
            AchievementType::TopRanked,
            AchievementType::HighScorer,
        ]
    }

    /// Stable snake_case name, used as part of storage keys
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementType::FirstWin => "first_win",
            AchievementType::SpeedDemon => "speed_demon",
            AchievementType::PerfectScore => "perfect_score",
            AchievementType::HundredGames => "hundred_games",
            AchievementType::HintFree => "hint_free",
            AchievementType::TopRanked => "top_ranked",
            AchievementType::HighScorer => "high_scorer",
        }
    }

    /// Parse the stable name back into a type
    pub fn parse(s: &str) -> chengyu_core::Result<Self> {
        Self::all()
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                chengyu_core::Error::InvalidArgument(format!("unknown achievement type: {s}"))
            })
    }

    /// Display title
    pub fn title(&self) -> &'static str {
        match self {
            AchievementType::FirstWin => "First Win",
            AchievementType::SpeedDemon => "Speed Demon",
            AchievementType::PerfectScore => "Perfect Score",
            AchievementType::HundredGames => "Centurion",
            AchievementType::HintFree => "No Help Needed",
            AchievementType::TopRanked => "Top Ranked",
            AchievementType::HighScorer => "High Scorer",
        }
    }

    /// Display description
    pub fn description(&self) -> &'static str {
        match self {
            AchievementType::FirstWin => "Complete your first game",
            AchievementType::SpeedDemon => "Finish a game in under 30 seconds",
            AchievementType::PerfectScore => "Complete 5 games with full accuracy and no hints",
            AchievementType::HundredGames => "Complete 100 games",
            AchievementType::HintFree => "Complete 10 games without using a hint",
            AchievementType::TopRanked => "Reach the top 10 of any leaderboard",
            AchievementType::HighScorer => "Score 1000 points in a single game",
        }
    }
}

/// An unlocked achievement row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub player: PlayerId,
    pub kind: AchievementType,
    pub title: String,
    pub description: String,
    pub unlocked_at: DateTime<Utc>,
    /// Free-form context, e.g. the score or time that triggered the unlock
    pub metadata: Option<String>,
}

impl Achievement {
    /// Build an unlock row for a player
    pub fn unlock(
        player: PlayerId,
        kind: AchievementType,
        at: DateTime<Utc>,
        metadata: Option<String>,
    ) -> Self {
        Self {
            player,
            kind,
            title: kind.title().to_string(),
            description: kind.description().to_string(),
            unlocked_at: at,
            metadata,
        }
    }
}

/// Aggregate statistics the rules are evaluated against
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerStats {
    pub games_played: u32,
    pub hint_free_games: u32,
    /// Games with accuracy 1.0 and no hints
    pub perfect_games: u32,
    /// Best (lowest) rank across every leaderboard bucket
    pub best_rank: Option<u32>,
}

/// Evaluates the achievement rule set after each completed game
pub struct AchievementEvaluator {
    scores: Arc<dyn ScoreRepository>,
    boards: Arc<dyn LeaderboardRepository>,
    achievements: Arc<dyn AchievementRepository>,
    clock: Arc<dyn Clock>,
}

impl AchievementEvaluator {
    pub fn new(
        scores: Arc<dyn ScoreRepository>,
        boards: Arc<dyn LeaderboardRepository>,
        achievements: Arc<dyn AchievementRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            scores,
            boards,
            achievements,
            clock,
        }
    }

    /// Gather the player's aggregate statistics
    pub fn stats_for(&self, player: PlayerId) -> Result<PlayerStats> {
        let records = self.scores.by_player(player)?;
        let mut stats = PlayerStats {
            games_played: records.len() as u32,
            ..Default::default()
        };
        for record in &records {
            if record.hints_used == 0 {
                stats.hint_free_games += 1;
                if record.accuracy == 1.0 {
                    stats.perfect_games += 1;
                }
            }
        }

        for game_type in GameType::all() {
            for difficulty in Difficulty::all() {
                if let Some(entry) = self.boards.entry(player, game_type, difficulty)? {
                    stats.best_rank = Some(match stats.best_rank {
                        Some(best) => best.min(entry.rank),
                        None => entry.rank,
                    });
                }
            }
        }
        Ok(stats)
    }

    /// Evaluate every rule for the player after `latest` was recorded.
    ///
    /// Returns only achievements newly unlocked by this call; rules already
    /// satisfied on an earlier game are skipped by the idempotent
    /// check-then-insert in the repository.
    pub fn evaluate(&self, player: PlayerId, latest: &ScoreRecord) -> Result<Vec<Achievement>> {
        let stats = self.stats_for(player)?;
        let mut satisfied: Vec<(AchievementType, Option<String>)> = Vec::new();

        if stats.games_played >= 1 {
            satisfied.push((AchievementType::FirstWin, None));
        }
        if latest.time_taken_secs < SPEED_SECS {
            satisfied.push((
                AchievementType::SpeedDemon,
                Some(format!("{}s", latest.time_taken_secs)),
            ));
        }
        if stats.perfect_games >= PERFECT_SCORE_GAMES {
            satisfied.push((AchievementType::PerfectScore, None));
        }
        if stats.games_played >= HUNDRED_GAMES {
            satisfied.push((AchievementType::HundredGames, None));
        }
        if stats.hint_free_games >= HINT_FREE_GAMES {
            satisfied.push((AchievementType::HintFree, None));
        }
        if stats.best_rank.is_some_and(|rank| rank <= TOP_RANK) {
            satisfied.push((
                AchievementType::TopRanked,
                stats.best_rank.map(|r| format!("rank {r}")),
            ));
        }
        if latest.score >= HIGH_SCORE {
            satisfied.push((
                AchievementType::HighScorer,
                Some(latest.score.to_string()),
            ));
        }

        let now = self.clock.now();
        let mut unlocked = Vec::new();
        for (kind, metadata) in satisfied {
            let achievement = Achievement::unlock(player, kind, now, metadata);
            if self.achievements.unlock(&achievement)? {
                unlocked.push(achievement);
            }
        }
        Ok(unlocked)
    }
}
