//! External operation contracts
//!
//! `GameService` is the surface the presentation/transport layer talks to.
//! It wires the session manager, achievement evaluator, and leaderboard
//! ranker together so a submit flows through validation, scoring,
//! achievement evaluation, and the player's leaderboard bucket update in
//! one call.

use crate::achievements::{Achievement, AchievementEvaluator};
use crate::error::Result;
use crate::ranking::{LeaderboardEntry, LeaderboardRanker};
use crate::repo::Repos;
use crate::sessions::{SessionConfig, SessionManager, StartedGame, SubmitOutcome};
use chengyu_content::ContentSource;
use chengyu_core::{
    Answer, Clock, Difficulty, GameRng, GameType, Hint, PlayerId, SessionId, Validator,
};
use std::sync::Arc;

/// Outcome of a submit: the scored verdict plus any newly unlocked
/// achievements
#[derive(Debug, Clone)]
pub struct SubmitResult {
    pub outcome: SubmitOutcome,
    pub unlocked: Vec<Achievement>,
}

/// The engine facade exposed to the transport layer
pub struct GameService {
    manager: SessionManager,
    ranker: LeaderboardRanker,
    evaluator: AchievementEvaluator,
    repos: Repos,
}

impl GameService {
    pub fn new(
        repos: Repos,
        content: Arc<dyn ContentSource>,
        validator: Validator,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ranker = LeaderboardRanker::new(
            repos.scores.clone(),
            repos.boards.clone(),
            clock.clone(),
        );
        let evaluator = AchievementEvaluator::new(
            repos.scores.clone(),
            repos.boards.clone(),
            repos.achievements.clone(),
            clock.clone(),
        );
        let manager = SessionManager::new(repos.clone(), content, validator, config, clock);
        Self {
            manager,
            ranker,
            evaluator,
            repos,
        }
    }

    /// Replace the question-selection RNG, for deterministic tests
    pub fn with_rng(mut self, rng: GameRng) -> Self {
        self.manager = self.manager.with_rng(rng);
        self
    }

    /// Start a game for the player
    pub fn start_game(
        &self,
        player: PlayerId,
        game_type: GameType,
        difficulty: Difficulty,
    ) -> Result<StartedGame> {
        self.manager.start(player, game_type, difficulty)
    }

    /// Score a submission, then evaluate achievements and refresh the
    /// session's leaderboard bucket.
    ///
    /// Achievements are evaluated before the bucket refresh, so
    /// `TopRanked` reflects standings as of the previous game. A ranking
    /// failure is logged and does not fail the submit.
    pub fn submit_answer(
        &self,
        session: SessionId,
        answer: &Answer,
        time_taken_secs: u32,
    ) -> Result<SubmitResult> {
        let outcome = self.manager.submit(session, answer, time_taken_secs)?;
        let unlocked = self
            .evaluator
            .evaluate(outcome.record.player, &outcome.record)?;

        let (game_type, difficulty) = (outcome.record.game_type, outcome.record.difficulty);
        if let Err(e) = self.ranker.recompute_bucket(game_type, difficulty) {
            log::warn!("post-submit ranking failed for {game_type}/{difficulty}: {e}");
        }

        Ok(SubmitResult { outcome, unlocked })
    }

    /// Issue the next hint for an active session
    pub fn request_hint(&self, session: SessionId) -> Result<Hint> {
        self.manager.request_hint(session)
    }

    /// Abandon the player's active session and reset their no-repeat
    /// history for the game type
    pub fn restart_game(&self, player: PlayerId, game_type: GameType) -> Result<()> {
        self.manager.restart(player, game_type)
    }

    /// The top `limit` entries of a leaderboard bucket
    pub fn leaderboard_top(
        &self,
        game_type: GameType,
        difficulty: Difficulty,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>> {
        let mut entries = self.repos.boards.bucket(game_type, difficulty)?;
        entries.truncate(limit);
        Ok(entries)
    }

    /// The player's rank in one bucket, if they are on the board
    pub fn player_rank(
        &self,
        player: PlayerId,
        game_type: GameType,
        difficulty: Difficulty,
    ) -> Result<Option<u32>> {
        Ok(self
            .repos
            .boards
            .entry(player, game_type, difficulty)?
            .map(|e| e.rank))
    }

    /// Everything the player has unlocked
    pub fn player_achievements(&self, player: PlayerId) -> Result<Vec<Achievement>> {
        self.repos.achievements.by_player(player)
    }

    /// Run the idle-expiry sweep; returns the number of sessions expired
    pub fn expire_stale(&self) -> usize {
        self.manager.expire_stale()
    }

    /// Recompute every leaderboard bucket; returns the number of buckets
    /// refreshed
    pub fn recompute_leaderboards(&self) -> usize {
        self.ranker.recompute_all()
    }
}
