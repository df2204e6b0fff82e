//! Session lifecycle management
//!
//! `SessionManager` owns the state machine around [`GameSession`]:
//! starting a game (question selection, scramble), scoring a submission,
//! issuing hints, restarting, and the idle-expiry sweep. At most one
//! session per player is `Active` at any time; `start` refuses to create a
//! second one rather than silently abandoning the first.

use crate::error::{Error, Result};
use crate::repo::{Repos, SessionCompletion};
use chengyu_content::{ContentSource, Question};
use chengyu_core::{
    Answer, Clock, Difficulty, Error as CoreError, GameRng, GameSession, GameType, Hint,
    HintProvider, HintUsageEntry, PlayerId, ScoreRecord, ScoringConfig, SessionId, SessionStatus,
    TargetId, TokenLayout, Validator, Verdict,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Tunables for session handling
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub scoring: ScoringConfig,
    /// Sessions idle longer than this (measured from `started_at`) are
    /// swept to `Expired`
    pub idle_threshold: chrono::Duration,
    /// Exclude targets the player has already played
    pub no_repeat: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            idle_threshold: chrono::Duration::minutes(30),
            no_repeat: true,
        }
    }
}

/// What the presentation layer needs to render a freshly started game
#[derive(Debug, Clone, PartialEq)]
pub struct StartedGame {
    pub session: SessionId,
    pub player: PlayerId,
    pub game_type: GameType,
    pub difficulty: Difficulty,
    /// The scrambled tokens presented to the player
    pub scrambled: Vec<String>,
    pub time_limit_secs: u32,
}

/// Result of scoring a submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub session: SessionId,
    pub verdict: Verdict,
    pub score: u32,
    pub record: ScoreRecord,
}

/// Owns session lifecycle operations against injected storage and content
pub struct SessionManager {
    repos: Repos,
    content: Arc<dyn ContentSource>,
    validator: Validator,
    hints: HintProvider,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    rng: Mutex<GameRng>,
    next_id: AtomicU64,
}

impl SessionManager {
    pub fn new(
        repos: Repos,
        content: Arc<dyn ContentSource>,
        validator: Validator,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let hints = HintProvider::from_config(&config.scoring);
        let seed = clock.now().timestamp_millis() as u64;
        Self {
            repos,
            content,
            validator,
            hints,
            config,
            clock,
            rng: Mutex::new(GameRng::new(seed)),
            next_id: AtomicU64::new(seed),
        }
    }

    /// Replace the RNG, for deterministic question selection in tests
    pub fn with_rng(self, rng: GameRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            ..self
        }
    }

    /// Start a new game for the player.
    ///
    /// Fails with `InvalidState` if the player already has an active
    /// session, with `NotFound` if the content pool for the requested
    /// `(game_type, difficulty)` is empty, and with `Exhausted` when
    /// no-repeat mode has no unseen target left.
    pub fn start(
        &self,
        player: PlayerId,
        game_type: GameType,
        difficulty: Difficulty,
    ) -> Result<StartedGame> {
        // Fast-fail check. The one-active-session invariant itself is
        // enforced by the conditional `insert_active` below, which also
        // covers two starts racing past this read.
        if let Some(existing) = self.repos.sessions.find_active_by_player(player)? {
            return Err(CoreError::InvalidState(format!(
                "{player} already has an active session ({})",
                existing.id
            ))
            .into());
        }

        let pool = self.content.list_targets(game_type, difficulty)?;
        if pool.is_empty() {
            return Err(CoreError::NotFound(format!(
                "no {game_type} questions at {difficulty}"
            ))
            .into());
        }

        let pool: Vec<Question> = if self.config.no_repeat {
            let seen = self.repos.history.seen(player, game_type)?;
            pool.into_iter()
                .filter(|q| !seen.contains(&q.id))
                .collect()
        } else {
            pool
        };
        if pool.is_empty() {
            return Err(CoreError::Exhausted(format!(
                "{player} has completed every {game_type} question at {difficulty}"
            ))
            .into());
        }

        let (question, layout) = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            let question = rng
                .pick(&pool)
                .cloned()
                .ok_or_else(|| CoreError::NotFound("empty question pool".to_string()))?;
            let layout = TokenLayout::scramble(question.tokens.clone(), &mut rng);
            (question, layout)
        };

        let id = SessionId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let session = GameSession::new(
            id,
            player,
            game_type,
            difficulty,
            question.id.clone(),
            question.text.clone(),
            layout,
            self.clock.now(),
        );
        self.repos.sessions.insert_active(&session)?;

        Ok(StartedGame {
            session: id,
            player,
            game_type,
            difficulty,
            scrambled: session.layout.scrambled,
            time_limit_secs: self.config.scoring.time_limit_secs.get(difficulty),
        })
    }

    /// Score a submission and complete the session.
    ///
    /// A second submit on the same session fails with `InvalidState`; the
    /// conditional `finish` in the repository guarantees only one submit
    /// can win even under concurrency.
    pub fn submit(
        &self,
        session_id: SessionId,
        answer: &Answer,
        time_taken_secs: u32,
    ) -> Result<SubmitOutcome> {
        let session = self
            .repos
            .sessions
            .get(session_id)?
            .ok_or_else(|| CoreError::NotFound(session_id.to_string()))?;
        if !session.is_active() {
            return Err(CoreError::InvalidState(format!(
                "{session_id} is not active ({:?})",
                session.status
            ))
            .into());
        }

        let verdict = self.check(&session, answer)?;
        let difficulty = session.difficulty;
        let time_limit = self.config.scoring.time_limit_secs.get(difficulty);
        let now = self.clock.now();

        // The score depends on the hint counter, and a concurrent hint can
        // still land between the read above and the finish. The completion
        // is guarded on the counter the score was computed from; on a
        // mismatch, re-read and re-score. Bounded, since the counter only
        // climbs to the hint cap.
        let mut hints_used = session.hints_used;
        let (finished, score) = loop {
            let score = self.config.scoring.score(
                difficulty,
                time_limit,
                time_taken_secs,
                hints_used,
                verdict.accuracy,
            );
            match self.repos.sessions.finish(
                session_id,
                SessionCompletion {
                    status: SessionStatus::Completed,
                    at: now,
                    score: Some(score),
                    expected_hints: Some(hints_used),
                },
            ) {
                Ok(finished) => break (finished, score),
                Err(Error::Core(CoreError::InvalidState(_))) => {
                    let current = self
                        .repos
                        .sessions
                        .get(session_id)?
                        .ok_or_else(|| CoreError::NotFound(session_id.to_string()))?;
                    if !current.is_active() {
                        return Err(CoreError::InvalidState(format!(
                            "{session_id} is not active ({:?})",
                            current.status
                        ))
                        .into());
                    }
                    hints_used = current.hints_used;
                }
                Err(e) => return Err(e),
            }
        };

        let record = ScoreRecord {
            session: session_id,
            player: finished.player,
            game_type: finished.game_type,
            difficulty,
            target_text: finished.target_text.clone(),
            submitted_text: answer.as_text(),
            score,
            time_taken_secs,
            hints_used: finished.hints_used,
            accuracy: verdict.accuracy,
            completed: true,
            recorded_at: now,
        };
        self.repos.scores.insert(&record)?;
        self.repos
            .history
            .mark_seen(finished.player, finished.game_type, &finished.target_id)?;

        Ok(SubmitOutcome {
            session: session_id,
            verdict,
            score,
            record,
        })
    }

    fn check(&self, session: &GameSession, answer: &Answer) -> Result<Verdict> {
        match (session.game_type, answer) {
            (GameType::Idiom, Answer::Idiom(text)) => {
                Ok(self.validator.check_idiom(&session.target_text, text))
            }
            (GameType::Sentence, Answer::Tiles(tiles)) => {
                // Roles and pattern come from the catalog; a question that
                // was removed by a reload still validates, with full
                // grammar credit.
                let (roles, pattern) = match self.content.get(&session.target_id)? {
                    Some(q) => (q.roles, q.grammar_pattern),
                    None => (Vec::new(), None),
                };
                Ok(self.validator.check_sentence(
                    &session.layout.tokens,
                    &roles,
                    pattern.as_deref(),
                    tiles,
                ))
            }
            (game_type, _) => Err(CoreError::InvalidArgument(format!(
                "answer shape does not match {game_type} mode"
            ))
            .into()),
        }
    }

    /// Issue the next hint level for an active session and log it
    pub fn request_hint(&self, session_id: SessionId) -> Result<Hint> {
        let session = self
            .repos
            .sessions
            .get(session_id)?
            .ok_or_else(|| CoreError::NotFound(session_id.to_string()))?;

        let material = self
            .content
            .get(&session.target_id)?
            .map(|q| q.hint_material())
            .unwrap_or_default();
        let hint = self.hints.next_hint(&session, &material)?;

        self.repos.sessions.record_hint(session_id, hint.level)?;
        self.repos.hint_log.append(&HintUsageEntry {
            session: session_id,
            level: hint.level,
            penalty: hint.penalty,
            used_at: self.clock.now(),
        })?;
        Ok(hint)
    }

    /// Abandon any active session and clear the player's no-repeat history
    /// for the game type. This is the explicit "reset progress" operation.
    pub fn restart(&self, player: PlayerId, game_type: GameType) -> Result<()> {
        if let Some(active) = self.repos.sessions.find_active_by_player(player)? {
            self.repos.sessions.finish(
                active.id,
                SessionCompletion {
                    status: SessionStatus::Abandoned,
                    at: self.clock.now(),
                    score: None,
                    expected_hints: None,
                },
            )?;
        }
        self.repos.history.clear(player, game_type)?;
        Ok(())
    }

    /// Sweep every active session older than the idle threshold to
    /// `Expired`. Failures on individual sessions are logged and skipped
    /// so one bad record cannot block the sweep.
    ///
    /// Returns the number of sessions expired.
    pub fn expire_stale(&self) -> usize {
        let now = self.clock.now();
        let cutoff = now - self.config.idle_threshold;

        let active = match self.repos.sessions.active_sessions() {
            Ok(active) => active,
            Err(e) => {
                log::warn!("expiry sweep could not list active sessions: {e}");
                return 0;
            }
        };

        let mut expired = 0;
        for session in active {
            if session.started_at >= cutoff {
                continue;
            }
            let completion = SessionCompletion {
                status: SessionStatus::Expired,
                at: now,
                score: None,
                expected_hints: None,
            };
            match self.repos.sessions.finish(session.id, completion) {
                Ok(_) => expired += 1,
                Err(Error::Core(CoreError::InvalidState(_))) => {
                    // Lost the race to a submit; that's fine
                }
                Err(e) => log::warn!("could not expire {}: {e}", session.id),
            }
        }
        expired
    }
}
