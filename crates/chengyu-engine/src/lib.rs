//! Chengyu Engine - session orchestration over pluggable storage
//!
//! This crate ties the pure game logic in `chengyu-core` and the question
//! catalog in `chengyu-content` to a set of repository traits:
//! - `SessionManager` drives the start/hint/submit/restart lifecycle
//! - `LeaderboardRanker` recomputes `(game_type, difficulty)` buckets
//! - `AchievementEvaluator` runs the unlock rules after each game
//! - `GameService` is the facade the transport layer calls
//! - `JobRunner` hosts the expiry sweep and leaderboard refresh threads
//!
//! `MemoryStore` implements every repository trait behind one mutex;
//! `chengyu-db` provides the persistent implementation.

mod achievements;
mod error;
mod jobs;
mod memory;
mod ranking;
mod repo;
mod service;
mod sessions;

pub use achievements::{Achievement, AchievementEvaluator, AchievementType, PlayerStats};
pub use error::{Error, Result};
pub use jobs::JobRunner;
pub use memory::MemoryStore;
pub use ranking::{LeaderboardEntry, LeaderboardRanker};
pub use repo::{
    AchievementRepository, HintLogRepository, HistoryRepository, LeaderboardRepository, Repos,
    ScoreRepository, SessionCompletion, SessionRepository,
};
pub use service::{GameService, SubmitResult};
pub use sessions::{SessionConfig, SessionManager, StartedGame, SubmitOutcome};
