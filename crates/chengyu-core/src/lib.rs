//! Chengyu Core - game logic for the idiom/sentence unscrambling engine
//!
//! This crate holds everything with algorithmic content and no I/O:
//! - Identity newtypes for players, sessions, and question targets
//! - Deterministic seedable RNG and scramble generation
//! - Answer validation (character accuracy, tile similarity, grammar table)
//! - Pure scoring over a configuration table
//! - The 3-level hint state machine
//! - The session lifecycle state machine
//! - A mockable clock
//!
//! Storage, content loading, and orchestration live in the sibling crates.

mod error;
mod hint;
mod identity;
mod rng;
mod scramble;
mod score;
mod session;
mod time;
mod types;
mod validate;

pub use error::{Error, Result};
pub use hint::{Hint, HintMaterial, HintProvider};
pub use identity::{PlayerId, SessionId, TargetId};
pub use rng::GameRng;
pub use scramble::{char_tokens, scramble, TokenLayout};
pub use score::{DifficultyTable, ScoringConfig};
pub use session::{GameSession, HintUsageEntry, ScoreRecord, SessionStatus, MAX_HINTS};
pub use time::{Clock, ManualClock, SystemClock};
pub use types::{Difficulty, GameType};
pub use validate::{Answer, GrammarRules, Validator, Verdict};
