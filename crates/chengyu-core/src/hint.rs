//! Progressive hints
//!
//! Three levels per session, requested strictly in order:
//! 1. the meaning or definition of the target,
//! 2. a structural reveal (the first character or word tile),
//! 3. a worked example (falling back to pinyin for idioms).
//!
//! Each level carries a fixed penalty from the scoring table. A fourth
//! request is an error, never a repeat of level 3.

use crate::error::{Error, Result};
use crate::score::ScoringConfig;
use crate::session::{GameSession, MAX_HINTS};
use serde::{Deserialize, Serialize};

/// Question fields the hint texts are built from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HintMaterial {
    /// Meaning or translation of the target
    pub definition: Option<String>,
    /// Pinyin transcription (idiom mode)
    pub pinyin: Option<String>,
    /// An example usage sentence
    pub example: Option<String>,
}

/// A hint issued to the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    /// The level this hint reveals, `1..=3`
    pub level: u8,
    pub text: String,
    /// Points this hint will cost at scoring time
    pub penalty: u32,
}

/// Issues hints against the session's hint counter
#[derive(Debug, Clone)]
pub struct HintProvider {
    penalties: [u32; 3],
}

impl HintProvider {
    /// Create a provider with explicit per-level penalties
    pub fn new(penalties: [u32; 3]) -> Self {
        Self { penalties }
    }

    /// Create a provider using the scoring table's penalties
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.hint_penalties)
    }

    /// Produce the next hint for an active session.
    ///
    /// Does not mutate the session; the caller persists the incremented
    /// hint counter. Fails with `InvalidState` outside `Active` and with
    /// `Exhausted` past level 3.
    pub fn next_hint(&self, session: &GameSession, material: &HintMaterial) -> Result<Hint> {
        if !session.is_active() {
            return Err(Error::InvalidState(format!(
                "cannot hint {}: not active",
                session.id
            )));
        }
        if session.hints_used >= MAX_HINTS {
            return Err(Error::Exhausted(format!(
                "{} already used all {} hints",
                session.id, MAX_HINTS
            )));
        }

        let level = session.hints_used + 1;
        let text = match level {
            1 => material
                .definition
                .clone()
                .unwrap_or_else(|| "No definition recorded for this question.".to_string()),
            2 => match session.layout.tokens.first() {
                Some(first) => format!("The answer begins with \u{300c}{first}\u{300d}."),
                None => "The answer is empty.".to_string(),
            },
            _ => material
                .example
                .clone()
                .or_else(|| material.pinyin.clone())
                .unwrap_or_else(|| "No worked example recorded for this question.".to_string()),
        };

        Ok(Hint {
            level,
            text,
            penalty: self.penalties[(level - 1) as usize],
        })
    }
}

impl Default for HintProvider {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}
