//! Game type and difficulty enums

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which game variant a session plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameType {
    /// Unscramble the characters of a fixed Chinese idiom
    Idiom,
    /// Reorder the word tiles of a full sentence
    Sentence,
}

impl GameType {
    /// All game types, for bucket sweeps
    pub fn all() -> [GameType; 2] {
        [GameType::Idiom, GameType::Sentence]
    }

    /// Get the canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::Idiom => "idiom",
            GameType::Sentence => "sentence",
        }
    }

    /// Parse from a string, case-insensitive
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "idiom" => Ok(GameType::Idiom),
            "sentence" => Ok(GameType::Sentence),
            other => Err(Error::InvalidArgument(format!(
                "unknown game type: {other}"
            ))),
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Difficulty tier of a question
///
/// Difficulty selects the question pool and the scoring table row;
/// it never changes the scramble algorithm itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// All difficulties, easiest first
    pub fn all() -> [Difficulty; 4] {
        [
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
            Difficulty::Expert,
        ]
    }

    /// Get the canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }

    /// Parse from a string, case-insensitive
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            other => Err(Error::InvalidArgument(format!(
                "unknown difficulty: {other}"
            ))),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for gt in GameType::all() {
            assert_eq!(GameType::parse(gt.as_str()).unwrap(), gt);
        }
        for d in Difficulty::all() {
            assert_eq!(Difficulty::parse(d.as_str()).unwrap(), d);
        }
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(GameType::parse("IDIOM").unwrap(), GameType::Idiom);
        assert_eq!(Difficulty::parse("Expert").unwrap(), Difficulty::Expert);
    }

    #[test]
    fn test_parse_unknown() {
        assert!(GameType::parse("crossword").is_err());
        assert!(Difficulty::parse("nightmare").is_err());
    }
}
