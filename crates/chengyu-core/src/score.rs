//! Scoring engine
//!
//! A pure function over a configuration table. All the tunable numbers
//! (base points, time bonus rates, multipliers, hint penalties, time
//! limits) live in [`ScoringConfig`] rather than inline in the formula.

use crate::types::Difficulty;
use serde::{Deserialize, Serialize};

/// One value per difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyTable<T> {
    pub easy: T,
    pub medium: T,
    pub hard: T,
    pub expert: T,
}

impl<T: Copy> DifficultyTable<T> {
    /// Look up the value for a difficulty
    pub fn get(&self, difficulty: Difficulty) -> T {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
            Difficulty::Expert => self.expert,
        }
    }
}

/// Scoring configuration table
///
/// Hint penalties are tiered per level (not flat): requesting levels
/// 1, 2, 3 costs 10, 20, 30 points respectively, so using all three
/// hints forfeits 60 points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Base points awarded for a correct-enough answer
    pub base: DifficultyTable<u32>,
    /// Bonus points per spare second under the time limit
    pub time_bonus_rate: DifficultyTable<u32>,
    /// Multiplier applied to the (base + time bonus) component
    pub multiplier: DifficultyTable<f64>,
    /// Time limit per question, in seconds
    pub time_limit_secs: DifficultyTable<u32>,
    /// Penalty for hint levels 1..=3, in order
    pub hint_penalties: [u32; 3],
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base: DifficultyTable {
                easy: 100,
                medium: 200,
                hard: 300,
                expert: 500,
            },
            time_bonus_rate: DifficultyTable {
                easy: 1,
                medium: 2,
                hard: 3,
                expert: 5,
            },
            multiplier: DifficultyTable {
                easy: 1.0,
                medium: 1.25,
                hard: 1.5,
                expert: 2.0,
            },
            time_limit_secs: DifficultyTable {
                easy: 120,
                medium: 120,
                hard: 90,
                expert: 60,
            },
            hint_penalties: [10, 20, 30],
        }
    }
}

impl ScoringConfig {
    /// Penalty for a single hint level (1..=3); 0 for anything else
    pub fn hint_penalty(&self, level: u8) -> u32 {
        match level {
            1..=3 => self.hint_penalties[(level - 1) as usize],
            _ => 0,
        }
    }

    /// Cumulative penalty for having used the first `hints_used` levels
    pub fn total_hint_penalty(&self, hints_used: u8) -> u32 {
        (1..=hints_used.min(3)).map(|l| self.hint_penalty(l)).sum()
    }

    /// Compute the final score for a completed game.
    ///
    /// ```text
    /// raw = (base + spare_seconds * rate) * accuracy * multiplier - hint_penalty
    /// final = max(0, round(raw))
    /// ```
    ///
    /// Late submissions (`time_taken > time_limit`) are scoreable but earn
    /// no time bonus. The result is floored at zero, never negative.
    pub fn score(
        &self,
        difficulty: Difficulty,
        time_limit_secs: u32,
        time_taken_secs: u32,
        hints_used: u8,
        accuracy: f64,
    ) -> u32 {
        let base = self.base.get(difficulty) as f64;
        let spare = time_limit_secs.saturating_sub(time_taken_secs);
        let time_bonus = (spare * self.time_bonus_rate.get(difficulty)) as f64;
        let accuracy = accuracy.clamp(0.0, 1.0);
        let raw = (base + time_bonus) * accuracy * self.multiplier.get(difficulty)
            - self.total_hint_penalty(hints_used) as f64;
        raw.round().max(0.0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easy_reference_score() {
        let cfg = ScoringConfig::default();
        // (100 + 75 * 1) * 1.0 * 1.0 - 0
        let score = cfg.score(Difficulty::Easy, 120, 45, 0, 1.0);
        assert_eq!(score, 175);
    }

    #[test]
    fn test_pure_function() {
        let cfg = ScoringConfig::default();
        let a = cfg.score(Difficulty::Hard, 90, 30, 1, 0.75);
        let b = cfg.score(Difficulty::Hard, 90, 30, 1, 0.75);
        assert_eq!(a, b);
    }

    #[test]
    fn test_late_submission_no_time_bonus() {
        let cfg = ScoringConfig::default();
        let on_limit = cfg.score(Difficulty::Medium, 120, 120, 0, 1.0);
        let late = cfg.score(Difficulty::Medium, 120, 300, 0, 1.0);
        assert_eq!(on_limit, late);
        assert_eq!(late, 250); // 200 * 1.25
    }

    #[test]
    fn test_hints_never_increase_score() {
        let cfg = ScoringConfig::default();
        let mut prev = u32::MAX;
        for hints in 0..=3u8 {
            let score = cfg.score(Difficulty::Easy, 120, 60, hints, 1.0);
            assert!(score <= prev);
            prev = score;
        }
    }

    #[test]
    fn test_tiered_penalties() {
        let cfg = ScoringConfig::default();
        assert_eq!(cfg.total_hint_penalty(0), 0);
        assert_eq!(cfg.total_hint_penalty(1), 10);
        assert_eq!(cfg.total_hint_penalty(2), 30);
        assert_eq!(cfg.total_hint_penalty(3), 60);
        // Over-range input is clamped, not expanded
        assert_eq!(cfg.total_hint_penalty(7), 60);
    }

    #[test]
    fn test_never_negative() {
        let cfg = ScoringConfig::default();
        // Zero accuracy with all hints used would go negative unclamped
        assert_eq!(cfg.score(Difficulty::Easy, 120, 119, 3, 0.0), 0);
    }

    #[test]
    fn test_accuracy_scales_score() {
        let cfg = ScoringConfig::default();
        let full = cfg.score(Difficulty::Expert, 60, 30, 0, 1.0);
        let half = cfg.score(Difficulty::Expert, 60, 30, 0, 0.5);
        assert!(half < full);
        assert_eq!(half * 2, full);
    }
}
