//! Answer validation
//!
//! Idiom mode compares characters position-wise; sentence mode compares
//! ordered word tiles with a normalized edit distance plus a coarse grammar
//! check driven by a pluggable rule table. Validation never fails for
//! data-shape reasons: an empty submission is simply incorrect.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A submitted answer, matching the session's game type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    /// The assembled idiom string
    Idiom(String),
    /// The ordered list of placed word tiles
    Tiles(Vec<String>),
}

impl Answer {
    /// Render the answer as submitted text for the score record
    pub fn as_text(&self) -> String {
        match self {
            Answer::Idiom(s) => s.clone(),
            Answer::Tiles(tiles) => tiles.concat(),
        }
    }
}

/// Outcome of checking a submission against its target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Exact match against the target
    pub correct: bool,
    /// Position-wise accuracy (idiom) or normalized similarity (sentence),
    /// always in `0.0..=1.0`, and `1.0` iff `correct`
    pub accuracy: f64,
    /// Coarse grammar credit in `0..=100`; always full credit for idioms
    pub grammar: u32,
}

/// Expected word-role sequences keyed by grammar pattern
///
/// This is a lookup table, not a parser. A pattern with no entry awards
/// full credit: free-form validation is not the contract here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrammarRules {
    rules: HashMap<String, Vec<String>>,
}

impl GrammarRules {
    /// Create an empty rule table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the expected role order for a pattern
    pub fn insert(&mut self, pattern: impl Into<String>, roles: Vec<String>) {
        self.rules.insert(pattern.into(), roles);
    }

    /// Look up the expected role order for a pattern
    pub fn expected(&self, pattern: &str) -> Option<&[String]> {
        self.rules.get(pattern).map(|r| r.as_slice())
    }
}

/// Stateless answer checker holding the grammar rule table
#[derive(Debug, Clone, Default)]
pub struct Validator {
    grammar: GrammarRules,
}

impl Validator {
    /// Create a validator with the given grammar rules
    pub fn new(grammar: GrammarRules) -> Self {
        Self { grammar }
    }

    /// Check an idiom submission.
    ///
    /// Accuracy is matching positions over `max(target_len, submitted_len)`,
    /// so neither truncation nor padding can reach 1.0 without an exact
    /// match.
    pub fn check_idiom(&self, target: &str, submitted: &str) -> Verdict {
        if submitted.is_empty() {
            return Verdict {
                correct: false,
                accuracy: 0.0,
                grammar: 100,
            };
        }
        if submitted == target {
            return Verdict {
                correct: true,
                accuracy: 1.0,
                grammar: 100,
            };
        }

        let target_chars: Vec<char> = target.chars().collect();
        let submitted_chars: Vec<char> = submitted.chars().collect();
        let total = target_chars.len().max(submitted_chars.len());
        let matching = target_chars
            .iter()
            .zip(submitted_chars.iter())
            .filter(|(a, b)| a == b)
            .count();
        let accuracy = if total == 0 {
            0.0
        } else {
            matching as f64 / total as f64
        };

        Verdict {
            correct: false,
            accuracy,
            grammar: 100,
        }
    }

    /// Check a sentence submission.
    ///
    /// `target_roles` is parallel to `target_tiles`; `pattern` keys the
    /// grammar rule table. Missing roles or an unknown pattern award full
    /// grammar credit.
    pub fn check_sentence(
        &self,
        target_tiles: &[String],
        target_roles: &[String],
        pattern: Option<&str>,
        submitted: &[String],
    ) -> Verdict {
        if submitted.is_empty() {
            return Verdict {
                correct: false,
                accuracy: 0.0,
                grammar: 0,
            };
        }

        let correct = submitted == target_tiles;
        let accuracy = if correct {
            1.0
        } else {
            sequence_similarity(target_tiles, submitted)
        };
        let grammar = self.grammar_score(target_tiles, target_roles, pattern, submitted);

        Verdict {
            correct,
            accuracy,
            grammar,
        }
    }

    /// Score word order against the expected role sequence for the pattern
    fn grammar_score(
        &self,
        target_tiles: &[String],
        target_roles: &[String],
        pattern: Option<&str>,
        submitted: &[String],
    ) -> u32 {
        let expected = match pattern.and_then(|p| self.grammar.expected(p)) {
            Some(expected) => expected,
            None => return 100,
        };
        if target_roles.len() != target_tiles.len() || expected.is_empty() {
            return 100;
        }

        // Role of each tile, taken from the target layout
        let role_of: HashMap<&str, &str> = target_tiles
            .iter()
            .zip(target_roles.iter())
            .map(|(t, r)| (t.as_str(), r.as_str()))
            .collect();

        let in_position = expected
            .iter()
            .zip(submitted.iter())
            .filter(|(want, tile)| role_of.get(tile.as_str()) == Some(&want.as_str()))
            .count();
        (in_position * 100 / expected.len()) as u32
    }
}

/// Normalized similarity between two ordered tile sequences:
/// `1 - levenshtein / max_len`, so 1.0 means identical and 0.0 no relation
fn sequence_similarity(a: &[String], b: &[String]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

fn levenshtein(a: &[String], b: &[String]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ta) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, tb) in b.iter().enumerate() {
            let cost = if ta == tb { 0 } else { 1 };
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiles(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_idiom_exact_match() {
        let v = Validator::default();
        let verdict = v.check_idiom("一帆风顺", "一帆风顺");
        assert!(verdict.correct);
        assert_eq!(verdict.accuracy, 1.0);
    }

    #[test]
    fn test_idiom_partial_match() {
        let v = Validator::default();
        // First and last characters in place
        let verdict = v.check_idiom("一帆风顺", "一风帆顺");
        assert!(!verdict.correct);
        assert_eq!(verdict.accuracy, 0.5);
    }

    #[test]
    fn test_idiom_permutation_never_reaches_one() {
        let v = Validator::default();
        let verdict = v.check_idiom("一帆风顺", "顺风帆一");
        assert!(!verdict.correct);
        assert!(verdict.accuracy < 1.0);
        assert!(verdict.accuracy >= 0.0);
    }

    #[test]
    fn test_idiom_length_mismatch() {
        let v = Validator::default();
        // Four of five positions match; denominator is the longer length
        let verdict = v.check_idiom("一帆风顺", "一帆风顺顺");
        assert!(!verdict.correct);
        assert_eq!(verdict.accuracy, 4.0 / 5.0);

        let truncated = v.check_idiom("一帆风顺", "一帆");
        assert!(!truncated.correct);
        assert_eq!(truncated.accuracy, 0.5);
    }

    #[test]
    fn test_empty_submission() {
        let v = Validator::default();
        let verdict = v.check_idiom("一帆风顺", "");
        assert!(!verdict.correct);
        assert_eq!(verdict.accuracy, 0.0);

        let verdict = v.check_sentence(&tiles(&["我", "来"]), &[], None, &[]);
        assert!(!verdict.correct);
        assert_eq!(verdict.accuracy, 0.0);
    }

    #[test]
    fn test_sentence_exact_match() {
        let v = Validator::default();
        let target = tiles(&["我", "喜欢", "学习", "中文"]);
        let verdict = v.check_sentence(&target, &[], None, &target);
        assert!(verdict.correct);
        assert_eq!(verdict.accuracy, 1.0);
        assert_eq!(verdict.grammar, 100);
    }

    #[test]
    fn test_sentence_similarity_bounds() {
        let v = Validator::default();
        let target = tiles(&["我", "喜欢", "学习", "中文"]);
        let swapped = tiles(&["喜欢", "我", "学习", "中文"]);
        let verdict = v.check_sentence(&target, &[], None, &swapped);
        assert!(!verdict.correct);
        assert!(verdict.accuracy > 0.0 && verdict.accuracy < 1.0);

        let unrelated = tiles(&["他", "不", "吃", "鱼"]);
        let verdict = v.check_sentence(&target, &[], None, &unrelated);
        assert_eq!(verdict.accuracy, 0.0);
    }

    #[test]
    fn test_grammar_unknown_pattern_full_credit() {
        let v = Validator::default();
        let target = tiles(&["我", "喜欢", "中文"]);
        let verdict = v.check_sentence(&target, &[], Some("svo"), &target);
        assert_eq!(verdict.grammar, 100);
    }

    #[test]
    fn test_grammar_rule_table() {
        let mut rules = GrammarRules::new();
        rules.insert("svo", tiles(&["subject", "verb", "object"]));
        let v = Validator::new(rules);

        let target = tiles(&["我", "喜欢", "中文"]);
        let roles = tiles(&["subject", "verb", "object"]);

        let good = v.check_sentence(&target, &roles, Some("svo"), &target);
        assert_eq!(good.grammar, 100);

        // Only the verb slot survives the reversal
        let bad = v.check_sentence(
            &target,
            &roles,
            Some("svo"),
            &tiles(&["中文", "喜欢", "我"]),
        );
        assert!(!bad.correct);
        assert_eq!(bad.grammar, 33);
    }

    #[test]
    fn test_answer_text() {
        assert_eq!(Answer::Idiom("一帆风顺".into()).as_text(), "一帆风顺");
        assert_eq!(Answer::Tiles(tiles(&["我", "来"])).as_text(), "我来");
    }
}
