//! Authenticity score: an advisory 0-100 heuristic of how natural a post reads
//!
//! The score starts at [`BASE_SCORE`], gains a capped bonus for personal
//! words, then loses points for hashtag/link/mention spam, for having no or
//! too many emojis, and for being very short or very long. Deductions are
//! applied in that fixed order and the result is clamped at zero only once,
//! at the very end.

use serde::{Deserialize, Serialize};

use crate::analysis::{self, AnalysisResult};

/// Starting score
pub const BASE_SCORE: f64 = 100.0;
/// Bonus per personal word
pub const PERSONAL_WORD_BONUS: f64 = 10.0;
/// Cap on the total personal-word bonus
pub const PERSONAL_WORD_BONUS_CAP: f64 = 20.0;
/// Hashtags allowed before penalties start
pub const FREE_HASHTAGS: usize = 5;
/// Penalty per hashtag over the allowance
pub const HASHTAG_PENALTY: f64 = 5.0;
/// Links allowed before penalties start
pub const FREE_LINKS: usize = 1;
/// Penalty per link over the allowance
pub const LINK_PENALTY: f64 = 15.0;
/// Mentions allowed before penalties start
pub const FREE_MENTIONS: usize = 3;
/// Penalty per mention over the allowance
pub const MENTION_PENALTY: f64 = 5.0;
/// More emojis than this is penalised, as is having none
pub const MAX_EMOJIS: usize = 5;
/// Flat emoji penalty
pub const EMOJI_PENALTY: f64 = 10.0;
/// Texts shorter than this (in scalars) are penalised
pub const SHORT_TEXT_CHARS: usize = 50;
/// Penalty for short texts
pub const SHORT_TEXT_PENALTY: f64 = 15.0;
/// Texts longer than this (in scalars) are penalised
pub const LONG_TEXT_CHARS: usize = 250;
/// Penalty for long texts
pub const LONG_TEXT_PENALTY: f64 = 10.0;

/// Tunable inputs of the scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRules {
    /// Lowercase words that read as personal voice
    #[serde(default = "default_personal_words")]
    pub personal_words: Vec<String>,
}

fn default_personal_words() -> Vec<String> {
    ["ich", "mein", "mich", "mir", "uns", "wir"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            personal_words: default_personal_words(),
        }
    }
}

/// Computes authenticity scores
#[derive(Debug, Clone, Default)]
pub struct AuthenticityScorer {
    rules: ScoringRules,
}

impl AuthenticityScorer {
    /// Create a scorer with the given rules
    pub fn new(rules: ScoringRules) -> Self {
        let personal_words = rules
            .personal_words
            .into_iter()
            .map(|w| w.to_lowercase())
            .collect();
        Self {
            rules: ScoringRules { personal_words },
        }
    }

    /// Score a text
    pub fn score(&self, text: &str) -> f64 {
        self.score_analyzed(text, &analysis::analyze(text))
    }

    /// Score a text whose analysis the caller already has
    pub fn score_analyzed(&self, text: &str, analysis: &AnalysisResult) -> f64 {
        let mut score = BASE_SCORE;

        let lowered = text.to_lowercase();
        let personal = lowered
            .split_whitespace()
            .filter(|token| self.rules.personal_words.iter().any(|w| w == token))
            .count();
        score += (personal as f64 * PERSONAL_WORD_BONUS).min(PERSONAL_WORD_BONUS_CAP);

        let hashtags = analysis.hashtags.len();
        if hashtags > FREE_HASHTAGS {
            score -= (hashtags - FREE_HASHTAGS) as f64 * HASHTAG_PENALTY;
        }

        if analysis.link_count > FREE_LINKS {
            score -= (analysis.link_count - FREE_LINKS) as f64 * LINK_PENALTY;
        }

        if analysis.mention_count > FREE_MENTIONS {
            score -= (analysis.mention_count - FREE_MENTIONS) as f64 * MENTION_PENALTY;
        }

        if analysis.emoji_count == 0 || analysis.emoji_count > MAX_EMOJIS {
            score -= EMOJI_PENALTY;
        }

        let length = text.chars().count();
        if length < SHORT_TEXT_CHARS {
            score -= SHORT_TEXT_PENALTY;
        } else if length > LONG_TEXT_CHARS {
            score -= LONG_TEXT_PENALTY;
        }

        score.max(0.0)
    }
}

/// Score with the default rules
pub fn score(text: &str) -> f64 {
    AuthenticityScorer::default().score(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_text() {
        // no emoji (-10), too short (-15)
        let s = score("");
        assert!(approx(s, 75.0), "got {s}");
        assert!(s <= 85.0 && s >= 0.0);
    }

    #[test]
    fn test_deterministic() {
        let text = "Wir lieben #rust 🦀 und ich schreibe mir Notizen";
        assert!(approx(score(text), score(text)));
    }

    #[test]
    fn test_personal_bonus_is_capped() {
        let filler = "x".repeat(60);
        // one emoji keeps the emoji rule quiet, 60+ chars keeps the length rule quiet
        let one = format!("ich 🙂 {filler}");
        let many = format!("ich mir wir uns mein 🙂 {filler}");
        assert!(approx(score(&one), 110.0));
        assert!(approx(score(&many), 120.0));
    }

    #[test]
    fn test_personal_words_are_case_insensitive() {
        let filler = "x".repeat(60);
        assert!(approx(score(&format!("ICH 🙂 {filler}")), 110.0));
    }

    #[test]
    fn test_spam_deductions() {
        let filler = "y".repeat(60);
        let text = format!(
            "#a #b #c #d #e #f #g https://a.b https://c.d @p @q @r @s @t 🙂 {filler}"
        );
        // hashtags 7 -> -10, links 2 -> -15, mentions 5 -> -10
        assert!(approx(score(&text), 65.0), "got {}", score(&text));
    }

    #[test]
    fn test_too_many_emojis() {
        let filler = "z".repeat(60);
        let text = format!("😀😀😀😀😀😀 {filler}");
        assert!(approx(score(&text), 90.0));
    }

    #[test]
    fn test_long_text() {
        let text = format!("🙂 {}", "w".repeat(300));
        assert!(approx(score(&text), 90.0));
    }

    #[test]
    fn test_clamped_at_zero() {
        let links = "https://spam.example ".repeat(12);
        assert!(approx(score(&links), 0.0));
    }

    #[test]
    fn test_custom_personal_words() {
        let scorer = AuthenticityScorer::new(ScoringRules {
            personal_words: vec!["I".to_string(), "my".to_string()],
        });
        let filler = "x".repeat(60);
        assert!(approx(scorer.score(&format!("i 🙂 {filler}")), 110.0));
        assert!(approx(scorer.score(&format!("ich 🙂 {filler}")), 100.0));
    }
}
