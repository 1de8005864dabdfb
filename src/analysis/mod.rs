//! Post content analysis
//!
//! Pure functions over raw post text. Every function is total: empty or
//! malformed input yields zero counts, never an error.

mod emoji;
pub mod metadata;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use emoji::is_emoji;
pub use metadata::{PlatformMetadata, platform_metadata};

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("hashtag pattern is valid"));

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+").expect("mention pattern is valid"));

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[A-Za-z0-9./?=_-]+").expect("link pattern is valid"));

/// Multiplier applied to `words + emojis` by [`estimate_engagement_boost`]
pub const ENGAGEMENT_BOOST_FACTOR: f64 = 1.2;

/// Everything the analyzer extracts from one text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Hashtag words without the leading `#`, left to right
    pub hashtags: Vec<String>,
    /// Number of `@word` mentions
    pub mention_count: usize,
    /// Number of http(s) links
    pub link_count: usize,
    /// Number of emoji scalars
    pub emoji_count: usize,
}

/// Run every extractor over `text`
pub fn analyze(text: &str) -> AnalysisResult {
    AnalysisResult {
        hashtags: extract_hashtags(text),
        mention_count: count_mentions(text),
        link_count: count_links(text),
        emoji_count: count_emojis(text),
    }
}

/// Hashtag words (without `#`) in order of appearance
pub fn extract_hashtags(text: &str) -> Vec<String> {
    HASHTAG_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Number of `@word` mentions
pub fn count_mentions(text: &str) -> usize {
    MENTION_RE.find_iter(text).count()
}

/// Number of `http://` / `https://` links
pub fn count_links(text: &str) -> usize {
    LINK_RE.find_iter(text).count()
}

/// Number of emoji scalars. Multi-scalar sequences (flags, ZWJ families) are
/// not merged: each emoji scalar in them counts once.
pub fn count_emojis(text: &str) -> usize {
    text.chars().filter(|c| is_emoji(*c)).count()
}

/// Number of whitespace-delimited words
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Rough engagement estimate: `(words + emojis) * 1.2`
pub fn estimate_engagement_boost(text: &str) -> f64 {
    (count_words(text) + count_emojis(text)) as f64 * ENGAGEMENT_BOOST_FACTOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_text() {
        let result = analyze("Hello #world @friend https://a.com");
        assert_eq!(
            result,
            AnalysisResult {
                hashtags: vec!["world".to_string()],
                mention_count: 1,
                link_count: 1,
                emoji_count: 0,
            }
        );
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(analyze(""), AnalysisResult::default());
        assert!(estimate_engagement_boost("").abs() < f64::EPSILON);
    }

    #[test]
    fn test_hashtags_in_order_without_prefix() {
        assert_eq!(
            extract_hashtags("#rust is #fun, #rust_lang2024 and # alone"),
            vec!["rust", "fun", "rust_lang2024"]
        );
    }

    #[test]
    fn test_adjacent_hashtags_do_not_overlap() {
        assert_eq!(extract_hashtags("#a#b##c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unicode_hashtag() {
        assert_eq!(extract_hashtags("#München #café"), vec!["München", "café"]);
    }

    #[test]
    fn test_mentions() {
        assert_eq!(count_mentions("@a @b_c hi @ nobody"), 2);
        // mail addresses look like mentions to the matcher
        assert_eq!(count_mentions("me@example.com"), 1);
    }

    #[test]
    fn test_links() {
        assert_eq!(
            count_links("see http://x.io/a?b=c and https://y.org/p_q-r, not ftp://z"),
            2
        );
        assert_eq!(count_links("https:// nothing"), 0);
    }

    #[test]
    fn test_emojis_counted_per_scalar() {
        assert_eq!(count_emojis("hi 😀🚀"), 2);
        // regional indicator pair: two scalars
        assert_eq!(count_emojis("🇩🇪"), 2);
        // keycap sequence: no emoji scalar
        assert_eq!(count_emojis("1\u{FE0F}\u{20E3}"), 0);
    }

    #[test]
    fn test_engagement_boost() {
        let boost = estimate_engagement_boost("two words 🎉");
        // 3 words + 1 emoji
        assert!((boost - 4.8).abs() < 1e-9);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let text = "#a @b https://c.d 😀 #e";
        assert_eq!(analyze(text), analyze(text));
    }
}
