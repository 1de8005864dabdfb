//! Per-platform character metadata for a piece of text

use serde::Serialize;

use crate::catalog::constraints_for;
use crate::models::PlatformId;

/// How a text measures up against one platform's character limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformMetadata {
    /// Platform measured against
    pub platform: PlatformId,
    /// Length of the text in Unicode scalar values
    pub characters: usize,
    /// The platform's limit
    pub max_characters: usize,
    /// Characters left; negative when the text is over the limit
    pub remaining: i64,
}

impl PlatformMetadata {
    /// Whether the text fits
    pub const fn fits(&self) -> bool {
        self.remaining >= 0
    }
}

/// Measure `text` against each platform, in the given order
pub fn platform_metadata(text: &str, platforms: &[PlatformId]) -> Vec<PlatformMetadata> {
    let characters = text.chars().count();
    platforms
        .iter()
        .map(|&platform| {
            let max_characters = constraints_for(platform).max_characters;
            PlatformMetadata {
                platform,
                characters,
                max_characters,
                remaining: max_characters as i64 - characters as i64,
            }
        })
        .collect()
}
