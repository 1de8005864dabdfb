//! Static per-platform constraints and platform-list parsing

use serde::Serialize;

use crate::models::{MediaKind, PlatformId};

/// Posting limits of one platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformConstraints {
    /// Maximum post length in Unicode scalar values
    pub max_characters: usize,
    /// Images may be attached
    pub supports_images: bool,
    /// Video may be attached
    pub supports_video: bool,
    /// A post without media is rejected
    pub requires_media: bool,
}

impl PlatformConstraints {
    const fn text_and_media(max_characters: usize) -> Self {
        Self {
            max_characters,
            supports_images: true,
            supports_video: true,
            requires_media: false,
        }
    }

    /// Whether a media item of this kind may be attached
    pub const fn supports(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Image => self.supports_images,
            MediaKind::Video => self.supports_video,
        }
    }
}

/// Constraints for a platform
pub const fn constraints_for(platform: PlatformId) -> PlatformConstraints {
    match platform {
        PlatformId::Twitter | PlatformId::Snapchat => PlatformConstraints::text_and_media(280),
        PlatformId::Instagram => PlatformConstraints {
            requires_media: true,
            ..PlatformConstraints::text_and_media(2200)
        },
        PlatformId::Facebook => PlatformConstraints::text_and_media(63_206),
        PlatformId::LinkedIn => PlatformConstraints::text_and_media(3000),
        PlatformId::TikTok => PlatformConstraints::text_and_media(2200),
        PlatformId::YouTube => PlatformConstraints::text_and_media(5000),
    }
}

/// Parse a comma-separated platform list.
///
/// Tokens are trimmed and matched case-insensitively by exact name. Unknown
/// tokens are dropped silently and duplicates collapse onto their first
/// occurrence, so the result keeps the order the caller wrote.
pub fn parse_platforms(text: &str) -> Vec<PlatformId> {
    let mut platforms = Vec::new();
    for token in text.split(',') {
        match token.parse::<PlatformId>() {
            Ok(platform) if !platforms.contains(&platform) => platforms.push(platform),
            Ok(_) => {}
            Err(e) => tracing::debug!("Ignoring platform token: {}", e),
        }
    }
    platforms
}
