//! Pre-dispatch validation
//!
//! Global checks apply to the draft as a whole; platform checks apply per
//! target and never affect other targets. Failures are values, not errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{PlatformConstraints, constraints_for};
use crate::models::{Draft, MediaKind, PlatformId};

/// Shortest acceptable text, in Unicode scalar values
pub const MIN_TEXT_LENGTH: usize = 5;

/// Why a draft cannot be posted (globally or to one platform)
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum ValidationError {
    /// Text is empty
    #[error("text is empty")]
    EmptyText,
    /// Text is shorter than the minimum length
    #[error("text is too short")]
    TooShort,
    /// Platform only accepts posts with media
    #[error("platform requires at least one image or video")]
    MissingRequiredMedia,
    /// Platform does not accept this kind of media
    #[error("platform does not accept {0} attachments")]
    UnsupportedMedia(MediaKind),
    /// Text exceeds the platform's character limit (only when enforced)
    #[error("text is {length} characters, platform allows {limit}")]
    TextTooLong {
        /// Platform limit
        limit: usize,
        /// Actual length
        length: usize,
    },
}

/// Result of validating a draft for one platform
pub type ValidationOutcome = Result<(), ValidationError>;

/// Tunable validation thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Shortest acceptable text
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,
    /// Reject texts over the platform limit instead of letting the platform decide
    #[serde(default)]
    pub enforce_character_limit: bool,
}

const fn default_min_text_length() -> usize {
    MIN_TEXT_LENGTH
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_text_length: MIN_TEXT_LENGTH,
            enforce_character_limit: false,
        }
    }
}

/// Checks drafts before dispatch
#[derive(Debug, Clone, Default)]
pub struct PostValidator {
    rules: ValidationRules,
}

impl PostValidator {
    /// Create a validator with the given rules
    pub const fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    /// The rules in effect
    pub const fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Checks that apply regardless of target
    pub fn validate_global(&self, draft: &Draft) -> ValidationOutcome {
        if draft.text.is_empty() {
            return Err(ValidationError::EmptyText);
        }
        if draft.char_count() < self.rules.min_text_length {
            return Err(ValidationError::TooShort);
        }
        Ok(())
    }

    /// Checks specific to one target
    pub fn validate_for_platform(&self, draft: &Draft, platform: PlatformId) -> ValidationOutcome {
        self.validate_against(draft, &constraints_for(platform))
    }

    /// Check the draft against an explicit constraints row
    pub fn validate_against(
        &self,
        draft: &Draft,
        constraints: &PlatformConstraints,
    ) -> ValidationOutcome {
        if constraints.requires_media && !draft.has_media() {
            return Err(ValidationError::MissingRequiredMedia);
        }

        if let Some(media) = draft.media.iter().find(|m| !constraints.supports(m.kind)) {
            return Err(ValidationError::UnsupportedMedia(media.kind));
        }

        if self.rules.enforce_character_limit {
            let length = draft.char_count();
            if length > constraints.max_characters {
                return Err(ValidationError::TextTooLong {
                    limit: constraints.max_characters,
                    length,
                });
            }
        }

        Ok(())
    }

    /// Validate the draft for each of its targets, in target order.
    ///
    /// A global failure is reported against every target.
    pub fn validate(&self, draft: &Draft) -> Vec<(PlatformId, ValidationOutcome)> {
        let global = self.validate_global(draft);
        draft
            .platforms
            .iter()
            .map(|&platform| {
                let outcome = global
                    .clone()
                    .and_then(|()| self.validate_for_platform(draft, platform));
                (platform, outcome)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaRef;

    #[test]
    fn test_empty_text() {
        let v = PostValidator::default();
        assert_eq!(v.validate_global(&Draft::new("")), Err(ValidationError::EmptyText));
    }

    #[test]
    fn test_too_short() {
        let v = PostValidator::default();
        assert_eq!(v.validate_global(&Draft::new("abcd")), Err(ValidationError::TooShort));
        assert_eq!(v.validate_global(&Draft::new("abcde")), Ok(()));
        // four scalars, more than four bytes
        assert_eq!(v.validate_global(&Draft::new("äöüß")), Err(ValidationError::TooShort));
    }

    #[test]
    fn test_custom_min_length() {
        let v = PostValidator::new(ValidationRules {
            min_text_length: 1,
            ..ValidationRules::default()
        });
        assert_eq!(v.validate_global(&Draft::new("k")), Ok(()));
    }

    #[test]
    fn test_instagram_needs_media() {
        let v = PostValidator::default();
        let draft = Draft::new("valid text here");
        assert_eq!(
            v.validate_for_platform(&draft, PlatformId::Instagram),
            Err(ValidationError::MissingRequiredMedia)
        );
        assert_eq!(v.validate_for_platform(&draft, PlatformId::Twitter), Ok(()));

        let with_media = draft.with_media(MediaRef::new("cat.jpg", MediaKind::Image));
        assert_eq!(v.validate_for_platform(&with_media, PlatformId::Instagram), Ok(()));
    }

    #[test]
    fn test_media_kind_not_supported() {
        let v = PostValidator::default();
        let images_only = PlatformConstraints {
            max_characters: 500,
            supports_images: true,
            supports_video: false,
            requires_media: false,
        };
        let draft = Draft::new("valid text here")
            .with_media(MediaRef::new("cat.jpg", MediaKind::Image))
            .with_media(MediaRef::new("clip.mp4", MediaKind::Video));

        assert_eq!(
            v.validate_against(&draft, &images_only),
            Err(ValidationError::UnsupportedMedia(MediaKind::Video))
        );
        assert_eq!(
            v.validate_against(&Draft::new("valid text here"), &images_only),
            Ok(())
        );
    }

    #[test]
    fn test_length_not_enforced_by_default() {
        let v = PostValidator::default();
        let draft = Draft::new("a".repeat(400));
        assert_eq!(v.validate_for_platform(&draft, PlatformId::Twitter), Ok(()));
    }

    #[test]
    fn test_length_enforced_when_enabled() {
        let v = PostValidator::new(ValidationRules {
            enforce_character_limit: true,
            ..ValidationRules::default()
        });
        let draft = Draft::new("a".repeat(281));
        assert_eq!(
            v.validate_for_platform(&draft, PlatformId::Twitter),
            Err(ValidationError::TextTooLong {
                limit: 280,
                length: 281
            })
        );
        assert_eq!(v.validate_for_platform(&draft, PlatformId::Facebook), Ok(()));
    }

    #[test]
    fn test_validate_is_per_platform() {
        let v = PostValidator::default();
        let draft = Draft::new("Hello #world @friend https://a.com")
            .with_platforms([PlatformId::Instagram, PlatformId::Twitter]);
        let results = v.validate(&draft);
        assert_eq!(
            results,
            vec![
                (PlatformId::Instagram, Err(ValidationError::MissingRequiredMedia)),
                (PlatformId::Twitter, Ok(())),
            ]
        );
    }

    #[test]
    fn test_validate_reports_global_failure_everywhere() {
        let v = PostValidator::default();
        let draft = Draft::new("").with_platforms([PlatformId::Twitter, PlatformId::Facebook]);
        assert!(
            v.validate(&draft)
                .iter()
                .all(|(_, r)| *r == Err(ValidationError::EmptyText))
        );
    }
}
