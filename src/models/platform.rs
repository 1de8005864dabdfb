//! Platform identifiers

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A social platform a draft can be dispatched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    /// Twitter / X
    Twitter,
    /// Facebook
    Facebook,
    /// Instagram (requires attached media)
    Instagram,
    /// Snapchat
    Snapchat,
    /// LinkedIn (extended catalog)
    #[serde(rename = "linkedin")]
    LinkedIn,
    /// TikTok (extended catalog)
    #[serde(rename = "tiktok")]
    TikTok,
    /// YouTube (extended catalog)
    #[serde(rename = "youtube")]
    YouTube,
}

/// Returned when a platform name matches no known platform
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl PlatformId {
    /// The platforms the dispatcher is built around
    pub const fn core() -> &'static [Self] {
        &[Self::Twitter, Self::Facebook, Self::Instagram, Self::Snapchat]
    }

    /// Every platform in the catalog, core first
    pub const fn all() -> &'static [Self] {
        &[
            Self::Twitter,
            Self::Facebook,
            Self::Instagram,
            Self::Snapchat,
            Self::LinkedIn,
            Self::TikTok,
            Self::YouTube,
        ]
    }

    /// Canonical lowercase name, as used in config files and on the command line
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Snapchat => "snapchat",
            Self::LinkedIn => "linkedin",
            Self::TikTok => "tiktok",
            Self::YouTube => "youtube",
        }
    }

    /// Display name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Twitter => "Twitter",
            Self::Facebook => "Facebook",
            Self::Instagram => "Instagram",
            Self::Snapchat => "Snapchat",
            Self::LinkedIn => "LinkedIn",
            Self::TikTok => "TikTok",
            Self::YouTube => "YouTube",
        }
    }

    /// Whether this platform belongs to the core dispatch set
    pub fn is_core(&self) -> bool {
        Self::core().contains(self)
    }
}

impl std::str::FromStr for PlatformId {
    type Err = UnknownPlatform;

    /// Exact, case-insensitive name match. No aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == lowered)
            .ok_or(UnknownPlatform(s.to_string()))
    }
}

impl std::fmt::Display for PlatformId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
