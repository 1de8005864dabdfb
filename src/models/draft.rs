//! Draft model (a post being composed)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DispatchOutcome, PlatformId};

/// Kind of an attached media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image
    Image,
    /// Video clip
    Video,
}

impl MediaKind {
    /// Get kind as string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Parse kind from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "image" | "img" | "photo" => Some(Self::Image),
            "video" | "vid" => Some(Self::Video),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a locally held media item. The bytes are never read here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Opaque handle understood by whoever owns the media (usually a file path)
    pub local_handle: String,
    /// Image or video
    pub kind: MediaKind,
}

impl MediaRef {
    /// Create a new media reference
    pub fn new(local_handle: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            local_handle: local_handle.into(),
            kind,
        }
    }

    /// Parse `handle:kind` (kind defaults to image when omitted)
    pub fn parse(spec: &str) -> Option<Self> {
        match spec.rsplit_once(':') {
            Some((handle, kind)) if !handle.is_empty() => {
                MediaKind::from_str(kind).map(|kind| Self::new(handle, kind))
            }
            _ if !spec.is_empty() => Some(Self::new(spec, MediaKind::Image)),
            _ => None,
        }
    }
}

/// A post that has not been dispatched yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    /// Unique identifier (used when the draft is persisted)
    pub id: Uuid,
    /// User-authored body
    pub text: String,
    /// Target platforms. Unique; order is the order outcomes are reported in.
    pub platforms: Vec<PlatformId>,
    /// Attached media, in display order
    pub media: Vec<MediaRef>,
    /// When composition started
    pub created_at: DateTime<Utc>,
    /// Last edit
    pub updated_at: DateTime<Utc>,
}

impl Default for Draft {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            text: String::new(),
            platforms: Vec::new(),
            media: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Draft {
    /// Create a draft with the given text and no targets
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Builder-style: set targets (duplicates are dropped, first occurrence wins)
    pub fn with_platforms(mut self, platforms: impl IntoIterator<Item = PlatformId>) -> Self {
        self.platforms.clear();
        for platform in platforms {
            self.select(platform);
        }
        self
    }

    /// Builder-style: attach a media item
    pub fn with_media(mut self, media: MediaRef) -> Self {
        self.attach(media);
        self
    }

    /// Replace the text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.touch();
    }

    /// Add a target platform if not already selected
    pub fn select(&mut self, platform: PlatformId) {
        if !self.platforms.contains(&platform) {
            self.platforms.push(platform);
            self.touch();
        }
    }

    /// Remove a target platform
    pub fn deselect(&mut self, platform: PlatformId) {
        let before = self.platforms.len();
        self.platforms.retain(|p| *p != platform);
        if self.platforms.len() != before {
            self.touch();
        }
    }

    /// Toggle a target platform, returning whether it is now selected
    pub fn toggle(&mut self, platform: PlatformId) -> bool {
        if self.platforms.contains(&platform) {
            self.deselect(platform);
            false
        } else {
            self.select(platform);
            true
        }
    }

    /// Drop every platform that `outcomes` reports as posted, so a retry only
    /// goes to the ones still missing
    pub fn drop_succeeded(&mut self, outcomes: &[DispatchOutcome]) {
        for outcome in outcomes.iter().filter(|o| o.is_success()) {
            if let Some(platform) = outcome.platform() {
                self.deselect(platform);
            }
        }
    }

    /// Attach a media item
    pub fn attach(&mut self, media: MediaRef) {
        self.media.push(media);
        self.touch();
    }

    /// Whether at least one media item is attached
    pub fn has_media(&self) -> bool {
        !self.media.is_empty()
    }

    /// Length of the text in Unicode scalar values
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Reset to an empty draft (after a successful dispatch or a cancel)
    pub fn clear(&mut self) {
        self.text.clear();
        self.platforms.clear();
        self.media.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
