//! # crosspost
//!
//! Compose once, check it, post it to several social platforms.
//!
//! ## Overview
//!
//! crosspost analyzes a draft (hashtags, mentions, links, emojis), gives it
//! an advisory authenticity score, validates it against each target
//! platform's constraints and then dispatches it, reporting one outcome per
//! platform. A platform that rejects the draft never affects the others.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    DispatchCoordinator                      │
//! │   Validates, authorizes and submits one attempt per target  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │   Validation    │ │       API       │ │      Auth       │
//! │                 │ │                 │ │                 │
//! │ • Global rules  │ │ • HttpClient    │ │ • Encrypted     │
//! │ • Per platform  │ │ • Posters       │ │   token file    │
//! │                 │ │ • Twitter v2    │ │ • Env tokens    │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//!          │                   │                   │
//!          └───────────────────┴───────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │    Catalog      │ │    Analysis     │ │    Database     │
//! │                 │ │                 │ │                 │
//! │ • Limits        │ │ • Entities      │ │ • Drafts        │
//! │ • Media rules   │ │ • Emojis        │ │ • Dispatch log  │
//! │                 │ │ • Scoring       │ │                 │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`analysis`]: Hashtag, mention, link and emoji extraction
//! - [`api`]: Collaborator traits, platform posters, HTTP client
//! - [`auth`]: Credential providers (encrypted file, environment)
//! - [`catalog`]: Per-platform constraints
//! - [`config`]: Configuration management
//! - [`db`]: `SQLite` database for drafts and dispatch history
//! - [`dispatch`]: Multi-platform dispatch and cancellation
//! - [`models`]: Data models (Draft, PlatformId, DispatchOutcome)
//! - [`scoring`]: Authenticity score
//! - [`validation`]: Pre-dispatch checks
//!
//! ## Example
//!
//! ```no_run
//! use crosspost::auth::EnvCredentials;
//! use crosspost::api::http::{DEFAULT_TIMEOUT, ReqwestClient};
//! use crosspost::{DispatchCoordinator, Draft, PlatformId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let http = ReqwestClient::new(DEFAULT_TIMEOUT)?;
//!     let coordinator = DispatchCoordinator::new(EnvCredentials::default(), http);
//!     let draft = Draft::new("Hello from the terminal #rust")
//!         .with_platforms([PlatformId::Twitter]);
//!     for outcome in coordinator.dispatch(&draft).await? {
//!         println!("{outcome}");
//!     }
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/crosspost/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::unused_async)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::if_not_else)]
#![allow(clippy::single_match_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::use_self)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::return_self_not_must_use)]

pub mod analysis;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod models;
pub mod paths;
pub mod scoring;
pub mod validation;

// Re-export main types for convenience
pub use analysis::{AnalysisResult, PlatformMetadata, analyze, platform_metadata};
pub use catalog::{PlatformConstraints, constraints_for, parse_platforms};
pub use config::Config;
pub use db::{Database, DispatchRecord};
pub use dispatch::{
    CancelHandle, CancelSignal, DispatchAborted, DispatchCoordinator, cancellation,
};
pub use models::{
    DispatchOutcome, DispatchSummary, DispatchTarget, Draft, FailureKind, MediaKind, MediaRef,
    OutcomeStatus, PlatformId,
};
pub use scoring::AuthenticityScorer;
pub use validation::{PostValidator, ValidationError, ValidationOutcome, ValidationRules};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
