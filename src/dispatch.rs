//! Multi-platform dispatch
//!
//! A dispatch first runs the global checks; if those fail the whole draft is
//! rejected with a single outcome and nothing touches the network. Otherwise
//! each target platform goes through its own attempt:
//!
//! ```text
//! Pending -> Validating -> Skipped
//!                       -> Authorizing -> Failed
//!                                      -> Submitting -> Failed | Succeeded
//! ```
//!
//! Attempts share nothing but the read-only draft and the collaborators, so a
//! skip or failure on one platform never affects another. Outcomes come back
//! in the draft's target order whether attempts run one after another or
//! concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tokio::sync::watch;

use crate::api::twitter::TwitterPoster;
use crate::api::{CredentialProvider, HttpClient, Poster, PosterError};
use crate::models::{DispatchOutcome, Draft, FailureKind, PlatformId};
use crate::validation::PostValidator;

/// Where a single platform attempt is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStage {
    /// Not started
    Pending,
    /// Running platform checks
    Validating,
    /// Platform checks failed (terminal)
    Skipped,
    /// Looking up the credential
    Authorizing,
    /// Request in flight
    Submitting,
    /// Terminal failure
    Failed,
    /// Terminal success
    Succeeded,
}

impl std::fmt::Display for AttemptStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Validating => "validating",
            Self::Skipped => "skipped",
            Self::Authorizing => "authorizing",
            Self::Submitting => "submitting",
            Self::Failed => "failed",
            Self::Succeeded => "succeeded",
        };
        f.write_str(s)
    }
}

/// Create a linked cancel handle / signal pair
pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, CancelSignal { rx })
}

/// Requests cancellation of an in-flight dispatch
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Cancel. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observed by a dispatch to learn it was cancelled
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; never resolves if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Combined stop condition for one dispatch: the caller's signal or the
/// dispatch's own abort after a credential provider failure
#[derive(Clone, Copy)]
struct Stop<'a> {
    caller: &'a CancelSignal,
    abort: &'a CancelSignal,
}

impl Stop<'_> {
    fn is_set(&self) -> bool {
        self.caller.is_cancelled() || self.abort.is_cancelled()
    }

    async fn wait(&self) {
        tokio::select! {
            () = self.caller.cancelled() => {}
            () = self.abort.cancelled() => {}
        }
    }
}

/// The credential provider failed, so the dispatch stopped early
#[derive(Debug, Error)]
#[error("Credential lookup for {platform} failed: {source}")]
pub struct DispatchAborted {
    /// Platform whose lookup failed
    pub platform: PlatformId,
    /// Outcomes of every other target, in target order
    pub partial: Vec<DispatchOutcome>,
    /// The provider's error
    #[source]
    pub source: anyhow::Error,
}

/// Targets in order, first occurrence wins
fn unique_targets(platforms: &[PlatformId]) -> Vec<PlatformId> {
    let mut targets = Vec::with_capacity(platforms.len());
    for &platform in platforms {
        if !targets.contains(&platform) {
            targets.push(platform);
        }
    }
    targets
}

/// Fans a draft out to its target platforms
pub struct DispatchCoordinator<C, H> {
    credentials: C,
    http: H,
    validator: PostValidator,
    posters: HashMap<PlatformId, Poster>,
    concurrent: bool,
}

impl<C, H> DispatchCoordinator<C, H>
where
    C: CredentialProvider,
    H: HttpClient,
{
    /// Coordinator with default validation, the stock Twitter poster, and
    /// concurrent attempts
    pub fn new(credentials: C, http: H) -> Self {
        let posters = PlatformId::all()
            .iter()
            .map(|&platform| {
                let poster = match platform {
                    PlatformId::Twitter => Poster::Twitter(TwitterPoster::default()),
                    other => Poster::Unsupported(other),
                };
                (platform, poster)
            })
            .collect();

        Self {
            credentials,
            http,
            validator: PostValidator::default(),
            posters,
            concurrent: true,
        }
    }

    /// Replace the validator
    pub fn with_validator(mut self, validator: PostValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Install a poster, replacing whatever handled its platform before
    pub fn with_poster(mut self, poster: Poster) -> Self {
        self.posters.insert(poster.platform(), poster);
        self
    }

    /// Run attempts concurrently (`true`) or one after another (`false`)
    pub fn with_concurrency(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// The validator in use
    pub const fn validator(&self) -> &PostValidator {
        &self.validator
    }

    /// Dispatch `draft` to all of its targets
    pub async fn dispatch(&self, draft: &Draft) -> Result<Vec<DispatchOutcome>, DispatchAborted> {
        self.dispatch_with_cancel(draft, &CancelSignal::never()).await
    }

    /// Dispatch `draft`, stopping early when `cancel` fires.
    ///
    /// Platforms that already succeeded keep their outcome; anything still
    /// pending or in flight is reported as cancelled. A duplicated target is
    /// attempted once, at its first position.
    ///
    /// When the credential provider itself fails, no further request is sent:
    /// the remaining attempts end as cancelled and the outcomes gathered so
    /// far come back inside [`DispatchAborted`].
    pub async fn dispatch_with_cancel(
        &self,
        draft: &Draft,
        cancel: &CancelSignal,
    ) -> Result<Vec<DispatchOutcome>, DispatchAborted> {
        if let Err(reason) = self.validator.validate_global(draft) {
            tracing::warn!(draft = %draft.id, %reason, "Draft rejected before dispatch");
            return Ok(vec![DispatchOutcome::rejected(reason)]);
        }

        let targets = unique_targets(&draft.platforms);
        if targets.is_empty() {
            tracing::warn!(draft = %draft.id, "Draft has no target platforms");
            return Ok(Vec::new());
        }

        tracing::info!(
            draft = %draft.id,
            platforms = targets.len(),
            concurrent = self.concurrent,
            "Dispatching draft"
        );

        let (abort, aborted) = cancellation();
        let abort = &abort;
        let stop = Stop {
            caller: cancel,
            abort: &aborted,
        };

        let results = if self.concurrent {
            join_all(targets.iter().map(|&platform| async move {
                let result = self.attempt(draft, platform, stop).await;
                if result.is_err() {
                    abort.cancel();
                }
                (platform, result)
            }))
            .await
        } else {
            let mut results = Vec::with_capacity(targets.len());
            for &platform in &targets {
                let result = self.attempt(draft, platform, stop).await;
                if result.is_err() {
                    abort.cancel();
                }
                results.push((platform, result));
            }
            results
        };

        let mut outcomes = Vec::with_capacity(results.len());
        let mut failure = None;
        for (platform, result) in results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(source) if failure.is_none() => failure = Some((platform, source)),
                Err(source) => {
                    tracing::error!(
                        platform = %platform,
                        error = %source,
                        "Credential lookup failed"
                    );
                }
            }
        }

        match failure {
            None => Ok(outcomes),
            Some((platform, source)) => {
                tracing::error!(
                    draft = %draft.id,
                    platform = %platform,
                    error = %source,
                    "Dispatch aborted"
                );
                Err(DispatchAborted {
                    platform,
                    partial: outcomes,
                    source,
                })
            }
        }
    }

    /// One platform attempt. `Err` only when the credential provider fails.
    async fn attempt(
        &self,
        draft: &Draft,
        platform: PlatformId,
        stop: Stop<'_>,
    ) -> anyhow::Result<DispatchOutcome> {
        tracing::debug!(platform = %platform, stage = %AttemptStage::Validating);
        if let Err(reason) = self.validator.validate_for_platform(draft, platform) {
            tracing::warn!(platform = %platform, stage = %AttemptStage::Skipped, %reason);
            return Ok(DispatchOutcome::skipped(platform, reason));
        }

        if stop.is_set() {
            return Ok(Self::failed(platform, FailureKind::Cancelled));
        }

        tracing::debug!(platform = %platform, stage = %AttemptStage::Authorizing);
        let token = tokio::select! {
            biased;
            () = stop.wait() => return Ok(Self::failed(platform, FailureKind::Cancelled)),
            token = self.credentials.token(platform) => token?,
        };
        let Some(token) = token else {
            return Ok(Self::failed(platform, FailureKind::NoCredential));
        };

        let Some(poster) = self.posters.get(&platform) else {
            return Ok(Self::failed(platform, FailureKind::NotImplemented));
        };
        let request = match poster.build_request(draft, &token) {
            Ok(request) => request,
            Err(PosterError::NotImplemented(_)) => {
                return Ok(Self::failed(platform, FailureKind::NotImplemented));
            }
            Err(e) => return Ok(Self::failed(platform, FailureKind::Transport(e.to_string()))),
        };

        tracing::debug!(platform = %platform, stage = %AttemptStage::Submitting, url = %request.url);
        let response = tokio::select! {
            biased;
            () = stop.wait() => return Ok(Self::failed(platform, FailureKind::Cancelled)),
            response = self.http.submit(platform, &request) => response,
        };

        let outcome = match response {
            Ok(response) if response.is_success() => {
                let post_id = poster.post_id(&response.body);
                tracing::info!(
                    platform = %platform,
                    stage = %AttemptStage::Succeeded,
                    post_id = post_id.as_deref().unwrap_or("-"),
                    "Posted"
                );
                DispatchOutcome::succeeded(platform, post_id)
            }
            Ok(response) => Self::failed(platform, FailureKind::ServerError(response.status)),
            Err(e) => Self::failed(platform, FailureKind::Transport(e.0)),
        };
        Ok(outcome)
    }

    fn failed(platform: PlatformId, reason: FailureKind) -> DispatchOutcome {
        tracing::warn!(platform = %platform, stage = %AttemptStage::Failed, %reason);
        DispatchOutcome::failed(platform, reason)
    }
}
