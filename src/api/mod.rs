//! Collaborator interfaces and platform posters
//!
//! The dispatcher talks to the outside world through three seams:
//! [`CredentialProvider`] (a bearer token per platform), [`HttpClient`]
//! (submits a built request) and [`PlatformPoster`] (turns a draft into a
//! platform-specific request). Production implementations live in
//! [`http`], [`twitter`] and [`crate::auth`]; tests swap in fakes.

pub mod http;
pub mod twitter;

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;

use crate::models::{Draft, PlatformId};

/// Supplies a bearer token per platform
#[allow(async_fn_in_trait)]
pub trait CredentialProvider {
    /// Token for `platform`, or `None` if the user never authorized it.
    ///
    /// `Err` means the provider itself broke (unreadable store, bad key) and
    /// aborts the whole dispatch.
    async fn token(&self, platform: PlatformId) -> Result<Option<String>>;
}

/// Sends a built request
#[allow(async_fn_in_trait)]
pub trait HttpClient {
    /// Submit `request`. Any HTTP status is `Ok`; only transport failures are `Err`.
    async fn submit(
        &self,
        platform: PlatformId,
        request: &PlatformRequest,
    ) -> std::result::Result<HttpResponse, TransportError>;
}

/// Builds platform-specific requests
pub trait PlatformPoster {
    /// Platform this poster handles
    fn platform(&self) -> PlatformId;

    /// Request for posting `draft` with `token`
    fn build_request(&self, draft: &Draft, token: &str) -> std::result::Result<PlatformRequest, PosterError>;

    /// Extract the platform's post id from a successful response body
    fn post_id(&self, body: &[u8]) -> Option<String>;
}

/// A POST request ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRequest {
    /// Absolute endpoint URL
    pub url: String,
    /// Header name/value pairs
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Vec<u8>,
}

impl PlatformRequest {
    /// Value of the first header named `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response from a platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Status is in `200..=299`
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }
}

/// The request never produced a response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    /// Create from any displayable cause
    pub fn new(cause: impl std::fmt::Display) -> Self {
        Self(cause.to_string())
    }
}

/// A poster could not build a request
#[derive(Debug, Error)]
pub enum PosterError {
    /// No poster exists for the platform yet
    #[error("posting to {0} is not implemented")]
    NotImplemented(PlatformId),
    /// The body could not be encoded
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Poster for one platform
pub enum Poster {
    /// Twitter v2 API
    Twitter(twitter::TwitterPoster),
    /// Caller-supplied poster
    Custom(Box<dyn PlatformPoster + Send + Sync>),
    /// Platform without a poster; every attempt fails with "not implemented"
    Unsupported(PlatformId),
}

impl Poster {
    /// Platform this poster handles
    pub fn platform(&self) -> PlatformId {
        match self {
            Poster::Twitter(p) => p.platform(),
            Poster::Custom(p) => p.platform(),
            Poster::Unsupported(platform) => *platform,
        }
    }

    /// Build the request for `draft`
    pub fn build_request(
        &self,
        draft: &Draft,
        token: &str,
    ) -> std::result::Result<PlatformRequest, PosterError> {
        match self {
            Poster::Twitter(p) => p.build_request(draft, token),
            Poster::Custom(p) => p.build_request(draft, token),
            Poster::Unsupported(platform) => Err(PosterError::NotImplemented(*platform)),
        }
    }

    /// Extract the post id from a successful response
    pub fn post_id(&self, body: &[u8]) -> Option<String> {
        match self {
            Poster::Twitter(p) => p.post_id(body),
            Poster::Custom(p) => p.post_id(body),
            Poster::Unsupported(_) => None,
        }
    }
}

impl std::fmt::Debug for Poster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Poster::Twitter(p) => f.debug_tuple("Twitter").field(p).finish(),
            Poster::Custom(p) => f.debug_tuple("Custom").field(&p.platform()).finish(),
            Poster::Unsupported(platform) => f.debug_tuple("Unsupported").field(platform).finish(),
        }
    }
}

impl<T: CredentialProvider> CredentialProvider for &T {
    async fn token(&self, platform: PlatformId) -> Result<Option<String>> {
        (**self).token(platform).await
    }
}

impl<T: CredentialProvider> CredentialProvider for Arc<T> {
    async fn token(&self, platform: PlatformId) -> Result<Option<String>> {
        (**self).token(platform).await
    }
}

impl<T: HttpClient> HttpClient for &T {
    async fn submit(
        &self,
        platform: PlatformId,
        request: &PlatformRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        (**self).submit(platform, request).await
    }
}

impl<T: HttpClient> HttpClient for Arc<T> {
    async fn submit(
        &self,
        platform: PlatformId,
        request: &PlatformRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        (**self).submit(platform, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        let ok = |status| HttpResponse { status, body: Vec::new() }.is_success();
        assert!(ok(200));
        assert!(ok(201));
        assert!(ok(299));
        assert!(!ok(199));
        assert!(!ok(300));
        assert!(!ok(500));
    }

    #[test]
    fn test_unsupported_poster() {
        let poster = Poster::Unsupported(PlatformId::Snapchat);
        let err = poster.build_request(&Draft::new("hello"), "t").unwrap_err();
        assert!(matches!(err, PosterError::NotImplemented(PlatformId::Snapchat)));
        assert_eq!(poster.platform(), PlatformId::Snapchat);
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let request = PlatformRequest {
            url: "https://example.test".to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Vec::new(),
        };
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("authorization"), None);
    }
}
