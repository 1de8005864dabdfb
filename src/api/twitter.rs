//! Twitter (X) v2 poster

use serde::{Deserialize, Serialize};

use crate::models::{Draft, PlatformId};

use super::{PlatformPoster, PlatformRequest, PosterError};

/// Default create-tweet endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.twitter.com/2/tweets";

/// Builds `POST /2/tweets` requests
#[derive(Debug, Clone)]
pub struct TwitterPoster {
    endpoint: String,
}

impl TwitterPoster {
    /// Create a poster targeting `endpoint`
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for TwitterPoster {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl PlatformPoster for TwitterPoster {
    fn platform(&self) -> PlatformId {
        PlatformId::Twitter
    }

    fn build_request(&self, draft: &Draft, token: &str) -> Result<PlatformRequest, PosterError> {
        let body = serde_json::to_vec(&CreateTweetRequest { text: &draft.text })?;

        Ok(PlatformRequest {
            url: self.endpoint.clone(),
            headers: vec![
                ("Authorization".to_string(), format!("Bearer {token}")),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body,
        })
    }

    fn post_id(&self, body: &[u8]) -> Option<String> {
        serde_json::from_slice::<CreateTweetResponse>(body)
            .ok()
            .map(|response| response.data.id)
    }
}

// ==================== API Types ====================

#[derive(Debug, Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: TweetData,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let poster = TwitterPoster::default();
        let draft = Draft::new("Hello \"world\"");
        let request = poster.build_request(&draft, "tok123").unwrap();

        assert_eq!(request.url, DEFAULT_ENDPOINT);
        assert_eq!(request.header("Authorization"), Some("Bearer tok123"));
        assert_eq!(request.header("Content-Type"), Some("application/json"));

        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body, serde_json::json!({ "text": "Hello \"world\"" }));
    }

    #[test]
    fn test_media_is_not_sent() {
        let draft = Draft::new("with media")
            .with_media(crate::models::MediaRef::new("a.png", crate::models::MediaKind::Image));
        let request = TwitterPoster::default().build_request(&draft, "t").unwrap();
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body.as_object().map(serde_json::Map::len), Some(1));
    }

    #[test]
    fn test_post_id_from_response() {
        let poster = TwitterPoster::default();
        let body = br#"{"data":{"id":"1445880548472328192","text":"hi"}}"#;
        assert_eq!(poster.post_id(body), Some("1445880548472328192".to_string()));
        assert_eq!(poster.post_id(b"not json"), None);
    }

    #[test]
    fn test_custom_endpoint_trimmed() {
        let poster = TwitterPoster::new("http://localhost:8080/2/tweets/");
        assert_eq!(poster.endpoint(), "http://localhost:8080/2/tweets");
    }
}
