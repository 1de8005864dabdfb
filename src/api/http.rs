//! `reqwest`-backed HTTP client

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::models::PlatformId;

use super::{HttpClient, HttpResponse, PlatformRequest, TransportError};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Production [`HttpClient`]
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Create a client with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("crosspost/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    async fn submit(
        &self,
        platform: PlatformId,
        request: &PlatformRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .body(request.body.clone())
            .send()
            .await
            .map_err(TransportError::new)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(TransportError::new)?.to_vec();

        tracing::debug!(platform = %platform, status, bytes = body.len(), "Response received");

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client = ReqwestClient::new(Duration::from_secs(2)).unwrap();
        let request = PlatformRequest {
            // port 9 (discard) on loopback: connection refused
            url: "http://127.0.0.1:9/2/tweets".to_string(),
            headers: Vec::new(),
            body: b"{}".to_vec(),
        };
        let result = client.submit(PlatformId::Twitter, &request).await;
        assert!(result.is_err());
    }
}
