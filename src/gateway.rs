//! Gateway transport.
//!
//! [`GatewayTransport`] is the seam between the dispatcher and the network:
//! one call performs one HTTP POST for one chunk and returns the raw status
//! and body. [`HttpTransport`] is the production implementation on reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use thiserror::Error;

use crate::planner::RequestChunk;

/// Raw outcome of one chunk request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunkResult {
    pub status: u16,
    pub body: String,
    /// Registration ids carried by the chunk; filled in by the dispatcher
    pub recipients: usize,
}

impl RawChunkResult {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            recipients: 0,
        }
    }

    pub fn with_recipients(mut self, recipients: usize) -> Self {
        self.recipients = recipients;
        self
    }
}

/// Transport-level failure: no HTTP status was obtained
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to encode request body: {0}")]
    Encode(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Sends a single chunk to the gateway
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn post(
        &self,
        endpoint: &str,
        api_key: &str,
        chunk: &RequestChunk,
    ) -> Result<RawChunkResult, TransportError>;
}

/// reqwest-backed transport. The response body is read to completion before
/// returning so the connection goes back to the pool on every path.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(request_timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("gcm-sender"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl GatewayTransport for HttpTransport {
    async fn post(
        &self,
        endpoint: &str,
        api_key: &str,
        chunk: &RequestChunk,
    ) -> Result<RawChunkResult, TransportError> {
        let body = serde_json::to_string(chunk).map_err(|e| TransportError::Encode(e.to_string()))?;

        let response = self
            .http
            .post(endpoint)
            .header(AUTHORIZATION, format!("key={}", api_key))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RawChunkResult::new(status, body))
    }
}
