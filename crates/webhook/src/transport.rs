//! Outbound HTTP transport.

use std::time::Duration;

use {
    async_trait::async_trait,
    bytes::Bytes,
    reqwest::header::HeaderMap,
    tracing::debug,
    url::Url,
};

/// A fully built, signed webhook request. Cloned per attempt.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Transport-level failure of one attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    /// Only produced when the status policy treats the status as retryable.
    #[error("endpoint responded with HTTP {0}")]
    Status(u16),
}

/// Sends one POST and reports the HTTP status.
///
/// Any response, whatever its status, is `Ok`; errors are reserved for
/// requests that got no response.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post(&self, request: &WebhookRequest) -> Result<u16, TransportError>;
}

/// `reqwest`-backed transport with a per-request timeout.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hookrelay/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl WebhookTransport for ReqwestTransport {
    async fn post(&self, request: &WebhookRequest) -> Result<u16, TransportError> {
        let response = self
            .client
            .post(request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(self.timeout)
                } else if e.is_connect() {
                    TransportError::Connect(e.to_string())
                } else {
                    TransportError::Request(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        debug!(url = %request.url, status, "webhook response received");
        Ok(status)
    }
}
