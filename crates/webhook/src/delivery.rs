//! Single-endpoint delivery: serialize, sign, POST, retry with backoff.

use std::{sync::Arc, time::Duration};

use {
    bytes::Bytes,
    hookrelay_config::{StatusPolicy, WebhookConfig},
    reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue},
    secrecy::{ExposeSecret, Secret},
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
    url::Url,
};

use crate::{
    error::{Error, Result},
    payload::NotificationPayload,
    signer::{SIGNATURE_HEADER, signature_header},
    transport::{ReqwestTransport, TransportError, WebhookRequest, WebhookTransport},
};

/// Floor for the per-request timeout; a zero timeout fails every attempt.
const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Attempt budget and backoff schedule for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first; values below 1 behave as 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &WebhookConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: config.initial_backoff(),
            request_timeout: config.timeout().max(MIN_REQUEST_TIMEOUT),
            ..Self::default()
        }
    }

    /// Wait after the `attempt`-th failure (1-based).
    #[must_use]
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

/// Delivers payloads to single endpoints with signing and bounded retry.
///
/// Holds no per-delivery state, so one engine serves concurrent callers.
#[derive(Clone)]
pub struct DeliveryEngine {
    transport: Arc<dyn WebhookTransport>,
    secret: Secret<String>,
    retry: RetryPolicy,
    status_policy: StatusPolicy,
}

impl DeliveryEngine {
    pub fn new(transport: Arc<dyn WebhookTransport>, secret: Secret<String>) -> Self {
        Self {
            transport,
            secret,
            retry: RetryPolicy::default(),
            status_policy: StatusPolicy::default(),
        }
    }

    /// Engine backed by [`ReqwestTransport`] and tuned from `config`.
    pub fn from_config(config: &WebhookConfig) -> Result<Self> {
        let retry = RetryPolicy::from_config(config);
        let transport = ReqwestTransport::new(retry.request_timeout).map_err(Error::HttpClient)?;
        Ok(Self::new(Arc::new(transport), config.secret.clone())
            .with_retry_policy(retry)
            .with_status_policy(config.status_policy))
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_status_policy(mut self, status_policy: StatusPolicy) -> Self {
        self.status_policy = status_policy;
        self
    }

    /// Serialize, sign and assemble the request for `endpoint`.
    pub fn build_request(
        &self,
        payload: &NotificationPayload,
        endpoint: &str,
    ) -> Result<WebhookRequest> {
        let body = serde_json::to_vec(payload)?;

        let url = Url::parse(endpoint).map_err(|e| Error::request_build(endpoint, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::request_build(
                endpoint,
                format_args!("unsupported scheme \"{}\"", url.scheme()),
            ));
        }

        let signature = signature_header(&body, self.secret.expose_secret().as_bytes())?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&signature).map_err(|e| Error::request_build(endpoint, e))?,
        );

        Ok(WebhookRequest {
            url,
            headers,
            body: Bytes::from(body),
        })
    }

    /// Deliver `payload` to `endpoint`, retrying transport failures.
    pub async fn deliver(&self, payload: &NotificationPayload, endpoint: &str) -> Result<()> {
        self.deliver_with_cancel(payload, endpoint, &CancellationToken::new())
            .await
    }

    /// Like [`deliver`](Self::deliver), but both the in-flight request and
    /// the backoff wait stop as soon as `cancel` fires. The resulting
    /// [`Error::Cancelled`] counts completed attempts only.
    pub async fn deliver_with_cancel(
        &self,
        payload: &NotificationPayload,
        endpoint: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let request = self.build_request(payload, endpoint)?;
        let max_attempts = self.retry.max_attempts.max(1);
        let event_type = payload.event_type();

        #[cfg(feature = "metrics")]
        let started = tokio::time::Instant::now();

        let mut attempt = 0;
        let outcome = loop {
            attempt += 1;

            #[cfg(feature = "metrics")]
            hookrelay_metrics::counter!(
                hookrelay_metrics::webhook::DELIVERY_ATTEMPTS_TOTAL,
                hookrelay_metrics::labels::ENDPOINT => endpoint.to_string()
            )
            .increment(1);

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => break Err(self.cancelled(endpoint, attempt - 1)),
                result = self.transport.post(&request) => result,
            };

            let err = match result.and_then(|status| self.check_status(endpoint, status)) {
                Ok(status) => {
                    info!(endpoint, attempt, status, event_type, "webhook delivered");
                    break Ok(());
                },
                Err(e) => e,
            };

            if attempt >= max_attempts {
                error!(endpoint, attempts = attempt, error = %err, event_type, "webhook delivery exhausted");
                break Err(Error::DeliveryExhausted {
                    endpoint: endpoint.to_string(),
                    attempts: attempt,
                    source: err,
                });
            }

            let backoff = self.retry.backoff_after(attempt);
            warn!(
                endpoint,
                attempt,
                backoff_ms = whole_millis(backoff),
                error = %err,
                "webhook delivery attempt failed, retrying"
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => break Err(self.cancelled(endpoint, attempt)),
                () = tokio::time::sleep(backoff) => {},
            }
        };

        #[cfg(feature = "metrics")]
        {
            use hookrelay_metrics::{counter, histogram, labels, webhook};

            let (name, label) = match &outcome {
                Ok(()) => (webhook::DELIVERIES_SUCCEEDED_TOTAL, "succeeded"),
                Err(Error::Cancelled { .. }) => (webhook::DELIVERIES_CANCELLED_TOTAL, "cancelled"),
                Err(_) => (webhook::DELIVERIES_EXHAUSTED_TOTAL, "exhausted"),
            };
            histogram!(webhook::DELIVERY_DURATION_SECONDS, labels::OUTCOME => label)
                .record(started.elapsed().as_secs_f64());
            counter!(
                name,
                labels::ENDPOINT => endpoint.to_string(),
                labels::EVENT_TYPE => event_type
            )
            .increment(1);
        }

        outcome
    }

    /// Apply the status policy to a received response.
    fn check_status(&self, endpoint: &str, status: u16) -> std::result::Result<u16, TransportError> {
        if (200..300).contains(&status) {
            return Ok(status);
        }
        let retryable = status >= 500 || status == 429;
        match self.status_policy {
            StatusPolicy::RetryServerErrors if retryable => Err(TransportError::Status(status)),
            StatusPolicy::AcceptAny | StatusPolicy::RetryServerErrors => {
                warn!(endpoint, status, "endpoint answered with a non-success status");
                Ok(status)
            },
        }
    }

    fn cancelled(&self, endpoint: &str, attempts: u32) -> Error {
        debug!(endpoint, attempts, "webhook delivery cancelled");
        Error::Cancelled {
            endpoint: endpoint.to_string(),
            attempts,
        }
    }
}

fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
