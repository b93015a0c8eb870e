//! Config schema types (webhook delivery, media storage, metrics).

use std::{path::PathBuf, time::Duration};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HookrelayConfig {
    pub webhook: WebhookConfig,
    pub media: MediaConfig,
    pub metrics: MetricsConfig,
}

/// Subscriber endpoints and delivery tuning.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Endpoints notified for every event, in order.
    pub urls: Vec<String>,

    /// Shared HMAC secret used for `X-Hub-Signature-256`.
    #[serde(serialize_with = "serialize_secret")]
    pub secret: Secret<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Attempts per endpoint, including the first one.
    pub max_attempts: u32,

    /// Wait before the first retry; doubles after every failed attempt.
    pub initial_backoff_ms: u64,

    /// How HTTP error statuses from subscribers are treated.
    pub status_policy: StatusPolicy,

    /// What happens to the remaining endpoints when one fails.
    pub fanout: FanoutPolicy,
}

impl WebhookConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    #[must_use]
    pub fn has_secret(&self) -> bool {
        !self.secret.expose_secret().is_empty()
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            secret: Secret::new(String::new()),
            timeout_secs: 10,
            max_attempts: 5,
            initial_backoff_ms: 1_000,
            status_policy: StatusPolicy::default(),
            fanout: FanoutPolicy::default(),
        }
    }
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("urls", &self.urls)
            .field("secret", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("initial_backoff_ms", &self.initial_backoff_ms)
            .field("status_policy", &self.status_policy)
            .field("fanout", &self.fanout)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Treatment of non-success HTTP statuses returned by a subscriber.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Any HTTP response counts as delivered; only transport errors retry.
    #[default]
    AcceptAny,
    /// 5xx and 429 responses are retried like transport errors.
    RetryServerErrors,
}

/// Fan-out behaviour across multiple endpoints.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FanoutPolicy {
    /// Stop at the first endpoint that cannot be reached.
    #[default]
    StopOnFirstFailure,
    /// Try every endpoint and report all failures together.
    AttemptAll,
}

/// Where extracted media files are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub path: PathBuf,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("storages/media"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}
