use std::fmt;

use hookrelay_protocol::MediaKind;

use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The event kind has no webhook payload.
    #[error("unsupported event type: {kind}")]
    UnsupportedEvent { kind: &'static str },

    /// A media attachment could not be stored; the whole payload is dropped.
    #[error("failed to extract {kind} media: {source}")]
    MediaExtraction {
        kind: MediaKind,
        #[source]
        source: hookrelay_media::Error,
    },

    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("failed to build request for {endpoint}: {message}")]
    RequestBuild { endpoint: String, message: String },

    #[error("failed to sign payload: {0}")]
    Signing(String),

    #[error("delivery to {endpoint} failed after {attempts} attempts: {source}")]
    DeliveryExhausted {
        endpoint: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("delivery to {endpoint} cancelled after {attempts} attempts")]
    Cancelled { endpoint: String, attempts: u32 },

    #[error("{}", PartialSummary(.delivered, .failures))]
    PartialDelivery {
        delivered: Vec<String>,
        failures: Vec<EndpointFailure>,
    },
}

impl Error {
    #[must_use]
    pub fn request_build(endpoint: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::RequestBuild {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// Endpoint the error is attributable to, if any.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::RequestBuild { endpoint, .. }
            | Self::DeliveryExhausted { endpoint, .. }
            | Self::Cancelled { endpoint, .. } => Some(endpoint),
            Self::UnsupportedEvent { .. }
            | Self::MediaExtraction { .. }
            | Self::Serialization(_)
            | Self::HttpClient(_)
            | Self::Signing(_)
            | Self::PartialDelivery { .. } => None,
        }
    }
}

/// One endpoint that could not be notified during fan-out.
#[derive(Debug)]
pub struct EndpointFailure {
    pub endpoint: String,
    pub error: Error,
}

struct PartialSummary<'a>(&'a [String], &'a [EndpointFailure]);

impl fmt::Display for PartialSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (delivered, failures) = (self.0, self.1);
        write!(
            f,
            "delivered to {} of {} endpoints",
            delivered.len(),
            delivered.len() + failures.len()
        )?;
        for failure in failures {
            write!(f, "; {}", failure.error)?;
        }
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
