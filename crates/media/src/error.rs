use hookrelay_protocol::MediaKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} attachment has no data")]
    EmptyData { kind: MediaKind },

    #[error("{kind} checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        kind: MediaKind,
        expected: String,
        actual: String,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
