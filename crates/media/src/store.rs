use std::path::{Path, PathBuf};

use {
    async_trait::async_trait,
    hookrelay_protocol::{MediaAttachment, MediaKind},
    sha2::{Digest, Sha256},
    tracing::debug,
    uuid::Uuid,
};

use crate::{
    error::{Error, Result},
    mime::pick_extension,
};

/// Turns an attachment into a file the webhook payload can point at.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Store `media` under `root` and return the path of the stored file.
    async fn extract(&self, root: &Path, kind: MediaKind, media: &MediaAttachment)
    -> Result<PathBuf>;
}

/// Writes attachments to the local filesystem as `<kind>-<uuid>.<ext>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMediaStore;

impl FsMediaStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaExtractor for FsMediaStore {
    async fn extract(
        &self,
        root: &Path,
        kind: MediaKind,
        media: &MediaAttachment,
    ) -> Result<PathBuf> {
        if media.data.is_empty() {
            return Err(Error::EmptyData { kind });
        }

        if let Some(expected) = media.file_sha256.as_deref() {
            let actual = hex::encode(Sha256::digest(&media.data));
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(Error::ChecksumMismatch {
                    kind,
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| Error::io(format!("failed to create {}", root.display()), e))?;

        let ext = pick_extension(&media.mime_type, media.file_name.as_deref());
        let path = root.join(format!("{kind}-{}.{ext}", Uuid::new_v4()));

        tokio::fs::write(&path, &media.data)
            .await
            .map_err(|e| Error::io(format!("failed to write {}", path.display()), e))?;

        debug!(%kind, path = %path.display(), bytes = media.data.len(), "stored media attachment");
        Ok(path)
    }
}
