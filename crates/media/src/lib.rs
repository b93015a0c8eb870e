//! Media extraction: persist decrypted attachments under a storage root and
//! hand back the path that webhook payloads reference.

pub mod error;
pub mod mime;
pub mod store;

pub use {
    error::{Error, Result},
    store::{FsMediaStore, MediaExtractor},
};
