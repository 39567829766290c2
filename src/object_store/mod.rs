mod local;
mod supabase;

pub use local::LocalStore;
pub use supabase::SupabaseStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use url::Url;

use crate::progress::ProgressSender;

/// Bytes per chunk when streaming a payload and reporting progress.
pub const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Invalid object key: {0}")]
    InvalidKey(String),
    #[error("Upload failed with status {status}: {reason}")]
    Rejected { status: u16, reason: String },
    #[error("Network error during upload: {0}")]
    Transport(String),
}

/// Abstraction over the bucket that holds shared payloads.
/// Writes overwrite an existing object under the same key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key`, reporting bytes sent on `progress`.
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        progress: &ProgressSender,
    ) -> Result<(), ObjectStoreError>;

    /// Public address of the object stored under `key`. Derived without a
    /// round-trip.
    fn public_url(&self, key: &str) -> Result<Url, ObjectStoreError>;
}

/// Split `data` into zero-copy chunks of at most [`CHUNK_SIZE`] bytes.
pub(crate) fn chunks(data: &Bytes) -> Vec<Bytes> {
    (0..data.len())
        .step_by(CHUNK_SIZE)
        .map(|start| data.slice(start..(start + CHUNK_SIZE).min(data.len())))
        .collect()
}

/// Append `segments` to `base`, percent-encoding each one as a single path
/// segment.
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, ObjectStoreError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ObjectStoreError::InvalidKey(format!("cannot-be-a-base URL: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
