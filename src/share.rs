//! Upload orchestration: store a payload, then publish a short link for it.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::links::{LinkMapping, LinkTable, LinkTableError};
use crate::object_store::{ObjectStore, ObjectStoreError};
use crate::progress::ProgressSender;
use crate::token::TokenGenerator;

/// Fresh tokens tried before giving up on a run of id conflicts.
pub const MAX_TOKEN_ATTEMPTS: usize = 5;

const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN: &str = "text/plain";

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("Please select a file first.")]
    NoFile,
    #[error("Please paste some text first.")]
    EmptyText,
    #[error("Upload failed: {0}")]
    Upload(#[from] ObjectStoreError),
    /// The object is stored but no link points at it.
    #[error("Failed to save link to database.")]
    SaveLink(#[source] LinkTableError),
}

impl ShareError {
    /// Rejected before anything was sent anywhere.
    pub fn is_validation(&self) -> bool {
        matches!(self, ShareError::NoFile | ShareError::EmptyText)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PayloadKind {
    File,
    Text,
}

/// Bytes to share along with how to name and label them.
#[derive(Debug, Clone)]
pub struct Payload {
    kind: PayloadKind,
    name: String,
    data: Bytes,
    content_type: String,
}

impl Payload {
    /// A user-selected file. The name is reduced to its final path segment;
    /// a missing or blank name means nothing was selected.
    pub fn file(
        name: Option<&str>,
        data: Bytes,
        declared_type: Option<&str>,
    ) -> Result<Self, ShareError> {
        let name = name
            .and_then(|n| n.rsplit(['/', '\\']).next())
            .map(str::trim)
            .filter(|n| !n.is_empty() && *n != "." && *n != "..")
            .ok_or(ShareError::NoFile)?;

        // Prefer the declared type unless it is the generic fallback.
        let content_type = declared_type
            .filter(|ct| !ct.is_empty() && *ct != OCTET_STREAM)
            .map(str::to_string)
            .or_else(|| mime_guess::from_path(name).first().map(|m| m.to_string()))
            .unwrap_or_else(|| OCTET_STREAM.to_string());

        Ok(Self {
            kind: PayloadKind::File,
            name: name.to_string(),
            data,
            content_type,
        })
    }

    /// Pasted text, stored as a `.txt` object. Surrounding whitespace is dropped.
    pub fn text(input: &str) -> Result<Self, ShareError> {
        let content = input.trim();
        if content.is_empty() {
            return Err(ShareError::EmptyText);
        }
        Ok(Self {
            kind: PayloadKind::Text,
            name: "text.txt".to_string(),
            data: Bytes::copy_from_slice(content.as_bytes()),
            content_type: TEXT_PLAIN.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Storage key for this payload. The timestamp keeps unrelated uploads
    /// with the same name apart.
    pub fn object_key(&self, timestamp_ms: i64) -> String {
        match self.kind {
            PayloadKind::File => format!("{timestamp_ms}-{}", self.name),
            PayloadKind::Text => format!("{timestamp_ms}.txt"),
        }
    }
}

/// A published short link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortLink {
    /// Token stored in the link table.
    pub id: String,
    /// `{origin}/#{id}`, the address handed to the user.
    pub link: String,
    /// Public URL of the stored object.
    pub path: String,
    /// Storage key of the object.
    pub key: String,
}

/// Stores payloads and records the short links that point at them.
pub struct Sharer {
    store: Arc<dyn ObjectStore>,
    links: Arc<dyn LinkTable>,
    tokens: TokenGenerator,
    origin: String,
}

impl Sharer {
    /// `public_origin` is the address short links are served from; only its
    /// scheme, host and port are used.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        links: Arc<dyn LinkTable>,
        tokens: TokenGenerator,
        public_origin: &Url,
    ) -> Self {
        Self {
            store,
            links,
            tokens,
            origin: public_origin.origin().ascii_serialization(),
        }
    }

    pub fn short_link(&self, token: &str) -> String {
        format!("{}/#{token}", self.origin)
    }

    pub async fn upload(
        &self,
        payload: Payload,
        progress: ProgressSender,
    ) -> Result<ShortLink, ShareError> {
        self.upload_at(payload, progress, Utc::now().timestamp_millis())
            .await
    }

    /// Upload with an explicit key timestamp.
    ///
    /// `progress` always receives a terminal event: `Failed` if the transfer
    /// fails, `Completed` once the object is stored, even if saving the link
    /// fails afterwards.
    pub async fn upload_at(
        &self,
        payload: Payload,
        progress: ProgressSender,
        timestamp_ms: i64,
    ) -> Result<ShortLink, ShareError> {
        let key = payload.object_key(timestamp_ms);
        tracing::debug!(
            key = %key,
            name = payload.name(),
            kind = ?payload.kind,
            bytes = payload.data().len(),
            "Uploading payload"
        );

        let path = match self.transfer(&key, &payload, &progress).await {
            Ok(path) => path,
            Err(e) => {
                progress.fail();
                tracing::warn!(key = %key, error = %e, "Upload failed");
                return Err(ShareError::Upload(e));
            }
        };
        progress.complete();

        let id = self.save_link(&path).await.map_err(|e| {
            tracing::error!(key = %key, path = %path, error = %e, "Stored object has no link");
            ShareError::SaveLink(e)
        })?;

        tracing::debug!(id = %id, key = %key, "Created short link");
        Ok(ShortLink {
            link: self.short_link(&id),
            id,
            path,
            key,
        })
    }

    async fn transfer(
        &self,
        key: &str,
        payload: &Payload,
        progress: &ProgressSender,
    ) -> Result<String, ObjectStoreError> {
        self.store
            .put(key, payload.data().clone(), payload.content_type(), progress)
            .await?;
        Ok(self.store.public_url(key)?.to_string())
    }

    /// Insert a mapping for `path` under a fresh token, drawing a new token
    /// whenever the table reports the id as taken.
    async fn save_link(&self, path: &str) -> Result<String, LinkTableError> {
        let mut attempt = 1;
        loop {
            let link = LinkMapping {
                id: self.tokens.generate(),
                path: path.to_string(),
            };
            match self.links.insert(&link).await {
                Ok(()) => return Ok(link.id),
                Err(LinkTableError::Conflict(id)) if attempt < MAX_TOKEN_ATTEMPTS => {
                    tracing::debug!(id = %id, attempt, "Token already taken, drawing another");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
