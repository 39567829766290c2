mod postgrest;

pub use postgrest::SupabaseLinks;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the table holding link mappings unless configured otherwise.
pub const DEFAULT_TABLE: &str = "links";

/// One short link: token `id` resolves to the public object URL `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMapping {
    pub id: String,
    pub path: String,
}

#[derive(Debug, Error)]
pub enum LinkTableError {
    /// A row with the same id already exists.
    #[error("Link id already taken: {0}")]
    Conflict(String),
    /// The table service answered but refused the request.
    #[error("Link table rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// The table service could not be reached.
    #[error("Link table unreachable: {0}")]
    Transport(String),
    /// The table address could not be built from the configured base URL.
    #[error("Invalid link table URL: {0}")]
    InvalidUrl(String),
    #[error("Database error: {0}")]
    Database(#[from] crate::storage::DatabaseError),
}

/// Row storage for link mappings. Rows are created once and only read after.
#[async_trait]
pub trait LinkTable: Send + Sync {
    /// Insert a new mapping. Fails with [`LinkTableError::Conflict`] when the
    /// id is taken; existing rows are never overwritten.
    async fn insert(&self, link: &LinkMapping) -> Result<(), LinkTableError>;

    /// Look up the mapping for `id`, expecting at most one row.
    async fn select_one(&self, id: &str) -> Result<Option<LinkMapping>, LinkTableError>;
}
