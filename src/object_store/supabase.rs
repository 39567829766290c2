use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use reqwest::Client;
use url::Url;

use super::{chunks, join_segments, ObjectStore, ObjectStoreError};
use crate::progress::ProgressSender;

/// Supabase Storage bucket reached over its REST API.
pub struct SupabaseStore {
    base_url: Url,
    bucket: String,
    api_key: String,
    client: Client,
}

impl SupabaseStore {
    pub fn new(client: Client, base_url: Url, bucket: &str, api_key: &str) -> Self {
        Self {
            base_url,
            bucket: bucket.to_string(),
            api_key: api_key.to_string(),
            client,
        }
    }

    fn upload_url(&self, key: &str) -> Result<Url, ObjectStoreError> {
        join_segments(
            &self.base_url,
            &["storage", "v1", "object", &self.bucket, key],
        )
    }
}

#[async_trait]
impl ObjectStore for SupabaseStore {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        progress: &ProgressSender,
    ) -> Result<(), ObjectStoreError> {
        let total = data.len() as u64;
        progress.report(0, total);

        // Progress is counted as each chunk is handed to the connection.
        let reporter = progress.clone();
        let mut sent = 0u64;
        let body = stream::iter(chunks(&data).into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            reporter.report(sent, total);
            Ok::<_, std::io::Error>(chunk)
        }));

        let resp = self
            .client
            .put(self.upload_url(key)?)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(body))
            .send()
            .await
            .map_err(|e| ObjectStoreError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(%status, %body, key, "Storage rejected upload");
            return Err(ObjectStoreError::Rejected {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(())
    }

    fn public_url(&self, key: &str) -> Result<Url, ObjectStoreError> {
        join_segments(
            &self.base_url,
            &["storage", "v1", "object", "public", &self.bucket, key],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SupabaseStore {
        SupabaseStore::new(
            Client::new(),
            Url::parse("https://proj.supabase.co").unwrap(),
            "files",
            "anon",
        )
    }

    #[test]
    fn test_public_url_follows_storage_convention() {
        let url = store().public_url("1700000000000-notes.txt").unwrap();
        assert_eq!(
            url.as_str(),
            "https://proj.supabase.co/storage/v1/object/public/files/1700000000000-notes.txt"
        );
    }

    #[test]
    fn test_upload_url_encodes_key() {
        let url = store().upload_url("1-a b/c.txt").unwrap();
        assert_eq!(
            url.as_str(),
            "https://proj.supabase.co/storage/v1/object/files/1-a%20b%2Fc.txt"
        );
    }
}
