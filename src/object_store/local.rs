use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use url::Url;

use super::{chunks, join_segments, ObjectStore, ObjectStoreError};
use crate::progress::ProgressSender;

/// Local filesystem bucket for self-hosted deployments and tests.
/// Objects are published by this server under `/public/{bucket}/{key}`.
pub struct LocalStore {
    base_path: PathBuf,
    bucket: String,
    public_base: Url,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(
        base_path: P,
        bucket: &str,
        public_base: Url,
    ) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            bucket: bucket.to_string(),
            public_base,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        let path = self.object_path(key)?;
        if !path.exists() {
            return Err(ObjectStoreError::NotFound(key.to_string()));
        }
        let data = tokio::fs::read(&path).await?;
        Ok(Bytes::from(data))
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
            return Err(ObjectStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        _content_type: &str,
        progress: &ProgressSender,
    ) -> Result<(), ObjectStoreError> {
        let path = self.object_path(key)?;
        let total = data.len() as u64;
        progress.report(0, total);

        let mut file = tokio::fs::File::create(&path).await?;
        let mut written = 0u64;
        for chunk in chunks(&data) {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            progress.report(written, total);
        }
        file.flush().await?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> Result<Url, ObjectStoreError> {
        self.object_path(key)?;
        join_segments(&self.public_base, &["public", &self.bucket, key])
    }
}
