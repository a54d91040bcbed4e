use super::{BlobStore, LocalAudio};
use crate::error::PipelineError;
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Bucket held in process memory
pub struct MemoryBlobStore {
    name: String,
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
    uploads: AtomicUsize,
    fail_deletes: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blobs: RwLock::new(BTreeMap::new()),
            uploads: AtomicUsize::new(0),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// Number of `upload` calls so far
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Make every subsequent `delete` fail
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn keys(&self) -> Vec<String> {
        self.blobs.read().await.keys().cloned().collect()
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.blobs.read().await.contains_key(key))
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("Blob not found: {}", key))
    }

    async fn download(&self, key: &str) -> Result<LocalAudio> {
        let bytes = self.blobs.read().await.get(key).cloned();
        match bytes {
            Some(bytes) => LocalAudio::from_bytes(key, &bytes).await,
            None => Err(PipelineError::RecordingNotFound {
                path: key.to_string(),
                bucket: self.name.clone(),
            }
            .into()),
        }
    }

    async fn upload(&self, key: &str, content: Vec<u8>) -> Result<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.blobs.write().await.insert(key.to_string(), content);
        Ok(key.to_string())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let blobs = self.blobs.read().await;
        Ok(blobs
            .range(prefix.to_string()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(PipelineError::Storage(format!("Delete refused: {}", key)).into());
        }
        self.blobs
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| anyhow!("Blob not found: {}", key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://{}/{}", self.name, key)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_by_prefix_is_sorted() -> Result<()> {
        let store = MemoryBlobStore::default();
        store.upload("t/s_part2.txt", vec![]).await?;
        store.upload("t/s_part10.txt", vec![]).await?;
        store.upload("t/other.txt", vec![]).await?;

        assert_eq!(
            store.list("t/s_part").await?,
            vec!["t/s_part10.txt", "t/s_part2.txt"]
        );
        assert_eq!(store.upload_count(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_failing_deletes() -> Result<()> {
        let store = MemoryBlobStore::default();
        store.upload("a", vec![1]).await?;
        store.set_fail_deletes(true);

        assert!(store.delete("a").await.is_err());
        assert!(store.exists("a").await?);
        Ok(())
    }
}
