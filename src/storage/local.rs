use super::{BlobStore, LocalAudio};
use crate::error::PipelineError;
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// Bucket backed by a local directory; keys map to relative file paths
pub struct LocalBlobStore {
    root: PathBuf,
    name: String,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create bucket directory: {:?}", root))?;

        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("local")
            .to_string();

        info!("Local bucket '{}' at {}", name, root.display());

        Ok(Self {
            root,
            name,
            public_base_url: public_base_url.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(PipelineError::Storage(format!("Invalid key: {}", key)).into());
        }
        Ok(self.root.join(relative))
    }

    fn key_of(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(parts.join("/"))
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalBlobStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to stat blob: {}", key)),
        }
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read blob: {}", key))
    }

    async fn download(&self, key: &str) -> Result<LocalAudio> {
        let path = self.resolve(key)?;
        info!("Downloading from: {}", key);

        if !self.exists(key).await? {
            return Err(PipelineError::RecordingNotFound {
                path: key.to_string(),
                bucket: self.name.clone(),
            }
            .into());
        }

        LocalAudio::copy_from(key, &path).await
    }

    async fn upload(&self, key: &str, content: Vec<u8>) -> Result<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write blob: {}", key))?;

        Ok(key.to_string())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        // Only the directory holding the prefix's last segment can match
        let start = match prefix.rfind('/') {
            Some(end) => self.resolve(&prefix[..end])?,
            None => self.root.clone(),
        };

        let mut keys = Vec::new();
        let mut pending = vec![start];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e).with_context(|| format!("Failed to list {:?}", dir)),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if let Some(key) = self.key_of(&path) {
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("Failed to delete blob: {}", key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
