use crate::storage::{BlobStore, LocalAudio, TranscriptKeys};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// How chunk artifacts are ordered before concatenation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkOrder {
    /// By the window index embedded in the name (`part2` before `part10`)
    #[default]
    Numeric,
    /// By plain name, so `part10` sorts before `part2`
    Lexicographic,
}

impl ChunkOrder {
    pub fn sort(&self, keys: &TranscriptKeys, chunk_keys: &mut [String]) {
        match self {
            Self::Lexicographic => chunk_keys.sort(),
            Self::Numeric => chunk_keys.sort_by(|a, b| {
                let a_index = keys.chunk_index(a).unwrap_or(usize::MAX);
                let b_index = keys.chunk_index(b).unwrap_or(usize::MAX);
                a_index.cmp(&b_index).then_with(|| a.cmp(b))
            }),
        }
    }
}

/// Inputs needed to publish the merged text as the recording's final transcript
#[derive(Debug, Clone, Copy)]
pub struct FinalizeTarget<'a> {
    pub local_audio: &'a LocalAudio,
    pub recording: &'a str,
}

#[derive(Debug, Clone)]
pub struct MergeResult {
    pub text: String,
    /// Number of chunk artifacts merged
    pub chunks: usize,
    /// Final transcript key, when finalized
    pub blob: Option<String>,
    pub url: Option<String>,
}

/// Reassembles a session's chunk artifacts into one transcript
pub struct Merger {
    store: Arc<dyn BlobStore>,
    keys: TranscriptKeys,
    order: ChunkOrder,
}

impl Merger {
    pub fn new(store: Arc<dyn BlobStore>, keys: TranscriptKeys, order: ChunkOrder) -> Self {
        Self { store, keys, order }
    }

    /// Concatenate every chunk of `session_id` in order.
    ///
    /// With a `finalize` target the text is uploaded as the final transcript and
    /// the chunk artifacts are deleted; otherwise the chunks are left in place.
    pub async fn merge(
        &self,
        session_id: &str,
        finalize: Option<FinalizeTarget<'_>>,
    ) -> Result<MergeResult> {
        let prefix = self.keys.chunk_prefix(session_id);
        let mut chunk_keys = self
            .store
            .list(&prefix)
            .await
            .with_context(|| format!("Failed to list chunks under {}", prefix))?;
        self.order.sort(&self.keys, &mut chunk_keys);

        let mut parts = Vec::with_capacity(chunk_keys.len());
        for key in &chunk_keys {
            let bytes = self.store.fetch(key).await?;
            let chunk = String::from_utf8_lossy(&bytes);
            info!("Merged: {} ({} chars)", key, chunk.len());

            let chunk = chunk.trim();
            if !chunk.is_empty() {
                parts.push(chunk.to_string());
            }
        }
        let text = parts.join(" ");

        let Some(target) = finalize else {
            return Ok(MergeResult {
                text,
                chunks: chunk_keys.len(),
                blob: None,
                url: None,
            });
        };

        let blob = self.publish_final(&text, target).await?;
        self.delete_chunks(&chunk_keys).await;
        let url = self.store.public_url(&blob);

        info!(
            "Merged {} chunks for session {} into {}",
            chunk_keys.len(),
            session_id,
            blob
        );

        Ok(MergeResult {
            text,
            chunks: chunk_keys.len(),
            blob: Some(blob),
            url: Some(url),
        })
    }

    async fn publish_final(&self, text: &str, target: FinalizeTarget<'_>) -> Result<String> {
        let local_copy = target.local_audio.sibling(".txt");
        tokio::fs::write(&local_copy, text)
            .await
            .with_context(|| format!("Failed to write transcript: {:?}", local_copy))?;

        let key = self.keys.final_key(target.recording);
        let stored = self
            .store
            .upload(&key, text.as_bytes().to_vec())
            .await
            .with_context(|| format!("Failed to upload final transcript {}", key))?;

        info!("Uploaded full transcript: {}", stored);
        Ok(stored)
    }

    async fn delete_chunks(&self, chunk_keys: &[String]) {
        for key in chunk_keys {
            match self.store.delete(key).await {
                Ok(()) => info!("Deleted chunk blob: {}", key),
                Err(e) => warn!("Failed to delete chunk blob {}: {:#}", key, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_order() {
        let keys = TranscriptKeys::default();
        let mut names: Vec<String> = [10, 2, 0, 11, 1]
            .iter()
            .map(|i| keys.chunk_key("s", *i))
            .collect();

        ChunkOrder::Numeric.sort(&keys, &mut names);
        let indices: Vec<usize> = names.iter().filter_map(|n| keys.chunk_index(n)).collect();
        assert_eq!(indices, vec![0, 1, 2, 10, 11]);
    }

    #[test]
    fn test_lexicographic_order() {
        let keys = TranscriptKeys::default();
        let mut names: Vec<String> = [10, 2, 0, 11, 1]
            .iter()
            .map(|i| keys.chunk_key("s", *i))
            .collect();

        ChunkOrder::Lexicographic.sort(&keys, &mut names);
        let indices: Vec<usize> = names.iter().filter_map(|n| keys.chunk_index(n)).collect();
        assert_eq!(indices, vec![0, 1, 10, 11, 2]);
    }
}
