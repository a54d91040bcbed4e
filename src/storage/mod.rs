//! Blob storage for recordings and transcripts
//!
//! - `BlobStore` - the exists/download/upload/list/delete contract the pipeline uses
//! - `LocalBlobStore` - a bucket rooted in a local directory
//! - `MemoryBlobStore` - an in-process bucket
//! - `TranscriptKeys` - deterministic names for chunk and final transcripts

mod local;
mod local_audio;
mod memory;
mod naming;

pub use local::LocalBlobStore;
pub use local_audio::LocalAudio;
pub use memory::MemoryBlobStore;
pub use naming::{base_name, blob_path, TranscriptKeys};

use anyhow::Result;

/// Storage backend holding recordings and transcript artifacts.
///
/// Keys are `/`-separated paths relative to the bucket.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Read a blob's content
    async fn fetch(&self, key: &str) -> Result<Vec<u8>>;

    /// Copy a blob to a private local file.
    ///
    /// Fails with `PipelineError::RecordingNotFound` if the blob is missing.
    async fn download(&self, key: &str) -> Result<LocalAudio>;

    /// Store `content` under `key`, returning the stored key
    async fn upload(&self, key: &str, content: Vec<u8>) -> Result<String>;

    /// Keys starting with `prefix`, sorted by name
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Externally resolvable address of a key
    fn public_url(&self, key: &str) -> String;

    /// Bucket name for logging
    fn name(&self) -> &str;
}
