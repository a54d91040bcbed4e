//! Transcription pipeline
//!
//! A job moves through: transcript-exists short-circuit → download →
//! `ChunkProcessor` (sequential windows) → `Merger` → notification.

mod chunker;
mod job;
mod merger;

pub use chunker::{ChunkOutcome, ChunkProcessor, ChunkReport};
pub use job::{run_job, submit_job};
pub use merger::{ChunkOrder, FinalizeTarget, MergeResult, Merger};

use crate::jobs::JobRegistry;
use crate::nats::Notifier;
use crate::storage::{BlobStore, TranscriptKeys};
use crate::stt::SpeechRecognizer;
use std::sync::Arc;
use std::time::Duration;

/// Collaborators and settings shared by every job
#[derive(Clone)]
pub struct PipelineContext {
    pub registry: Arc<JobRegistry>,
    pub store: Arc<dyn BlobStore>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub notifier: Arc<dyn Notifier>,
    pub keys: TranscriptKeys,
    pub chunk_window: Duration,
    pub chunk_order: ChunkOrder,
}

impl PipelineContext {
    pub fn merger(&self) -> Merger {
        Merger::new(Arc::clone(&self.store), self.keys.clone(), self.chunk_order)
    }

    pub fn chunk_processor(&self) -> ChunkProcessor {
        ChunkProcessor::new(
            Arc::clone(&self.recognizer),
            Arc::clone(&self.store),
            self.keys.clone(),
            self.chunk_window,
            self.merger(),
        )
    }
}
