use super::merger::{FinalizeTarget, MergeResult, Merger};
use crate::audio::{plan_windows, AudioFile, ChunkWindow, TARGET_SAMPLE_RATE};
use crate::error::PipelineError;
use crate::storage::{BlobStore, LocalAudio, TranscriptKeys};
use crate::stt::SpeechRecognizer;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Result of a full pass over a recording
#[derive(Debug, Clone)]
pub struct ChunkReport {
    /// Running transcript built during the pass
    pub transcript: String,
    pub windows: usize,
    /// Indices of windows that contributed no text
    pub failed: Vec<usize>,
    pub merge: MergeResult,
}

#[derive(Debug, Clone)]
pub enum ChunkOutcome {
    Completed(ChunkReport),
    /// Cancellation was observed once the window loop finished
    Cancelled,
}

/// Transcribes a recording window by window and hands the chunks to the merger
pub struct ChunkProcessor {
    recognizer: Arc<dyn SpeechRecognizer>,
    store: Arc<dyn BlobStore>,
    keys: TranscriptKeys,
    window: Duration,
    merger: Merger,
}

impl ChunkProcessor {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        store: Arc<dyn BlobStore>,
        keys: TranscriptKeys,
        window: Duration,
        merger: Merger,
    ) -> Self {
        Self {
            recognizer,
            store,
            keys,
            window,
            merger,
        }
    }

    /// Run every window through the recognizer in order, uploading each chunk.
    ///
    /// A failed window is logged and contributes nothing. `cancel` is checked
    /// once, after the last window; a cancelled run is not merged.
    pub async fn process(
        &self,
        audio: &LocalAudio,
        session_id: &str,
        recording: &str,
        cancel: &CancellationToken,
    ) -> Result<ChunkOutcome> {
        let path = audio.path().to_path_buf();
        let samples = tokio::task::spawn_blocking(move || -> Result<Vec<i16>> {
            Ok(AudioFile::open(&path)?.to_mono_16khz())
        })
        .await
        .context("Audio decoding task panicked")??;
        let samples = Arc::new(samples);

        let windows = plan_windows(samples.len(), TARGET_SAMPLE_RATE, self.window);
        let working_path = audio.sibling(".transcript.txt");
        info!(
            "Chunked transcription started: {} windows of {}s [{}], writing {}",
            windows.len(),
            self.window.as_secs_f64(),
            self.recognizer.model_name(),
            working_path.display()
        );

        let mut working = tokio::fs::File::create(&working_path)
            .await
            .with_context(|| format!("Failed to create working file: {:?}", working_path))?;

        let mut transcript = String::new();
        let mut failed = Vec::new();

        for window in &windows {
            let text = match self.recognize(&samples, window).await {
                Ok(text) => text,
                Err(e) => {
                    self.report_failure(window, &e);
                    failed.push(window.index);
                    continue;
                }
            };

            info!(
                "Chunk {:.0}–{:.0} sec: {}",
                window.start().as_secs_f64(),
                window.end().as_secs_f64(),
                text.chars().take(60).collect::<String>()
            );

            transcript.push_str(&text);
            transcript.push(' ');
            if let Err(e) = working.write_all(format!("{} ", text).as_bytes()).await {
                warn!("Failed to append to working file: {}", e);
            }

            let key = self.keys.chunk_key(session_id, window.index);
            match self.store.upload(&key, text.into_bytes()).await {
                Ok(stored) => info!("Uploaded transcript chunk: {}", stored),
                Err(e) => {
                    self.report_failure(window, &e);
                    failed.push(window.index);
                }
            }
        }

        working.flush().await.ok();

        if cancel.is_cancelled() {
            info!("Session {} cancelled after transcription; skipping merge", session_id);
            return Ok(ChunkOutcome::Cancelled);
        }

        let merge = self
            .merger
            .merge(
                session_id,
                Some(FinalizeTarget {
                    local_audio: audio,
                    recording,
                }),
            )
            .await
            .with_context(|| format!("Failed to merge transcript for session {}", session_id))?;
        info!("Auto-merged all transcript chunks for session: {}", session_id);

        Ok(ChunkOutcome::Completed(ChunkReport {
            transcript: transcript.trim().to_string(),
            windows: windows.len(),
            failed,
            merge,
        }))
    }

    async fn recognize(&self, samples: &Arc<Vec<i16>>, window: &ChunkWindow) -> Result<String> {
        let recognizer = Arc::clone(&self.recognizer);
        let samples = Arc::clone(samples);
        let range = window.samples();

        let text = tokio::task::spawn_blocking(move || recognizer.transcribe(&samples[range]))
            .await
            .context("Recognition task panicked")??;

        Ok(text.trim().to_string())
    }

    fn report_failure(&self, window: &ChunkWindow, error: &anyhow::Error) {
        let failure = PipelineError::Chunk {
            index: window.index,
            message: format!("{:#}", error),
        };
        warn!(
            "Failed to transcribe chunk {:.0}–{:.0} sec: {}",
            window.start().as_secs_f64(),
            window.end().as_secs_f64(),
            failure
        );
    }
}
