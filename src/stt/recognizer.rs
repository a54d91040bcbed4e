use anyhow::Result;
use std::sync::Arc;

/// Speech-to-text engine.
///
/// Calls are blocking and may take seconds; the pipeline runs them on the
/// blocking thread pool, one window at a time per job.
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe 16kHz mono 16-bit PCM
    fn transcribe(&self, audio: &[i16]) -> Result<String>;

    /// Name of the loaded model, for logging
    fn model_name(&self) -> &str;
}

impl<T: SpeechRecognizer + ?Sized> SpeechRecognizer for Arc<T> {
    fn transcribe(&self, audio: &[i16]) -> Result<String> {
        (**self).transcribe(audio)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
