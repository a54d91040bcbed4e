//! Error types for the transcription pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required request field was missing or empty
    #[error("Missing '{field}'")]
    Validation { field: &'static str },

    /// The source recording does not exist in storage
    #[error("Recording '{path}' not found in bucket '{bucket}'")]
    RecordingNotFound { path: String, bucket: String },

    /// Recognition or upload failed for a single window; tolerated
    #[error("Chunk {index} failed: {message}")]
    Chunk { index: usize, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Recognition failed: {0}")]
    Recognition(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let error = PipelineError::Validation {
            field: "recording_name",
        };
        assert_eq!(error.to_string(), "Missing 'recording_name'");
    }

    #[test]
    fn test_recording_not_found_display() {
        let error = PipelineError::RecordingNotFound {
            path: "recordings/visit.wav".to_string(),
            bucket: "local".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Recording 'recordings/visit.wav' not found in bucket 'local'"
        );
    }

    #[test]
    fn test_chunk_failure_display() {
        let error = PipelineError::Chunk {
            index: 3,
            message: "decoder hiccup".to_string(),
        };
        assert_eq!(error.to_string(), "Chunk 3 failed: decoder hiccup");
    }
}
