use serde::{Deserialize, Serialize};

/// Published once a job's final transcript is available
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptReadyMessage {
    pub job_id: String,
    pub session_id: String,
    /// Recording reference as submitted
    pub recording: String,
    /// Storage key of the final transcript
    pub transcript: String,
    pub url: String,
    pub timestamp: String, // RFC3339 timestamp
}

impl TranscriptReadyMessage {
    pub fn new(
        job_id: &str,
        session_id: &str,
        recording: &str,
        transcript: &str,
        url: &str,
    ) -> Self {
        Self {
            job_id: job_id.to_string(),
            session_id: session_id.to_string(),
            recording: recording.to_string(),
            transcript: transcript.to_string(),
            url: url.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
