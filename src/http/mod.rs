//! HTTP API for submitting and tracking transcription jobs
//!
//! - POST /process-audio - Start a job; streams status lines
//! - POST /merge-transcript - Merge a session's chunks
//! - POST /cancel/:job_id - Cancel a job
//! - GET /status/:job_id - Job status
//! - GET /status/session/:session_id - Job status by session
//! - GET /health - Health check
//! - GET / - Connectivity probe

mod handlers;
mod routes;
mod state;

pub use handlers::{
    CancelResponse, ErrorResponse, MergeTranscriptResponse, SessionStatusResponse,
    StatusResponse,
};
pub use routes::create_router;
pub use state::AppState;
