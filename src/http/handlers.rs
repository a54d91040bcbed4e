use super::state::AppState;
use crate::error::PipelineError;
use crate::jobs::{status_stream, CancelOutcome, JobStatus};
use crate::pipeline::submit_job;
use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct MergeTranscriptResponse {
    pub message: String,
    pub length: usize,
    pub session_id: String,
    /// Final transcript key; null when the merge was not finalized
    pub merged_blob: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub job_id: String,
    pub status: JobStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub job_id: String,
    pub status: JobStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Read a required string field from a JSON body.
///
/// The body is parsed whatever its Content-Type. A field that is absent, not a
/// string, or blank is reported as missing.
fn required_field(body: &Bytes, field: &'static str) -> Result<String, Response> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        debug!("Rejected request body: {}", e);
        error_response(StatusCode::BAD_REQUEST, "Invalid JSON body")
    })?;

    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                PipelineError::Validation { field }.to_string(),
            )
        })
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /process-audio
/// Start a transcription job and stream its status as text lines.
///
/// Body: `{"recording_name": "<gs://, https:// or bucket path>"}`
pub async fn process_audio(State(state): State<AppState>, body: Bytes) -> Response {
    let recording_name = match required_field(&body, "recording_name") {
        Ok(name) => name,
        Err(rejection) => return rejection,
    };

    let ticket = match submit_job(&state.pipeline, &state.dispatcher, &recording_name).await {
        Ok(ticket) => ticket,
        Err(e) => {
            error!("Failed to queue job for {}: {:#}", recording_name, e);
            return error_response(StatusCode::SERVICE_UNAVAILABLE, "Service is shutting down");
        }
    };

    let lines = status_stream(
        Arc::clone(state.registry()),
        &ticket,
        state.stream,
        state.shutdown.clone(),
    )
        .await
        .map(Ok::<_, Infallible>);

    (
        StatusCode::ACCEPTED,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(lines),
    )
        .into_response()
}

/// POST /merge-transcript
/// Merge a session's uploaded chunks without finalizing.
///
/// Body: `{"session_id": ".."}`
pub async fn merge_transcript(State(state): State<AppState>, body: Bytes) -> Response {
    let session_id = match required_field(&body, "session_id") {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };

    match state.pipeline.merger().merge(&session_id, None).await {
        Ok(result) => {
            info!(
                "Merged {} chunks for session {} ({} chars)",
                result.chunks,
                session_id,
                result.text.chars().count()
            );
            (
                StatusCode::OK,
                Json(MergeTranscriptResponse {
                    message: "Transcript merged".to_string(),
                    length: result.text.chars().count(),
                    session_id,
                    merged_blob: result.blob,
                    url: result.url,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Merge failed for session {}: {:#}", session_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Merge failed")
        }
    }
}

/// POST /cancel/:job_id
/// Request cooperative cancellation of a job
pub async fn cancel_job(State(state): State<AppState>, Path(job_id): Path<String>) -> Response {
    match state.registry().cancel(&job_id).await {
        Some(CancelOutcome::Cancelled) => (
            StatusCode::OK,
            Json(CancelResponse {
                message: format!("Job {} cancelled", job_id),
            }),
        )
            .into_response(),
        Some(CancelOutcome::AlreadyFinished(status)) => (
            StatusCode::OK,
            Json(CancelResponse {
                message: format!("Job {} already finished with status {}", job_id, status),
            }),
        )
            .into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Unknown job_id"),
    }
}

/// GET /status/:job_id
pub async fn job_status(State(state): State<AppState>, Path(job_id): Path<String>) -> Response {
    match state.registry().get_status(&job_id).await {
        Some(status) => (StatusCode::OK, Json(StatusResponse { job_id, status })).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Unknown job_id"),
    }
}

/// GET /status/session/:session_id
pub async fn session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let registry = state.registry();
    let Some(job_id) = registry.resolve_session(&session_id).await else {
        return error_response(StatusCode::NOT_FOUND, "Unknown session_id");
    };

    match registry.get_status(&job_id).await {
        Some(status) => (
            StatusCode::OK,
            Json(SessionStatusResponse {
                session_id,
                job_id,
                status,
            }),
        )
            .into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Unknown session_id"),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// GET /
/// Connectivity probe
pub async fn root() -> impl IntoResponse {
    (StatusCode::OK, "loqa-transcribe is running!")
}
