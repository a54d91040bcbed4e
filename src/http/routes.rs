use super::handlers;
use super::state::AppState;
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::path::Path;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Create the HTTP router with all routes.
///
/// When `blob_root` is given, stored transcripts are served read-only under `/blobs`.
pub fn create_router(state: AppState, blob_root: Option<&Path>, cors_origins: &[String]) -> Router {
    let mut router = Router::new()
        // Health check
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        // Job control
        .route("/process-audio", post(handlers::process_audio))
        .route("/merge-transcript", post(handlers::merge_transcript))
        .route("/cancel/:job_id", post(handlers::cancel_job))
        // Job queries
        .route("/status/:job_id", get(handlers::job_status))
        .route("/status/session/:session_id", get(handlers::session_status));

    if let Some(root) = blob_root {
        router = router.nest_service("/blobs", ServeDir::new(root));
    }

    router
        // Add tracing and CORS middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors_origins)),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(allowed)
    }
}
