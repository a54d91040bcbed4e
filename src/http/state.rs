use crate::jobs::{Dispatcher, JobRegistry, StreamSettings};
use crate::pipeline::PipelineContext;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: PipelineContext,
    pub dispatcher: Arc<Dispatcher>,
    pub stream: StreamSettings,
    /// Cancelled when the server starts shutting down; ends open status streams
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(pipeline: PipelineContext, dispatcher: Arc<Dispatcher>, stream: StreamSettings) -> Self {
        Self {
            pipeline,
            dispatcher,
            stream,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.pipeline.registry
    }
}
