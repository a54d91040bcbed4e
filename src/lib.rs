pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod jobs;
pub mod nats;
pub mod pipeline;
pub mod storage;
pub mod stt;

pub use audio::{plan_windows, AudioFile, ChunkWindow};
pub use config::Config;
pub use error::PipelineError;
pub use http::{create_router, AppState};
pub use jobs::{CancelOutcome, CancelPolicy, Dispatcher, JobRegistry, JobStatus, JobTicket, StreamSettings};
pub use nats::{NatsNotifier, NoopNotifier, Notifier, TranscriptReadyMessage};
pub use pipeline::{ChunkOrder, ChunkProcessor, Merger, PipelineContext};
pub use storage::{BlobStore, LocalBlobStore, MemoryBlobStore, TranscriptKeys};
pub use stt::SpeechRecognizer;
