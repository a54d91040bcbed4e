//! Job lifecycle management
//!
//! This module provides:
//! - `JobStatus` and its state machine
//! - `JobRegistry`, the single source of truth for job and session state
//! - `Dispatcher`, the bounded worker pool that runs pipelines in the background
//! - `status_stream`, the line feed that reports a job's progress to its submitter

mod dispatcher;
mod registry;
mod status;
mod stream;

pub use dispatcher::{Dispatcher, PipelineTask};
pub use registry::{CancelOutcome, CancelPolicy, JobRegistry, JobTicket};
pub use status::JobStatus;
pub use stream::{status_stream, StreamSettings};
