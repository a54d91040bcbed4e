use super::status::JobStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Identifiers handed to the submitter and the pipeline for one job
#[derive(Debug, Clone)]
pub struct JobTicket {
    pub job_id: String,
    pub session_id: String,
    /// Cancelled when a cancel request is accepted for this job
    pub cancel: CancellationToken,
}

/// Result of a cancel request against a known job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Status moved to `cancelled`
    Cancelled,
    /// Job had already reached a terminal status, which is kept
    AlreadyFinished(JobStatus),
}

/// What a cancel request does to a job that already finished
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelPolicy {
    /// Leave `done`/`error`/`cancelled` as they are
    #[default]
    Keep,
    /// Overwrite any status with `cancelled`
    Overwrite,
}

struct JobEntry {
    status: watch::Sender<JobStatus>,
    cancel: CancellationToken,
}

/// In-memory registry of jobs (job_id → status) and sessions (session_id → job_id).
///
/// Entries live for the lifetime of the process.
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobEntry>>,
    sessions: RwLock<HashMap<String, String>>,
    cancel_policy: CancelPolicy,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::with_cancel_policy(CancelPolicy::default())
    }

    pub fn with_cancel_policy(cancel_policy: CancelPolicy) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            cancel_policy,
        }
    }

    /// Allocate a fresh job in `pending` together with its session alias
    pub async fn create_job(&self) -> JobTicket {
        let (job_id, cancel) = loop {
            let candidate = short_id(8);
            if let Some(cancel) = self.register_job(&candidate).await {
                break (candidate, cancel);
            }
        };

        let session_id = loop {
            let candidate = format!("session-{}", short_id(12));
            let sessions = self.sessions.read().await;
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        self.register_session(&session_id, &job_id).await;

        JobTicket {
            job_id,
            session_id,
            cancel,
        }
    }

    /// Register `job_id` as pending. Returns `None` if the id is taken.
    pub async fn register_job(&self, job_id: &str) -> Option<CancellationToken> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(job_id) {
            return None;
        }

        let (status, _) = watch::channel(JobStatus::Pending);
        let cancel = CancellationToken::new();
        jobs.insert(
            job_id.to_string(),
            JobEntry {
                status,
                cancel: cancel.clone(),
            },
        );
        info!("Job {} set to {}", job_id, JobStatus::Pending);

        Some(cancel)
    }

    /// Move a job to `status` if the state machine allows it.
    ///
    /// Returns `false` for unknown jobs and refused transitions; a job that was
    /// cancelled concurrently keeps its `cancelled` status.
    pub async fn set_status(&self, job_id: &str, status: JobStatus) -> bool {
        let jobs = self.jobs.read().await;
        let Some(entry) = jobs.get(job_id) else {
            return false;
        };

        let applied = entry.status.send_if_modified(|current| {
            if current.can_transition_to(status) {
                *current = status;
                true
            } else {
                false
            }
        });

        if applied {
            info!("Job {} set to {}", job_id, status);
        } else {
            debug!(
                "Job {} ignored transition to {} (currently {})",
                job_id,
                status,
                *entry.status.borrow()
            );
        }

        applied
    }

    pub async fn get_status(&self, job_id: &str) -> Option<JobStatus> {
        let jobs = self.jobs.read().await;
        let status = jobs.get(job_id).map(|entry| *entry.status.borrow());
        debug!("Status check for {} → {:?}", job_id, status);
        status
    }

    pub async fn register_session(&self, session_id: &str, job_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.to_string(), job_id.to_string());
    }

    pub async fn resolve_session(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// Cancel a job: set `cancelled` and trip its cancellation token.
    ///
    /// Finished jobs keep their status under `CancelPolicy::Keep` and are
    /// overwritten under `CancelPolicy::Overwrite`. Returns `None` for unknown jobs.
    pub async fn cancel(&self, job_id: &str) -> Option<CancelOutcome> {
        let jobs = self.jobs.read().await;
        let entry = jobs.get(job_id)?;
        let overwrite = self.cancel_policy == CancelPolicy::Overwrite;

        let mut previous = JobStatus::Pending;
        let mut cancelled = false;
        entry.status.send_if_modified(|current| {
            previous = *current;
            if current.is_terminal() && !overwrite {
                return false;
            }
            cancelled = true;
            let changed = *current != JobStatus::Cancelled;
            *current = JobStatus::Cancelled;
            changed
        });

        if cancelled {
            entry.cancel.cancel();
            if previous.is_terminal() {
                info!("Job {} set to {} (was {})", job_id, JobStatus::Cancelled, previous);
            } else {
                info!("Job {} set to {}", job_id, JobStatus::Cancelled);
            }
            Some(CancelOutcome::Cancelled)
        } else {
            info!("Cancel for job {} ignored: already {}", job_id, previous);
            Some(CancelOutcome::AlreadyFinished(previous))
        }
    }

    /// Watch a job's status; the receiver wakes on every transition
    pub async fn subscribe(&self, job_id: &str) -> Option<watch::Receiver<JobStatus>> {
        let jobs = self.jobs.read().await;
        jobs.get(job_id).map(|entry| entry.status.subscribe())
    }

    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn short_id(len: usize) -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(len);
    id
}
