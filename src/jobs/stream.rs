use super::registry::{JobRegistry, JobTicket};
use super::status::JobStatus;
use futures::stream::{self, Stream};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Timing of a status stream
#[derive(Debug, Clone, Copy)]
pub struct StreamSettings {
    /// Longest wait between two status lines
    pub interval: Duration,
    /// Absolute cutoff measured from stream start
    pub timeout: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(20),
            timeout: Duration::from_secs(3600),
        }
    }
}

enum Phase {
    Start,
    Poll { first: bool },
    Final(Option<JobStatus>),
    Finished,
}

struct StreamState {
    job_id: String,
    session_id: String,
    rx: Option<watch::Receiver<JobStatus>>,
    settings: StreamSettings,
    shutdown: CancellationToken,
    deadline: Instant,
    phase: Phase,
}

/// Line feed describing a job's progress.
///
/// Emits `Started job: ..`, then a `Status: ..` line whenever the status changes
/// or `interval` passes without a change, and finally `Final: ..` once the job
/// is terminal, `timeout` has elapsed or `shutdown` is cancelled. Dropping the
/// stream stops it.
pub async fn status_stream(
    registry: Arc<JobRegistry>,
    ticket: &JobTicket,
    settings: StreamSettings,
    shutdown: CancellationToken,
) -> impl Stream<Item = String> + Send + 'static {
    let rx = registry.subscribe(&ticket.job_id).await;

    let state = StreamState {
        job_id: ticket.job_id.clone(),
        session_id: ticket.session_id.clone(),
        rx,
        settings,
        shutdown,
        deadline: Instant::now() + settings.timeout,
        phase: Phase::Start,
    };

    stream::unfold(state, |mut state| async move {
        match state.phase {
            Phase::Start => {
                let line = format!(
                    "Started job: {}, session: {}\n",
                    state.job_id, state.session_id
                );
                state.phase = Phase::Poll { first: true };
                Some((line, state))
            }
            Phase::Poll { first } => {
                let Some(rx) = state.rx.as_mut() else {
                    state.phase = Phase::Final(None);
                    return Some(("Status: unknown\n".to_string(), state));
                };

                if !first {
                    let now = Instant::now();
                    let wait = state
                        .settings
                        .interval
                        .min(state.deadline.saturating_duration_since(now));
                    // A transition, the heartbeat interval or shutdown wakes us
                    tokio::select! {
                        _ = tokio::time::timeout(wait, rx.changed()) => {}
                        _ = state.shutdown.cancelled() => {}
                    }
                }

                let status = *rx.borrow_and_update();
                let stop = status.is_terminal()
                    || Instant::now() >= state.deadline
                    || state.shutdown.is_cancelled();
                state.phase = if stop {
                    Phase::Final(Some(status))
                } else {
                    Phase::Poll { first: false }
                };
                Some((format!("Status: {}\n", status), state))
            }
            Phase::Final(status) => {
                let line = match status {
                    Some(status) => format!("Final: {}\n", status),
                    None => "Final: unknown\n".to_string(),
                };
                state.phase = Phase::Finished;
                Some((line, state))
            }
            Phase::Finished => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn fast() -> StreamSettings {
        StreamSettings {
            interval: Duration::from_millis(20),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_stream_ends_on_terminal_status() {
        let registry = Arc::new(JobRegistry::new());
        let ticket = registry.create_job().await;
        registry.set_status(&ticket.job_id, JobStatus::Done).await;

        let lines: Vec<String> = status_stream(registry, &ticket, fast(), CancellationToken::new()).await.collect().await;

        assert_eq!(
            lines,
            vec![
                format!("Started job: {}, session: {}\n", ticket.job_id, ticket.session_id),
                "Status: done\n".to_string(),
                "Final: done\n".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_wakes_on_change() {
        let registry = Arc::new(JobRegistry::new());
        let ticket = registry.create_job().await;
        let settings = StreamSettings {
            interval: Duration::from_secs(60),
            timeout: Duration::from_secs(120),
        };

        let mut stream = Box::pin(status_stream(Arc::clone(&registry), &ticket, settings, CancellationToken::new()).await);
        assert!(stream.next().await.unwrap().starts_with("Started job"));
        assert_eq!(stream.next().await.unwrap(), "Status: pending\n");

        registry.set_status(&ticket.job_id, JobStatus::Running).await;
        assert_eq!(stream.next().await.unwrap(), "Status: running\n");

        registry.cancel(&ticket.job_id).await;
        assert_eq!(stream.next().await.unwrap(), "Status: cancelled\n");
        assert_eq!(stream.next().await.unwrap(), "Final: cancelled\n");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_times_out() {
        let registry = Arc::new(JobRegistry::new());
        let ticket = registry.create_job().await;
        let settings = StreamSettings {
            interval: Duration::from_millis(10),
            timeout: Duration::from_millis(50),
        };

        let lines: Vec<String> = status_stream(registry, &ticket, settings, CancellationToken::new()).await.collect().await;

        assert!(lines.len() >= 3);
        assert_eq!(lines.last().unwrap(), "Final: pending\n");
        assert!(lines[1..lines.len() - 1]
            .iter()
            .all(|line| line == "Status: pending\n"));
    }

    #[tokio::test]
    async fn test_stream_ends_on_shutdown() {
        let registry = Arc::new(JobRegistry::new());
        let ticket = registry.create_job().await;
        registry.set_status(&ticket.job_id, JobStatus::Running).await;
        let settings = StreamSettings {
            interval: Duration::from_secs(60),
            timeout: Duration::from_secs(3600),
        };
        let shutdown = CancellationToken::new();

        let mut stream =
            Box::pin(status_stream(Arc::clone(&registry), &ticket, settings, shutdown.clone()).await);
        assert!(stream.next().await.unwrap().starts_with("Started job"));
        assert_eq!(stream.next().await.unwrap(), "Status: running\n");

        shutdown.cancel();
        let rest = tokio::time::timeout(Duration::from_secs(5), stream.collect::<Vec<_>>())
            .await
            .unwrap();
        assert_eq!(rest, vec!["Status: running\n".to_string(), "Final: running\n".to_string()]);
    }
}
