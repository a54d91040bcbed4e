use super::chunker::ChunkOutcome;
use super::PipelineContext;
use crate::error::PipelineError;
use crate::jobs::{Dispatcher, JobStatus, JobTicket};
use crate::nats::TranscriptReadyMessage;
use crate::storage::blob_path;
use anyhow::{anyhow, Result};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, warn};

/// Register a job for `recording` and queue its pipeline on `dispatcher`
pub async fn submit_job(
    ctx: &PipelineContext,
    dispatcher: &Dispatcher,
    recording: &str,
) -> Result<JobTicket> {
    let ticket = ctx.registry.create_job().await;
    info!(
        "Accepted job {} (session {}) for {}",
        ticket.job_id, ticket.session_id, recording
    );

    let task = run_job(ctx.clone(), ticket.clone(), recording.to_string()).boxed();
    if let Err(e) = dispatcher.submit(task).await {
        ctx.registry.set_status(&ticket.job_id, JobStatus::Error).await;
        return Err(e);
    }

    Ok(ticket)
}

/// Background pipeline for one job.
///
/// Every failure, panics included, ends as status `error`; nothing escapes.
pub async fn run_job(ctx: PipelineContext, ticket: JobTicket, recording: String) {
    let outcome = AssertUnwindSafe(execute(&ctx, &ticket, &recording))
        .catch_unwind()
        .await;

    let failure = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(e)) => e,
        Err(_) => anyhow!("pipeline panicked"),
    };

    match failure.downcast_ref::<PipelineError>() {
        Some(e @ PipelineError::RecordingNotFound { .. }) => {
            error!("Background job {} error: {}", ticket.job_id, e)
        }
        _ => error!("Background job {} failed: {:#}", ticket.job_id, failure),
    }

    ctx.registry.set_status(&ticket.job_id, JobStatus::Error).await;
}

async fn execute(ctx: &PipelineContext, ticket: &JobTicket, recording: &str) -> Result<()> {
    let job_id = ticket.job_id.as_str();
    info!(
        "Background started: job={}, session={}",
        job_id, ticket.session_id
    );

    let final_key = ctx.keys.final_key(recording);
    if ctx.store.exists(&final_key).await? {
        info!("Transcript {} already exists; skipping transcription", final_key);
        if ctx.registry.set_status(job_id, JobStatus::Done).await {
            notify(ctx, ticket, recording, &final_key).await;
        }
        return Ok(());
    }

    if !ctx.registry.set_status(job_id, JobStatus::Running).await {
        info!("Job {} is no longer pending; not starting", job_id);
        return Ok(());
    }

    let audio = ctx.store.download(&blob_path(recording)).await?;

    if ticket.cancel.is_cancelled() {
        info!("Job {} cancelled after download", job_id);
        return Ok(());
    }

    let outcome = ctx
        .chunk_processor()
        .process(&audio, &ticket.session_id, recording, &ticket.cancel)
        .await?;

    match outcome {
        ChunkOutcome::Cancelled => {
            info!("Job {} cancelled after transcription", job_id);
        }
        ChunkOutcome::Completed(report) => {
            if !report.failed.is_empty() {
                warn!(
                    "Job {} finished with {} of {} chunks missing: {:?}",
                    job_id,
                    report.failed.len(),
                    report.windows,
                    report.failed
                );
            }

            info!(
                "Job {} transcribed {} windows ({} chars, {} chunks merged)",
                job_id,
                report.windows,
                report.transcript.chars().count(),
                report.merge.chunks
            );

            let transcript = report.merge.blob.as_deref().unwrap_or(&final_key);
            if ctx.registry.set_status(job_id, JobStatus::Done).await {
                notify(ctx, ticket, recording, transcript).await;
            }
        }
    }

    Ok(())
}

async fn notify(ctx: &PipelineContext, ticket: &JobTicket, recording: &str, transcript: &str) {
    let message = TranscriptReadyMessage::new(
        &ticket.job_id,
        &ticket.session_id,
        recording,
        transcript,
        &ctx.store.public_url(transcript),
    );

    if let Err(e) = ctx.notifier.publish(&message).await {
        warn!(
            "Failed to publish notification for job {}: {:#}",
            ticket.job_id, e
        );
    }
}
