use super::messages::TranscriptReadyMessage;
use super::Notifier;
use anyhow::{Context, Result};
use async_nats::Client;
use tracing::{info, warn};

pub struct NatsNotifier {
    client: Client,
    subject: String,
}

impl NatsNotifier {
    /// Connect to NATS server
    pub async fn connect(url: &str, subject: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client, subject })
    }
}

#[async_trait::async_trait]
impl Notifier for NatsNotifier {
    async fn publish(&self, message: &TranscriptReadyMessage) -> Result<()> {
        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await
            .context("Failed to publish transcript notification")?;

        info!(
            "Published transcript {} to {} (job={})",
            message.transcript, self.subject, message.job_id
        );

        Ok(())
    }
}

/// Used when no NATS server is configured
pub struct NoopNotifier;

#[async_trait::async_trait]
impl Notifier for NoopNotifier {
    async fn publish(&self, message: &TranscriptReadyMessage) -> Result<()> {
        warn!(
            "NATS not configured; skipping notification for {}",
            message.transcript
        );
        Ok(())
    }
}
