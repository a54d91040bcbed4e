pub mod client;
pub mod messages;

pub use client::{NatsNotifier, NoopNotifier};
pub use messages::TranscriptReadyMessage;

use anyhow::Result;

/// Channel announcing finished transcripts to downstream consumers.
///
/// Delivery is fire-and-forget: callers log failures and never retry.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, message: &TranscriptReadyMessage) -> Result<()>;
}
