//! Notification Channel: fire-and-forget delivery of [`Notification`]s.
//!
//! The engine makes exactly one `publish` call per notification and never
//! retries. Any error is reported by the engine as a non-fatal outcome.

use async_trait::async_trait;

use crate::{ChannelError, Notification};

mod queue;
mod webhook;

pub use queue::{DEFAULT_QUEUE, QueueChannel, QueuedNotification};
pub use webhook::WebhookChannel;

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn publish(&self, notification: &Notification) -> Result<(), ChannelError>;
}
