use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::{ChannelError, Notification, NotificationChannel};

/// POSTs each notification as JSON to a fixed URL.
///
/// The timeout bounds the whole send; the response body is ignored.
#[derive(Clone, Debug)]
pub struct WebhookChannel {
    client: Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ChannelError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn publish(&self, notification: &Notification) -> Result<(), ChannelError> {
        let response = self.client.post(&self.url).json(notification).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::Rejected(format!("{} answered {status}", self.url)));
        }

        tracing::info!(
            url = %self.url,
            user_id = notification.user_id,
            "notification published"
        );
        Ok(())
    }
}
