//! Platform notification API seam.
//!
//! The dispatcher only knows `NotificationSink`; the binary picks a
//! logging sink or an MQTT push-gateway sink from config.

use crate::models::NotificationRequest;
use async_trait::async_trait;
use rumqttc::{AsyncClient, QoS};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("MQTT publish failed: {0}")]
    Mqtt(#[from] rumqttc::ClientError),
    #[error("Platform rejected notification: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn submit(&self, request: &NotificationRequest) -> Result<(), SinkError>;
}

/// Writes requests to the log only.
#[derive(Debug, Default, Clone)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn submit(&self, request: &NotificationRequest) -> Result<(), SinkError> {
        info!(
            id = %request.id,
            channel = %request.channel,
            title = %request.title,
            "notification request"
        );
        Ok(())
    }
}

/// Publishes requests as JSON for the push gateway.
pub struct MqttSink {
    client: AsyncClient,
    topic: String,
}

impl MqttSink {
    pub fn new(client: AsyncClient, topic: impl Into<String>) -> Self {
        Self {
            client,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for MqttSink {
    async fn submit(&self, request: &NotificationRequest) -> Result<(), SinkError> {
        let payload = serde_json::to_vec(request)?;
        self.client
            .publish(self.topic.as_str(), QoS::AtLeastOnce, false, payload)
            .await?;
        Ok(())
    }
}
